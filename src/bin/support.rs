//! Support Desk Load Test
//!
//! The main mix: players, AI-stress senders, socket.io presence clients,
//! admins and login churn.
//!
//! Usage:
//!   cargo run --release --bin load-support -- --host http://localhost:21101
//!
//! Output: JSON summary on stdout, section "Support Mix" in RESULTS.md

use goose::prelude::*;
use support_load::runner::{preflight, run_attack};
use support_load::scenarios::{admin, ai_message, auth, player, presence};
use support_load::telemetry::init_tracing;
use support_load::config;

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    init_tracing();
    tracing::info!("=== Support Desk Load Test ===");
    preflight(config()).await;

    let scenarios = vec![
        player::scenario()?,
        ai_message::scenario()?,
        presence::scenario()?,
        admin::scenario()?,
        auth::scenario()?,
    ];
    run_attack("support", "Support Mix", scenarios).await?;
    Ok(())
}
