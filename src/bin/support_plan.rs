//! Support Desk Plan Load Test
//!
//! Full-conversation players and connection churn, for capacity planning.
//!
//! Usage:
//!   cargo run --release --bin load-support-plan -- --host http://localhost:21101
//!
//! Output: JSON summary on stdout, section "Support Plan" in RESULTS.md

use goose::prelude::*;
use support_load::runner::{preflight, run_attack};
use support_load::scenarios::{admin, ai_message, auth, player_flow, presence};
use support_load::telemetry::init_tracing;
use support_load::config;

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    init_tracing();
    tracing::info!("=== Support Desk Plan Load Test ===");
    preflight(config()).await;

    let scenarios = vec![
        auth::scenario()?,
        player_flow::scenario()?,
        ai_message::scenario()?,
        presence::churn_scenario()?,
        admin::scenario()?,
    ];
    run_attack("support_plan", "Support Plan", scenarios).await?;
    Ok(())
}
