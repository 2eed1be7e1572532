//! Support Desk Pressure Test
//!
//! High-rate message sends and presence heartbeats on top of split
//! write-only and read-only player load.
//!
//! Usage:
//!   cargo run --release --bin load-pressure -- --host http://localhost:21101
//!
//! Output: JSON summary on stdout, section "Pressure" in RESULTS.md

use goose::prelude::*;
use support_load::runner::{preflight, run_attack};
use support_load::scenarios::{auth, player_core, player_query, presence, pressure_message};
use support_load::telemetry::init_tracing;
use support_load::config;

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    init_tracing();
    tracing::info!("=== Support Desk Pressure Test ===");
    preflight(config()).await;

    let scenarios = vec![
        pressure_message::scenario()?,
        presence::pressure_scenario()?,
        player_core::scenario()?,
        player_query::scenario()?,
        auth::scenario()?,
    ];
    run_attack("pressure", "Pressure", scenarios).await?;
    Ok(())
}
