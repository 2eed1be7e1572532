//! Attack setup shared by the load binaries.

use goose::prelude::*;
use std::path::Path;
use std::time::Duration;

use crate::config::{
    config, env_duration, env_vus, LoadConfig, DEFAULT_HATCH_RATE, DEFAULT_TEST_DURATION_SECS,
    DEFAULT_VUS,
};
use crate::failure::drop_soft_errors;
use crate::results::{update_section_in_results, TestResult, RESULTS_FILE};
use crate::tracker::{HTTP_FAILURES, WS_EVENTS};

/// Try the login endpoint before the attack so a dead backend or bad admin
/// credential shows up in the log immediately. Never fatal.
pub async fn preflight(config: &LoadConfig) -> bool {
    let client = match reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "failed to build preflight client");
            return false;
        }
    };

    let url = format!(
        "{}{}",
        config.host.trim_end_matches('/'),
        config.path("/auth/login")
    );
    match client.post(&url).json(&config.admin).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::info!(%url, status = %response.status(), "backend reachable, admin login ok");
            true
        }
        Ok(response) => {
            tracing::warn!(%url, status = %response.status(), "backend reachable, admin login refused");
            false
        }
        Err(e) => {
            tracing::warn!(%url, error = %e, "backend unreachable");
            false
        }
    }
}

/// Run `scenarios` with the harness defaults, then report the outcome.
///
/// goose command-line flags override every default set here.
pub async fn run_attack(
    test: &str,
    section_title: &str,
    scenarios: Vec<Scenario>,
) -> Result<TestResult, GooseError> {
    let config = config();
    let vus = env_vus(DEFAULT_VUS);
    let duration = env_duration(DEFAULT_TEST_DURATION_SECS);
    WS_EVENTS.clear();
    HTTP_FAILURES.clear();

    let mut attack = GooseAttack::initialize()?;
    for scenario in scenarios {
        attack = attack.register_scenario(scenario);
    }

    tracing::info!(host = %config.host, users = vus, duration, "starting attack");
    let mut metrics = attack
        .set_default(GooseDefault::Host, config.host.as_str())?
        .set_default(GooseDefault::AcceptInvalidCerts, true)?
        .set_default(GooseDefault::Users, vus)?
        .set_default(GooseDefault::RunTime, duration as usize)?
        .set_default(GooseDefault::HatchRate, DEFAULT_HATCH_RATE)?
        .set_default(GooseDefault::NoPrintMetrics, true)?
        .execute()
        .await?;

    // goose's own report would list the throttled and expired requests.
    drop_soft_errors(&mut metrics);
    println!("{metrics}");

    let result = TestResult::from_metrics(test, &metrics, WS_EVENTS.summaries())
        .with_failures(HTTP_FAILURES.summaries());
    tracing::info!(
        total = result.total,
        errors = result.errors,
        throughput = result.throughput,
        "attack finished"
    );

    result.emit(config.result_file.as_deref());
    if let Err(e) = update_section_in_results(Path::new(RESULTS_FILE), section_title, &result.markdown(vus)) {
        tracing::warn!(error = %e, "could not update {RESULTS_FILE}");
    }

    Ok(result)
}
