//! Runs a short goose attack against a mocked API and checks what ends up in
//! the final metrics.

use goose::config::GooseConfiguration;
use goose::prelude::*;
use support_load::failure::{drop_soft_errors, error_status, OK_POST_CODES};
use support_load::tracker::HTTP_FAILURES;
use support_load::{AuthHeaders, LoadConfig, SupportClient, TestResult};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ITERATIONS: usize = 3;

async fn mixed_statuses(user: &mut GooseUser) -> TransactionResult {
    let config = LoadConfig::default();
    let auth = AuthHeaders::anonymous();
    let mut client = SupportClient::new(user, &config);
    for (endpoint, name) in [
        ("/tickets", "attack_throttled"),
        ("/sessions", "attack_expired"),
        ("/messages", "attack_broken"),
    ] {
        let _ = client
            .call(GooseMethod::Post, endpoint, name, &auth, None, OK_POST_CODES)
            .await;
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn soft_statuses_stay_out_of_the_error_table() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tickets"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db-pool-exhausted"))
        .mount(&server)
        .await;

    HTTP_FAILURES.clear();
    let mut metrics = GooseAttack::initialize_with_config(GooseConfiguration::default())
        .unwrap()
        .register_scenario(scenario!("MixedStatuses").register_transaction(transaction!(mixed_statuses)))
        .set_default(GooseDefault::Host, server.uri().as_str())
        .unwrap()
        .set_default(GooseDefault::Users, 1)
        .unwrap()
        .set_default(GooseDefault::HatchRate, "1")
        .unwrap()
        .set_default(GooseDefault::Iterations, ITERATIONS)
        .unwrap()
        .set_default(GooseDefault::NoTelnet, true)
        .unwrap()
        .set_default(GooseDefault::NoWebSocket, true)
        .unwrap()
        .set_default(GooseDefault::NoPrintMetrics, true)
        .unwrap()
        .execute()
        .await
        .unwrap();

    drop_soft_errors(&mut metrics);
    let statuses: Vec<Option<u16>> = metrics
        .errors
        .values()
        .map(|aggregate| error_status(&aggregate.error))
        .collect();
    assert!(!statuses.contains(&Some(429)));
    assert!(!statuses.contains(&Some(401)));
    assert!(statuses.contains(&Some(500)));

    let broken = metrics
        .errors
        .values()
        .find(|aggregate| aggregate.name == "attack_broken")
        .unwrap();
    assert_eq!(broken.occurrences, ITERATIONS);

    let result = TestResult::from_metrics("attack", &metrics, Vec::new())
        .with_failures(HTTP_FAILURES.summaries());
    assert_eq!(result.total, 3 * ITERATIONS);
    assert_eq!(result.errors, ITERATIONS);

    let failure = result
        .failures
        .iter()
        .find(|summary| summary.name == "attack_broken")
        .unwrap();
    assert_eq!(failure.failures, ITERATIONS);
    assert_eq!(failure.last_error.as_deref(), Some("500 db-pool-exhausted"));
    assert!(result.failures.iter().all(|summary| summary.name == "attack_broken"));
    assert!(result.markdown(1).contains("| attack_broken | 3 | 500 db-pool-exhausted |"));
}
