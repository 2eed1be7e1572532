//! Deciding which responses count as failures in goose metrics.
//!
//! goose marks every non-2xx response as failed on its own. Expected
//! conditions under load (401 auth expiry, 429 throttling) are flipped back to
//! success, and 2xx responses outside an endpoint's accepted set are flipped
//! to failed. Every reported failure is also tallied on [`HTTP_FAILURES`] with
//! its response body, since goose's own error table carries only the status.

use goose::metrics::{GooseMetrics, GooseRequestMetric};
use goose::prelude::*;

use crate::tracker::HTTP_FAILURES;

/// Statuses accepted from create/update endpoints.
pub const OK_POST_CODES: &[u16] = &[200, 201, 204];

/// Statuses accepted from read endpoints.
pub const OK_GET_CODES: &[u16] = &[200];

/// Statuses never reported as failures.
pub const SOFT_STATUS_CODES: &[u16] = &[401, 429];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    /// Expected under load; not reported.
    Soft,
    /// Reported with the response body. Status 0 means no response.
    Failed,
}

pub fn is_soft_status(status: u16) -> bool {
    SOFT_STATUS_CODES.contains(&status)
}

pub fn classify(status: u16, accepted: &[u16]) -> Outcome {
    if accepted.contains(&status) {
        Outcome::Accepted
    } else if is_soft_status(status) {
        Outcome::Soft
    } else {
        Outcome::Failed
    }
}

/// Bring the goose metric for `request` in line with `outcome`.
pub fn settle(
    user: &GooseUser,
    name: &str,
    request: &mut GooseRequestMetric,
    outcome: Outcome,
    body: &str,
) {
    match outcome {
        Outcome::Accepted | Outcome::Soft => {
            if !request.success {
                // goose files any update that still carries an error.
                request.error.clear();
                if let Err(e) = user.set_success(request) {
                    tracing::debug!(request = name, error = %e, "could not clear failure");
                }
            }
        }
        Outcome::Failed => report_failure(user, name, request, body),
    }
}

/// Report a failed request with its body. goose hands the failure back as an
/// error; the transaction carries on regardless.
pub fn report_failure(user: &GooseUser, name: &str, request: &mut GooseRequestMetric, body: &str) {
    let detail = format!("{} {}", request.status_code, body.trim());
    tracing::debug!(request = name, status = request.status_code, "request failed");
    HTTP_FAILURES.failure(name, request.response_time as f64, &detail);
    // Only unexpected 2xx responses reach goose here; its own non-2xx entry
    // already names the status.
    let tag = format!("{name}: {detail}");
    let _reported = user.set_failure(&tag, request, None, Some(body));
}

/// Leading status code of a goose error entry such as
/// `429 Too Many Requests: ticket_call`.
pub fn error_status(error: &str) -> Option<u16> {
    error.split_whitespace().next()?.parse().ok()
}

/// Remove 401 and 429 entries that goose recorded before they were settled
/// as soft.
pub fn drop_soft_errors(metrics: &mut GooseMetrics) {
    metrics
        .errors
        .retain(|_, aggregate| !error_status(&aggregate.error).is_some_and(is_soft_status));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(200, OK_POST_CODES, Outcome::Accepted)]
    #[case(201, OK_POST_CODES, Outcome::Accepted)]
    #[case(204, OK_POST_CODES, Outcome::Accepted)]
    #[case(202, OK_POST_CODES, Outcome::Failed)]
    #[case(201, OK_GET_CODES, Outcome::Failed)]
    #[case(401, OK_POST_CODES, Outcome::Soft)]
    #[case(429, OK_GET_CODES, Outcome::Soft)]
    #[case(403, OK_GET_CODES, Outcome::Failed)]
    #[case(500, OK_POST_CODES, Outcome::Failed)]
    #[case(0, OK_POST_CODES, Outcome::Failed)]
    fn status_outcomes(#[case] status: u16, #[case] accepted: &[u16], #[case] expected: Outcome) {
        assert_eq!(classify(status, accepted), expected);
    }

    #[rstest]
    #[case("429 Too Many Requests: player_create_ticket", Some(429))]
    #[case("401 Unauthorized: admin_tickets", Some(401))]
    #[case("500 Internal Server Error: ai_send_msg", Some(500))]
    #[case("error sending request for url (http://localhost/)", None)]
    #[case("", None)]
    fn goose_error_statuses(#[case] error: &str, #[case] expected: Option<u16>) {
        assert_eq!(error_status(error), expected);
    }

    #[test]
    fn soft_statuses_never_fail_even_when_listed_nowhere() {
        for status in SOFT_STATUS_CODES {
            assert_eq!(classify(*status, &[]), Outcome::Soft);
        }
    }
}
