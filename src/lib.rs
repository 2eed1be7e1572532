//! Goose load tests for the support desk API.
//!
//! Simulates players, admins, AI-stress senders and socket.io presence clients
//! against the ticket / chat-session / message endpoints and reports
//! throughput and error rates.
//!
//! ## Layout
//! - [`config`]: environment configuration
//! - [`api`]: support API calls through a goose user
//! - [`session`]: per-actor session bootstrap with cached ids
//! - [`failure`]: which statuses count as failures
//! - [`socketio`]: socket.io client for presence scenarios
//! - [`scenarios`]: one goose scenario per actor type
//! - [`runner`], [`results`]: attack setup and result files

pub mod api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod failure;
pub mod results;
pub mod runner;
pub mod scenarios;
pub mod select;
pub mod session;
pub mod socketio;
pub mod telemetry;
pub mod tracker;

pub use api::{AuthHeaders, BootstrapLabels, SupportApi, SupportClient, TicketDraft};
pub use config::{config, env_duration, env_vus, Credential, LoadConfig};
pub use envelope::{extract_data, extract_id, NamedEntity};
pub use error::{SupportError, SupportResult};
pub use results::TestResult;
pub use select::pick_preferred;
pub use session::{ensure_session, renew_session, ActorState, Lookups, TicketNote};

use rand::distr::{Alphanumeric, SampleString};
use rand::Rng;

/// `prefix-` followed by six random letters and digits, e.g. `ask-x7Yq2a`.
pub fn random_text(prefix: &str) -> String {
    let tag = Alphanumeric.sample_string(&mut rand::rng(), 6);
    format!("{prefix}-{tag}")
}

/// `prefix_` followed by a four digit number, e.g. `player_4821`.
pub fn random_player_id(prefix: &str) -> String {
    let n: u16 = rand::rng().random_range(1000..=9999);
    format!("{prefix}_{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_text_shape() {
        let text = random_text("ask");
        let (prefix, tag) = text.split_once('-').unwrap();
        assert_eq!(prefix, "ask");
        assert_eq!(tag.len(), 6);
        assert!(tag.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn player_id_shape() {
        let id = random_player_id("stress");
        let n: u16 = id.strip_prefix("stress_").unwrap().parse().unwrap();
        assert!((1000..=9999).contains(&n));
    }
}
