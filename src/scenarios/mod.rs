//! One goose scenario per simulated actor type.
//!
//! Several scenarios are near-duplicates with different weights, request
//! names or endpoints. Each stands on its own and can be picked with goose's
//! `--scenarios` flag.

pub mod admin;
pub mod ai_message;
pub mod auth;
pub mod player;
pub mod player_core;
pub mod player_flow;
pub mod player_query;
pub mod presence;
pub mod pressure_message;

use goose::prelude::*;
use std::time::Duration;

use crate::api::{AuthHeaders, BootstrapLabels, SupportClient};
use crate::config::{config, LoadConfig};
use crate::error::SupportResult;
use crate::session::{ensure_session, renew_session, ActorState, Lookups, TicketNote};

/// Uniform wait between transactions, in milliseconds.
pub(crate) fn wait_ms(min: u64, max: u64) -> (Duration, Duration) {
    (Duration::from_millis(min), Duration::from_millis(max))
}

/// Log a failed step and keep going; goose already has the metric. Soft
/// statuses are routine under load and only show at trace level.
pub(crate) trait OrLog<T> {
    fn or_log(self, step: &str) -> Option<T>;
}

impl<T> OrLog<T> for SupportResult<T> {
    fn or_log(self, step: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) if e.is_soft() => {
                tracing::trace!(step, error = %e, "step throttled or unauthorized");
                None
            }
            Err(e) => {
                tracing::debug!(step, error = %e, "step skipped");
                None
            }
        }
    }
}

/// Players log in when a player credential is configured and are anonymous
/// otherwise. A failed login leaves `state.auth` empty for the next try.
pub(crate) async fn authenticate_player(
    user: &mut GooseUser,
    config: &LoadConfig,
    state: &mut ActorState,
) {
    state.auth = match &config.player {
        None => Some(AuthHeaders::anonymous()),
        Some(credential) => SupportClient::new(user, config)
            .login(credential)
            .await
            .or_log("player login"),
    };
}

/// [`ensure_session`] against the live API with the global configuration.
pub(crate) async fn bootstrap(
    user: &mut GooseUser,
    state: &mut ActorState,
    labels: BootstrapLabels,
    note: TicketNote,
) -> SupportResult<String> {
    let config = config();
    let mut client = SupportClient::new(user, config).with_labels(labels);
    ensure_session(state, &mut client, &Lookups::from(config), note).await
}

/// [`renew_session`] against the live API: a new session on every call.
pub(crate) async fn renew(
    user: &mut GooseUser,
    state: &mut ActorState,
    labels: BootstrapLabels,
    note: TicketNote,
) -> SupportResult<String> {
    let config = config();
    let mut client = SupportClient::new(user, config).with_labels(labels);
    renew_session(state, &mut client, &Lookups::from(config), note).await
}
