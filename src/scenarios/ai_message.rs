//! AIMessageUser: rapid senders into a shared or rarely created session, to
//! load the AI reply path.

use goose::prelude::*;
use rand::Rng;
use std::time::Duration;

use super::{authenticate_player, bootstrap, wait_ms, OrLog};
use crate::api::{BootstrapLabels, SupportClient};
use crate::config::config;
use crate::session::{load_state, store_state, ActorState, TicketNote};
use crate::{random_player_id, random_text};

const LABELS: BootstrapLabels = BootstrapLabels {
    ticket: "ai_setup_ticket",
    session: "ai_setup_session",
};

/// Upper bound of the random delay before setup, so actors hatched together
/// do not create their tickets in the same instant.
const SETUP_JITTER_MS: u64 = 1_500;

pub fn scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(500, 1_000);
    Ok(scenario!("AIMessageUser")
        .set_weight(15)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(ai_on_start).set_on_start())
        .register_transaction(transaction!(rapid_send)))
}

async fn ai_on_start(user: &mut GooseUser) -> TransactionResult {
    let config = config();
    let mut state = ActorState::new(random_player_id("stress"));

    if let Some(session_id) = &config.ai_session_id {
        state = state.with_session(session_id.clone());
    } else if rand::rng().random_bool(config.ai_setup_prob) {
        let jitter = rand::rng().random_range(0..=SETUP_JITTER_MS);
        tokio::time::sleep(Duration::from_millis(jitter)).await;
        authenticate_player(user, config, &mut state).await;
        bootstrap(user, &mut state, LABELS, TicketNote::Fixed("stress"))
            .await
            .or_log("ai setup");
    }

    store_state(user, state);
    Ok(())
}

/// Actors without a session stay idle.
async fn rapid_send(user: &mut GooseUser) -> TransactionResult {
    let state = load_state(user);
    let Some(session_id) = state.cached_session_id else {
        return Ok(());
    };
    let auth = state.auth.unwrap_or_default();
    SupportClient::new(user, config())
        .send_message(&auth, &session_id, &random_text("stress"), "ai_send_msg")
        .await
        .or_log("ai_send_msg");
    Ok(())
}
