//! PressureMessageUser: high-rate sends through the session-scoped message
//! endpoint.

use goose::prelude::*;
use rand::Rng;

use super::{authenticate_player, bootstrap, wait_ms, OrLog};
use crate::api::{BootstrapLabels, SupportClient};
use crate::config::config;
use crate::session::{load_state, store_state, ActorState, TicketNote};
use crate::{random_player_id, random_text};

const LABELS: BootstrapLabels = BootstrapLabels {
    ticket: "pressure_setup_ticket",
    session: "pressure_setup_session",
};

pub fn scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(300, 800);
    Ok(scenario!("PressureMessageUser")
        .set_weight(10)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(pressure_on_start).set_on_start())
        .register_transaction(transaction!(send_core_message)))
}

async fn pressure_on_start(user: &mut GooseUser) -> TransactionResult {
    let config = config();
    let mut state = ActorState::new(random_player_id("p"));

    if let Some(session_id) = &config.ai_session_id {
        state = state.with_session(session_id.clone());
    } else if rand::rng().random_bool(config.pressure_setup_prob) {
        authenticate_player(user, config, &mut state).await;
        bootstrap(user, &mut state, LABELS, TicketNote::Fixed("pressure"))
            .await
            .or_log("pressure setup");
    }

    store_state(user, state);
    Ok(())
}

async fn send_core_message(user: &mut GooseUser) -> TransactionResult {
    let state = load_state(user);
    let Some(session_id) = state.cached_session_id else {
        return Ok(());
    };
    let auth = state.auth.unwrap_or_default();
    SupportClient::new(user, config())
        .send_session_message(&auth, &session_id, &random_text("core"), "pressure_send_message")
        .await
        .or_log("pressure_send_message");
    Ok(())
}
