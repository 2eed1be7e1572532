//! PlayerCoreUser: write-only player load for the pressure mix.

use goose::prelude::*;

use super::{authenticate_player, bootstrap, renew, wait_ms, OrLog};
use crate::api::{BootstrapLabels, SupportClient};
use crate::config::config;
use crate::session::{load_state, store_state, ActorState, TicketNote};
use crate::{random_player_id, random_text};

const LABELS: BootstrapLabels = BootstrapLabels {
    ticket: "player_core_create_ticket",
    session: "player_core_create_session",
};

pub fn scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(2_000, 5_000);
    Ok(scenario!("PlayerCoreUser")
        .set_weight(60)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(core_on_start).set_on_start())
        .register_transaction(transaction!(core_send_message).set_weight(3)?)
        .register_transaction(transaction!(core_create_session).set_weight(2)?))
}

async fn core_on_start(user: &mut GooseUser) -> TransactionResult {
    let config = config();
    let player_id = config
        .player_name
        .clone()
        .unwrap_or_else(|| random_player_id("player"));
    let mut state = ActorState::new(player_id);
    authenticate_player(user, config, &mut state).await;
    store_state(user, state);
    Ok(())
}

async fn core_send_message(user: &mut GooseUser) -> TransactionResult {
    let config = config();
    let mut state = load_state(user);
    if state.auth.is_none() {
        authenticate_player(user, config, &mut state).await;
    }
    let session = bootstrap(user, &mut state, LABELS, TicketNote::Random("desc"))
        .await
        .or_log("player_core session");
    let auth = state.auth.clone().unwrap_or_default();
    store_state(user, state);

    if let Some(session_id) = session {
        SupportClient::new(user, config)
            .send_message(&auth, &session_id, &random_text("ask"), "player_core_send_msg")
            .await
            .or_log("player_core_send_msg");
    }
    Ok(())
}

async fn core_create_session(user: &mut GooseUser) -> TransactionResult {
    let mut state = load_state(user);
    if state.auth.is_none() {
        authenticate_player(user, config(), &mut state).await;
    }
    renew(user, &mut state, LABELS, TicketNote::Random("desc"))
        .await
        .or_log("player_core session");
    store_state(user, state);
    Ok(())
}
