//! PlayerQueryUser: read-only player load. The session is created once in
//! `on_start`; the tasks only poll it.

use goose::prelude::*;

use super::{authenticate_player, bootstrap, wait_ms, OrLog};
use crate::api::{BootstrapLabels, SupportClient};
use crate::config::config;
use crate::random_player_id;
use crate::session::{load_state, store_state, ActorState, TicketNote};

const LABELS: BootstrapLabels = BootstrapLabels {
    ticket: "player_query_setup_ticket",
    session: "player_query_setup_session",
};

pub fn scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(2_000, 5_000);
    Ok(scenario!("PlayerQueryUser")
        .set_weight(10)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(query_on_start).set_on_start())
        .register_transaction(transaction!(query_poll_messages).set_weight(2)?)
        .register_transaction(transaction!(query_session_detail).set_weight(1)?))
}

async fn query_on_start(user: &mut GooseUser) -> TransactionResult {
    let config = config();
    let player_id = config
        .player_name
        .clone()
        .unwrap_or_else(|| random_player_id("player"));
    let mut state = ActorState::new(player_id);
    authenticate_player(user, config, &mut state).await;
    bootstrap(user, &mut state, LABELS, TicketNote::Random("q"))
        .await
        .or_log("player_query setup");
    store_state(user, state);
    Ok(())
}

async fn query_poll_messages(user: &mut GooseUser) -> TransactionResult {
    let state = load_state(user);
    let (Some(session_id), Some(auth)) = (state.cached_session_id, state.auth) else {
        return Ok(());
    };
    SupportClient::new(user, config())
        .session_messages(&auth, &session_id, "player_query_poll_msgs")
        .await
        .or_log("player_query_poll_msgs");
    Ok(())
}

async fn query_session_detail(user: &mut GooseUser) -> TransactionResult {
    let state = load_state(user);
    let (Some(session_id), Some(auth)) = (state.cached_session_id, state.auth) else {
        return Ok(());
    };
    SupportClient::new(user, config())
        .session_detail(&auth, &session_id, "player_query_session_detail")
        .await
        .or_log("player_query_session_detail");
    Ok(())
}
