//! PlayerUser: the core player flow. Keeps one session per actor and sends
//! messages into it, with light read traffic on the side.

use goose::prelude::*;

use super::{authenticate_player, bootstrap, renew, wait_ms, OrLog};
use crate::api::{BootstrapLabels, SupportClient};
use crate::config::config;
use crate::session::{load_state, store_state, ActorState, TicketNote};
use crate::{random_player_id, random_text};

const LABELS: BootstrapLabels = BootstrapLabels {
    ticket: "player_create_ticket",
    session: "player_create_session",
};

pub fn scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(2_000, 5_000);
    Ok(scenario!("PlayerUser")
        .set_weight(60)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(player_on_start).set_on_start())
        .register_transaction(transaction!(send_message).set_weight(3)?)
        .register_transaction(transaction!(create_session).set_weight(2)?)
        .register_transaction(transaction!(list_messages).set_weight(1)?)
        .register_transaction(transaction!(session_detail).set_weight(1)?))
}

async fn player_on_start(user: &mut GooseUser) -> TransactionResult {
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

/// Send into the cached session, creating it first if needed, then poll once
/// so read load is covered too.
async fn send_message(user: &mut GooseUser) -> TransactionResult {
    let config = config();
    let mut state = load_state(user);
    if state.auth.is_none() {
        authenticate_player(user, config, &mut state).await;
    }
    let session = bootstrap(user, &mut state, LABELS, TicketNote::Random("desc"))
        .await
        .or_log("player session");
    let auth = state.auth.clone().unwrap_or_default();
    store_state(user, state);

    let Some(session_id) = session else {
        return Ok(());
    };
    let mut client = SupportClient::new(user, config);
    client
        .send_message(&auth, &session_id, &random_text("ask"), "player_send_msg")
        .await
        .or_log("player_send_msg");
    client
        .session_messages(&auth, &session_id, "player_poll_msgs")
        .await
        .or_log("player_poll_msgs");
    Ok(())
}

/// Open a new session on every run, reusing the cached ticket.
async fn create_session(user: &mut GooseUser) -> TransactionResult {
    let mut state = load_state(user);
    if state.auth.is_none() {
        authenticate_player(user, config(), &mut state).await;
    }
    renew(user, &mut state, LABELS, TicketNote::Random("desc"))
        .await
        .or_log("player session");
    store_state(user, state);
    Ok(())
}

async fn list_messages(user: &mut GooseUser) -> TransactionResult {
    let state = load_state(user);
    let (Some(session_id), Some(auth)) = (state.cached_session_id, state.auth) else {
        return Ok(());
    };
    SupportClient::new(user, config())
        .session_messages(&auth, &session_id, "player_list_messages")
        .await
        .or_log("player_list_messages");
    Ok(())
}

async fn session_detail(user: &mut GooseUser) -> TransactionResult {
    let state = load_state(user);
    let (Some(session_id), Some(auth)) = (state.cached_session_id, state.auth) else {
        return Ok(());
    };
    SupportClient::new(user, config())
        .session_detail(&auth, &session_id, "player_session_detail")
        .await
        .or_log("player_session_detail");
    Ok(())
}
