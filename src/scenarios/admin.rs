//! AdminUser: an agent watching the dashboard and answering random sessions.

use goose::prelude::*;
use rand::seq::IndexedRandom;

use super::{wait_ms, OrLog};
use crate::api::SupportClient;
use crate::config::config;
use crate::envelope::extract_id;
use crate::error::{SupportError, SupportResult};
use crate::random_text;
use crate::session::{load_state, store_state, ActorState};

pub fn scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(3_000, 6_000);
    Ok(scenario!("AdminUser")
        .set_weight(5)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(admin_on_start).set_on_start())
        .register_transaction(transaction!(dashboard).set_weight(3)?)
        .register_transaction(transaction!(reply_any).set_weight(1)?))
}

async fn admin_login(user: &mut GooseUser, state: &mut ActorState) {
    let config = config();
    state.auth = SupportClient::new(user, config)
        .login(&config.admin)
        .await
        .or_log("admin login");
}

/// An expired token shows up as a (soft) 401; drop it so the next
/// dashboard refresh logs in again.
fn forget_expired<T>(state: &mut ActorState, result: &SupportResult<T>) {
    if result.as_ref().err().and_then(SupportError::status) == Some(401) {
        state.auth = None;
    }
}

async fn admin_on_start(user: &mut GooseUser) -> TransactionResult {
    let mut state = ActorState::new(config().admin.username.clone());
    admin_login(user, &mut state).await;
    store_state(user, state);
    Ok(())
}

async fn dashboard(user: &mut GooseUser) -> TransactionResult {
    let mut state = load_state(user);
    if state.auth.is_none() {
        admin_login(user, &mut state).await;
    }
    let Some(auth) = state.auth.clone() else {
        store_state(user, state);
        return Ok(());
    };

    let mut client = SupportClient::new(user, config());
    let tickets = client.list_tickets(&auth, "admin_tickets").await;
    forget_expired(&mut state, &tickets);
    tickets.or_log("admin_tickets");
    let sessions = client.list_sessions(&auth, "admin_sessions").await;
    forget_expired(&mut state, &sessions);
    sessions.or_log("admin_sessions");

    store_state(user, state);
    Ok(())
}

/// Join one random session, answer it and close it.
async fn reply_any(user: &mut GooseUser) -> TransactionResult {
    let mut state = load_state(user);
    let Some(auth) = state.auth.clone() else {
        return Ok(());
    };

    let mut client = SupportClient::new(user, config());
    let sessions = client.list_sessions(&auth, "admin_sessions_pick").await;
    forget_expired(&mut state, &sessions);
    let target = sessions
        .or_log("admin_sessions_pick")
        .and_then(|sessions| sessions.choose(&mut rand::rng()).and_then(extract_id));

    if let Some(session_id) = target {
        client.join_session(&auth, &session_id).await;
        client
            .send_agent_message(&auth, &session_id, &random_text("reply"))
            .await;
        client.close_session(&auth, &session_id).await;
    }

    store_state(user, state);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AuthHeaders;

    #[test]
    fn only_auth_expiry_drops_the_token() {
        let mut state = ActorState::new("admin").with_auth(AuthHeaders::bearer("tok"));

        forget_expired::<()>(&mut state, &Err(SupportError::transport(429, "")));
        assert!(state.auth.is_some());
        forget_expired::<()>(&mut state, &Ok(()));
        assert!(state.auth.is_some());
        forget_expired::<()>(&mut state, &Err(SupportError::transport(401, "")));
        assert!(state.auth.is_none());
    }
}
