//! PlayerFlowUser: one full support conversation per iteration. Always opens
//! a fresh ticket and session instead of reusing the cache.

use goose::prelude::*;
use std::time::Duration;

use super::{authenticate_player, wait_ms, OrLog};
use crate::api::{AuthHeaders, BootstrapLabels, SupportApi, SupportClient};
use crate::config::config;
use crate::session::{load_state, open_ticket, store_state, ActorState, Lookups, TicketNote};
use crate::{random_player_id, random_text};

const LABELS: BootstrapLabels = BootstrapLabels {
    ticket: "player_create_ticket",
    session: "player_create_session",
};

/// Polls after sending before giving up on a reply.
const REPLY_POLLS: usize = 5;
const REPLY_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub fn scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(2_000, 5_000);
    Ok(scenario!("PlayerFlowUser")
        .set_weight(60)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(flow_on_start).set_on_start())
        .register_transaction(transaction!(full_flow)))
}

async fn flow_on_start(user: &mut GooseUser) -> TransactionResult {
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

async fn full_flow(user: &mut GooseUser) -> TransactionResult {
    let config = config();
    let mut state = load_state(user);
    if state.auth.is_none() {
        authenticate_player(user, config, &mut state).await;
    }
    let Some(auth) = state.auth.clone() else {
        store_state(user, state);
        return Ok(());
    };

    let session_id = {
        let mut client = SupportClient::new(user, config).with_labels(LABELS);
        let ticket = open_ticket(
            &mut state,
            &mut client,
            &Lookups::from(config),
            TicketNote::Random("desc"),
        )
        .await
        .or_log("player_create_ticket");
        match ticket {
            Some(ticket_id) => client
                .create_session(&auth, &ticket_id)
                .await
                .or_log("player_create_session"),
            None => None,
        }
    };
    store_state(user, state);
    let Some(session_id) = session_id else {
        return Ok(());
    };

    let mut client = SupportClient::new(user, config);
    client
        .send_message(&auth, &session_id, &random_text("ask"), "player_send_msg")
        .await
        .or_log("player_send_msg");

    await_reply(&mut client, &auth, &session_id).await;
    client
        .session_detail(&auth, &session_id, "player_session_detail")
        .await
        .or_log("player_session_detail");
    client.close_session_as_player(&auth, &session_id).await;
    Ok(())
}

/// Poll until the session holds more than the sent message, waiting before
/// each poll. Returns whether a reply showed up.
async fn await_reply(client: &mut SupportClient<'_>, auth: &AuthHeaders, session_id: &str) -> bool {
    for _ in 0..REPLY_POLLS {
        tokio::time::sleep(REPLY_POLL_INTERVAL).await;
        let messages = client
            .session_messages(auth, session_id, "player_poll_msgs")
            .await
            .or_log("player_poll_msgs")
            .unwrap_or_default();
        if messages.len() > 1 {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadConfig;
    use goose::config::GooseConfiguration;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn waits_before_the_first_poll() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/messages/session/s-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "m-1"}, {"id": "m-2"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let base_url = url::Url::parse(&server.uri()).unwrap();
        let mut user = GooseUser::single(base_url, &GooseConfiguration::default()).unwrap();
        let config = LoadConfig::default();
        let mut client = SupportClient::new(&mut user, &config);

        let started = Instant::now();
        assert!(await_reply(&mut client, &AuthHeaders::anonymous(), "s-1").await);
        assert!(started.elapsed() >= REPLY_POLL_INTERVAL);
    }
}
