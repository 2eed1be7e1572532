//! socket.io presence scenarios. goose only measures HTTP, so connection
//! events are counted on [`WS_EVENTS`](crate::tracker::WS_EVENTS) instead.

use goose::prelude::*;
use rand::Rng;
use reqwest::Url;
use std::time::Duration;

use super::wait_ms;
use crate::config::{config, DEFAULT_WS_HOST};
use crate::socketio::{SocketIoClient, WsError};
use crate::tracker::EventTimer;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a churn connection is held open, in seconds.
const HOLD_SECS: (u64, u64) = (10, 20);

/// Goose session data for presence users.
#[derive(Clone, Default)]
struct Presence {
    client: Option<SocketIoClient>,
}

pub fn scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(10_000, 30_000);
    Ok(scenario!("WsUser")
        .set_weight(15)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(ws_connect).set_on_start())
        .register_transaction(transaction!(ws_heartbeat))
        .register_transaction(transaction!(ws_disconnect).set_on_stop()))
}

pub fn churn_scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(10_000, 30_000);
    Ok(scenario!("WsChurnUser")
        .set_weight(15)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(ws_keepalive)))
}

/// Like `WsUser` with a much shorter wait; nothing is recorded.
pub fn pressure_scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(500, 1_500);
    Ok(scenario!("PressureWsUser")
        .set_weight(10)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(quiet_connect).set_on_start())
        .register_transaction(transaction!(quiet_heartbeat))
        .register_transaction(transaction!(ws_disconnect).set_on_stop()))
}

/// `WS_HOST`, else the goose host, else the local default.
pub fn ws_host(user: &GooseUser) -> String {
    ws_host_for(config().ws_host.as_deref(), &user.base_url)
}

fn ws_host_for(configured: Option<&str>, base_url: &Url) -> String {
    match configured {
        Some(host) => host.to_string(),
        None if base_url.has_host() => base_url.as_str().to_string(),
        None => DEFAULT_WS_HOST.to_string(),
    }
}

fn session_client(user: &GooseUser) -> Option<SocketIoClient> {
    user.get_session_data::<Presence>()
        .and_then(|presence| presence.client.clone())
}

/// Connect and record `ws_connect`, `ws_connect_error` (rejected by the
/// server) or `ws_connect_fail` (anything else).
async fn tracked_connect(host: &str) -> Option<SocketIoClient> {
    let timer = EventTimer::start("ws_connect");
    match SocketIoClient::connect(host, CONNECT_TIMEOUT).await {
        Ok(client) => {
            timer.succeed();
            Some(client)
        }
        Err(WsError::Rejected(detail)) => {
            timer.fail_as("ws_connect_error", &detail);
            None
        }
        Err(e) => {
            timer.fail_as("ws_connect_fail", &e.to_string());
            None
        }
    }
}

async fn ws_connect(user: &mut GooseUser) -> TransactionResult {
    let host = ws_host(user);
    let client = tracked_connect(&host).await;
    user.set_session_data(Presence { client });
    Ok(())
}

async fn ws_heartbeat(user: &mut GooseUser) -> TransactionResult {
    let timer = EventTimer::start("ws_heartbeat");
    let result = match session_client(user) {
        Some(client) => client.emit("ping").await,
        None => Err(WsError::Closed),
    };
    match result {
        Ok(()) => timer.succeed(),
        Err(e) => timer.fail_as("ws_heartbeat_fail", &e.to_string()),
    }
    Ok(())
}

async fn ws_disconnect(user: &mut GooseUser) -> TransactionResult {
    if let Some(client) = session_client(user) {
        client.disconnect().await;
    }
    user.set_session_data(Presence::default());
    Ok(())
}

/// Connect, ping, hold the connection, leave.
async fn ws_keepalive(user: &mut GooseUser) -> TransactionResult {
    let host = ws_host(user);
    let Some(client) = tracked_connect(&host).await else {
        return Ok(());
    };

    let timer = EventTimer::start("ws_ping");
    match client.emit("ping").await {
        Ok(()) => {
            timer.succeed();
            let hold = rand::rng().random_range(HOLD_SECS.0..=HOLD_SECS.1);
            tokio::time::sleep(Duration::from_secs(hold)).await;
        }
        Err(e) => timer.fail_as("ws_fail", &e.to_string()),
    }
    client.disconnect().await;
    Ok(())
}

async fn quiet_connect(user: &mut GooseUser) -> TransactionResult {
    let host = ws_host(user);
    let client = match SocketIoClient::connect(&host, CONNECT_TIMEOUT).await {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::debug!(%host, error = %e, "pressure ws connect failed");
            None
        }
    };
    user.set_session_data(Presence { client });
    Ok(())
}

async fn quiet_heartbeat(user: &mut GooseUser) -> TransactionResult {
    if let Some(client) = session_client(user) {
        if let Err(e) = client.emit("ping").await {
            tracing::debug!(error = %e, "pressure ws heartbeat failed");
        }
    }
    Ok(())
}
