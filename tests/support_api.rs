//! Drives a real goose user against a mocked support API.

use goose::config::GooseConfiguration;
use goose::prelude::*;
use serde_json::json;
use support_load::{
    ensure_session, ActorState, AuthHeaders, BootstrapLabels, Credential, LoadConfig, Lookups,
    SupportClient, SupportError, TicketNote,
};
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LABELS: BootstrapLabels = BootstrapLabels {
    ticket: "player_create_ticket",
    session: "player_create_session",
};

fn goose_user(server: &MockServer) -> GooseUser {
    let base_url = Url::parse(&server.uri()).unwrap();
    GooseUser::single(base_url, &GooseConfiguration::default()).unwrap()
}

fn player() -> ActorState {
    ActorState::new("player_4821").with_auth(AuthHeaders::anonymous())
}

async fn mount_listings(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/games/enabled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": "g-1", "name": "Arena"},
                {"id": "g-2", "name": "load test game"}
            ]
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/issue-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 7, "name": "Payments"}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_reads_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_partial_json(json!({"username": "admin", "password": "admin123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"accessToken": "tok-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = LoadConfig::default();
    let mut user = goose_user(&server);
    let auth = SupportClient::new(&mut user, &config)
        .login(&Credential::new("admin", "admin123"))
        .await;

    assert_eq!(auth, Ok(AuthHeaders::bearer("tok-1")));
}

#[tokio::test]
async fn login_without_token_is_resolution_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;

    let config = LoadConfig::default();
    let mut user = goose_user(&server);
    let auth = SupportClient::new(&mut user, &config)
        .login(&config.admin)
        .await;

    assert_eq!(auth, Err(SupportError::resolution("access token")));
}

#[tokio::test]
async fn bootstrap_creates_once_then_hits_cache() {
    let server = MockServer::start().await;
    mount_listings(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/tickets"))
        .and(body_partial_json(json!({
            "gameId": "g-2",
            "playerIdOrName": "player_4821",
            "issueTypeIds": ["7"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "t-1"}})))
        .expect(1)
        .mount(&server)
        .await;

    // Bare body without the envelope is accepted as well.
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .and(body_partial_json(json!({"ticketId": "t-1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "s-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = LoadConfig::default();
    let lookups = Lookups::from(&config);
    let mut user = goose_user(&server);
    let mut state = player();

    for _ in 0..3 {
        let mut client = SupportClient::new(&mut user, &config).with_labels(LABELS);
        let session = ensure_session(&mut state, &mut client, &lookups, TicketNote::Random("desc")).await;
        assert_eq!(session, Ok("s-1".to_string()));
    }
    assert_eq!(state.cached_ticket_id.as_deref(), Some("t-1"));
    assert_eq!(state.cached_game_id.as_deref(), Some("g-2"));
    assert_eq!(state.cached_issue_type_id.as_deref(), Some("7"));
}

#[tokio::test]
async fn throttled_session_is_soft_and_keeps_ticket() {
    let server = MockServer::start().await;
    mount_listings(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 42}})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&server)
        .await;

    let config = LoadConfig::default();
    let mut user = goose_user(&server);
    let mut state = player();
    let mut client = SupportClient::new(&mut user, &config).with_labels(LABELS);

    let result = ensure_session(
        &mut state,
        &mut client,
        &Lookups::from(&config),
        TicketNote::Fixed("stress"),
    )
    .await;

    let Err(error) = result else {
        panic!("expected a throttled session call");
    };
    assert!(error.is_soft());
    assert_eq!(
        error,
        SupportError::ResolutionFailure {
            what: "session".to_string(),
            status: Some(429),
        }
    );
    assert_eq!(state.cached_ticket_id.as_deref(), Some("42"));
    assert!(state.cached_session_id.is_none());
}

#[tokio::test]
async fn server_error_on_ticket_is_reported_and_not_cached() {
    let server = MockServer::start().await;
    mount_listings(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/tickets"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let config = LoadConfig::default();
    let mut user = goose_user(&server);
    let mut state = player();
    let mut client = SupportClient::new(&mut user, &config).with_labels(LABELS);

    let result = ensure_session(
        &mut state,
        &mut client,
        &Lookups::from(&config),
        TicketNote::Random("desc"),
    )
    .await;

    let Err(error) = result else {
        panic!("expected the ticket step to fail");
    };
    assert!(!error.is_soft());
    assert_eq!(error.status(), Some(500));
    assert_eq!(
        error,
        SupportError::ResolutionFailure {
            what: "ticket".to_string(),
            status: Some(500),
        }
    );
    assert!(state.cached_ticket_id.is_none());
}

#[tokio::test]
async fn bearer_token_is_sent_and_listing_unwrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tickets"))
        .and(header("authorization", "Bearer tok-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": "t-1"}, {"id": "t-2"}],
            "timestamp": "2026-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = LoadConfig::default();
    let mut user = goose_user(&server);
    let tickets = SupportClient::new(&mut user, &config)
        .list_tickets(&AuthHeaders::bearer("tok-9"), "admin_tickets")
        .await;

    assert_eq!(tickets.map(|t| t.len()), Ok(2));
}

#[tokio::test]
async fn session_scoped_send_uses_text_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/s-5/messages"))
        .and(body_partial_json(json!({"messageType": "TEXT"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = LoadConfig::default();
    let mut user = goose_user(&server);
    let reply = SupportClient::new(&mut user, &config)
        .send_session_message(&AuthHeaders::anonymous(), "s-5", "core-abc123", "pressure_send_message")
        .await;

    assert_eq!(reply.map(|r| r.status), Ok(204));
}

#[tokio::test]
async fn custom_base_path_is_honored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/desk/sessions/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "s-1"}})))
        .expect(1)
        .mount(&server)
        .await;

    let config = LoadConfig::from_lookup(|name| (name == "BASE_PATH").then(|| "desk/".to_string()));
    let mut user = goose_user(&server);
    let reply = SupportClient::new(&mut user, &config)
        .session_detail(&AuthHeaders::anonymous(), "s-1", "player_session_detail")
        .await;

    assert_eq!(reply.map(|r| r.data), Ok(Some(json!({"id": "s-1"}))));
}
