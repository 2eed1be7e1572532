//! Support API calls issued through a goose user.
//!
//! Every call is recorded in goose metrics under a request name such as
//! `player_create_ticket`, with failures settled by [`crate::failure`].

use async_trait::async_trait;
use goose::goose::GooseResponse;
use goose::prelude::*;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{Credential, LoadConfig};
use crate::envelope::{extract_data_from_text, extract_id, named_entities, string_field, NamedEntity};
use crate::error::{SupportError, SupportResult};
use crate::failure::{classify, settle, Outcome, OK_GET_CODES, OK_POST_CODES};

/// Login answers 200 with the token; 201/204 would carry no usable body.
const LOGIN_OK_CODES: &[u16] = &[200];

/// Headers attached to every call an actor makes.
///
/// Anonymous players carry an empty set; it still counts as authenticated for
/// the bootstrap precondition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders {
    bearer: Option<String>,
}

impl AuthHeaders {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Body of `POST /tickets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    pub game_id: String,
    pub player_id_or_name: String,
    pub description: String,
    pub issue_type_ids: Vec<String>,
}

/// Request names for the ticket and session calls of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapLabels {
    pub ticket: &'static str,
    pub session: &'static str,
}

impl Default for BootstrapLabels {
    fn default() -> Self {
        Self {
            ticket: "create_ticket",
            session: "create_session",
        }
    }
}

/// An accepted response with its envelope already unwrapped.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub data: Option<Value>,
}

impl Reply {
    fn id(&self) -> Option<String> {
        self.data.as_ref().and_then(extract_id)
    }

    fn list(self) -> Vec<Value> {
        match self.data {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }
}

/// The calls the session bootstrap needs.
#[async_trait]
pub trait SupportApi: Send {
    async fn list_games(&mut self, auth: &AuthHeaders) -> SupportResult<Vec<NamedEntity>>;

    async fn list_issue_types(&mut self, auth: &AuthHeaders) -> SupportResult<Vec<NamedEntity>>;

    /// Returns the new ticket id.
    async fn create_ticket(&mut self, auth: &AuthHeaders, draft: &TicketDraft)
        -> SupportResult<String>;

    /// Returns the new session id.
    async fn create_session(&mut self, auth: &AuthHeaders, ticket_id: &str)
        -> SupportResult<String>;
}

/// Support API bound to one goose user for the duration of a transaction.
pub struct SupportClient<'a> {
    user: &'a mut GooseUser,
    config: &'a LoadConfig,
    labels: BootstrapLabels,
}

impl<'a> SupportClient<'a> {
    pub fn new(user: &'a mut GooseUser, config: &'a LoadConfig) -> Self {
        Self {
            user,
            config,
            labels: BootstrapLabels::default(),
        }
    }

    /// Name the ticket and session calls after the calling scenario.
    pub fn with_labels(mut self, labels: BootstrapLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Issue one request and settle its metric.
    ///
    /// Statuses in `accepted` come back as a [`Reply`]; anything else is a
    /// [`SupportError::TransportFailure`], already reported to goose unless it
    /// is 401 or 429.
    pub async fn call(
        &mut self,
        method: GooseMethod,
        endpoint: &str,
        name: &str,
        auth: &AuthHeaders,
        body: Option<&Value>,
        accepted: &[u16],
    ) -> SupportResult<Reply> {
        let path = self.config.path(endpoint);
        let mut builder = self
            .user
            .get_request_builder(&method, &path)
            .map_err(|e| SupportError::transport(0, e.to_string()))?;
        builder = auth.apply(builder);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let goose_request = GooseRequest::builder()
            .set_request_builder(builder)
            .name(name)
            .build();

        let GooseResponse {
            mut request,
            response,
        } = self
            .user
            .request(goose_request)
            .await
            .map_err(|e| SupportError::transport(0, e.to_string()))?;

        let text = match response {
            Ok(response) => response.text().await.unwrap_or_default(),
            Err(e) => e.to_string(),
        };

        let status = request.status_code;
        let outcome = classify(status, accepted);
        settle(&*self.user, name, &mut request, outcome, &text);

        match outcome {
            Outcome::Accepted => Ok(Reply {
                status,
                data: extract_data_from_text(&text),
            }),
            Outcome::Soft | Outcome::Failed => Err(SupportError::transport(status, text)),
        }
    }

    /// Same as [`call`](Self::call) for fire-and-forget steps: the failure is
    /// already in goose metrics, so it is only logged here.
    pub async fn fire(
        &mut self,
        method: GooseMethod,
        endpoint: &str,
        name: &str,
        auth: &AuthHeaders,
        body: Option<&Value>,
        accepted: &[u16],
    ) {
        if let Err(e) = self.call(method, endpoint, name, auth, body, accepted).await {
            tracing::debug!(request = name, error = %e, "call failed");
        }
    }

    // ------------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------------

    /// `POST /auth/login`; only 200 counts.
    pub async fn login(&mut self, credential: &Credential) -> SupportResult<AuthHeaders> {
        let body = serde_json::to_value(credential)
            .map_err(|e| SupportError::resolution(format!("login body: {e}")))?;
        let reply = self
            .call(
                GooseMethod::Post,
                "/auth/login",
                "auth_login",
                &AuthHeaders::anonymous(),
                Some(&body),
                LOGIN_OK_CODES,
            )
            .await?;
        reply
            .data
            .as_ref()
            .and_then(|data| string_field(data, "accessToken"))
            .map(AuthHeaders::bearer)
            .ok_or_else(|| SupportError::resolution("access token"))
    }

    pub async fn logout(&mut self, auth: &AuthHeaders) {
        self.fire(
            GooseMethod::Post,
            "/auth/logout",
            "auth_logout",
            auth,
            None,
            OK_POST_CODES,
        )
        .await;
    }

    // ------------------------------------------------------------------------
    // Player side
    // ------------------------------------------------------------------------

    pub async fn send_message(
        &mut self,
        auth: &AuthHeaders,
        session_id: &str,
        content: &str,
        name: &str,
    ) -> SupportResult<Reply> {
        let body = json!({ "sessionId": session_id, "content": content });
        self.call(GooseMethod::Post, "/messages", name, auth, Some(&body), OK_POST_CODES)
            .await
    }

    /// `POST /sessions/{id}/messages`, the session-scoped send path.
    pub async fn send_session_message(
        &mut self,
        auth: &AuthHeaders,
        session_id: &str,
        content: &str,
        name: &str,
    ) -> SupportResult<Reply> {
        let body = json!({ "content": content, "messageType": "TEXT" });
        let endpoint = format!("/sessions/{session_id}/messages");
        self.call(GooseMethod::Post, &endpoint, name, auth, Some(&body), OK_POST_CODES)
            .await
    }

    pub async fn session_messages(
        &mut self,
        auth: &AuthHeaders,
        session_id: &str,
        name: &str,
    ) -> SupportResult<Vec<Value>> {
        let endpoint = format!("/messages/session/{session_id}");
        let reply = self
            .call(GooseMethod::Get, &endpoint, name, auth, None, OK_GET_CODES)
            .await?;
        Ok(reply.list())
    }

    pub async fn session_detail(
        &mut self,
        auth: &AuthHeaders,
        session_id: &str,
        name: &str,
    ) -> SupportResult<Reply> {
        let endpoint = format!("/sessions/{session_id}");
        self.call(GooseMethod::Get, &endpoint, name, auth, None, OK_GET_CODES)
            .await
    }

    pub async fn close_session_as_player(&mut self, auth: &AuthHeaders, session_id: &str) {
        let endpoint = format!("/sessions/{session_id}/close-player");
        self.fire(
            GooseMethod::Patch,
            &endpoint,
            "player_close_session",
            auth,
            None,
            OK_POST_CODES,
        )
        .await;
    }

    // ------------------------------------------------------------------------
    // Admin side
    // ------------------------------------------------------------------------

    pub async fn list_tickets(&mut self, auth: &AuthHeaders, name: &str) -> SupportResult<Vec<Value>> {
        let reply = self
            .call(GooseMethod::Get, "/tickets", name, auth, None, OK_GET_CODES)
            .await?;
        Ok(reply.list())
    }

    pub async fn list_sessions(&mut self, auth: &AuthHeaders, name: &str) -> SupportResult<Vec<Value>> {
        let reply = self
            .call(GooseMethod::Get, "/sessions", name, auth, None, OK_GET_CODES)
            .await?;
        Ok(reply.list())
    }

    pub async fn join_session(&mut self, auth: &AuthHeaders, session_id: &str) {
        let endpoint = format!("/sessions/{session_id}/join");
        self.fire(
            GooseMethod::Post,
            &endpoint,
            "admin_join_session",
            auth,
            None,
            OK_POST_CODES,
        )
        .await;
    }

    pub async fn send_agent_message(&mut self, auth: &AuthHeaders, session_id: &str, content: &str) {
        let body = json!({ "sessionId": session_id, "content": content });
        self.fire(
            GooseMethod::Post,
            "/messages/agent",
            "admin_send_agent_msg",
            auth,
            Some(&body),
            OK_POST_CODES,
        )
        .await;
    }

    pub async fn close_session(&mut self, auth: &AuthHeaders, session_id: &str) {
        let endpoint = format!("/sessions/{session_id}/close");
        self.fire(
            GooseMethod::Patch,
            &endpoint,
            "admin_close_session",
            auth,
            None,
            OK_POST_CODES,
        )
        .await;
    }
}

#[async_trait]
impl SupportApi for SupportClient<'_> {
    async fn list_games(&mut self, auth: &AuthHeaders) -> SupportResult<Vec<NamedEntity>> {
        let reply = self
            .call(GooseMethod::Get, "/games/enabled", "games_enabled", auth, None, OK_GET_CODES)
            .await?;
        Ok(reply.data.as_ref().map(named_entities).unwrap_or_default())
    }

    async fn list_issue_types(&mut self, auth: &AuthHeaders) -> SupportResult<Vec<NamedEntity>> {
        let reply = self
            .call(
                GooseMethod::Get,
                "/issue-types",
                "issue_types_enabled",
                auth,
                None,
                OK_GET_CODES,
            )
            .await?;
        Ok(reply.data.as_ref().map(named_entities).unwrap_or_default())
    }

    async fn create_ticket(
        &mut self,
        auth: &AuthHeaders,
        draft: &TicketDraft,
    ) -> SupportResult<String> {
        let body = serde_json::to_value(draft)
            .map_err(|e| SupportError::resolution(format!("ticket body: {e}")))?;
        let name = self.labels.ticket;
        self.call(GooseMethod::Post, "/tickets", name, auth, Some(&body), OK_POST_CODES)
            .await?
            .id()
            .ok_or_else(|| SupportError::resolution("ticket id"))
    }

    async fn create_session(
        &mut self,
        auth: &AuthHeaders,
        ticket_id: &str,
    ) -> SupportResult<String> {
        let body = json!({ "ticketId": ticket_id });
        let name = self.labels.session;
        self.call(GooseMethod::Post, "/sessions", name, auth, Some(&body), OK_POST_CODES)
            .await?
            .id()
            .ok_or_else(|| SupportError::resolution("session id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_body_uses_camel_case() {
        let draft = TicketDraft {
            game_id: "g1".to_string(),
            player_id_or_name: "player_1234".to_string(),
            description: "desc-abc123".to_string(),
            issue_type_ids: vec!["i1".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&draft).ok(),
            Some(json!({
                "gameId": "g1",
                "playerIdOrName": "player_1234",
                "description": "desc-abc123",
                "issueTypeIds": ["i1"]
            }))
        );
    }

    #[test]
    fn auth_headers() {
        assert_eq!(AuthHeaders::anonymous().token(), None);
        assert_eq!(AuthHeaders::bearer("tok").token(), Some("tok"));
    }

    #[test]
    fn reply_helpers() {
        let reply = Reply {
            status: 201,
            data: Some(json!({"id": 9})),
        };
        assert_eq!(reply.id(), Some("9".to_string()));
        assert!(reply.list().is_empty());

        let listing = Reply {
            status: 200,
            data: Some(json!([{"id": "a"}, {"id": "b"}])),
        };
        assert_eq!(listing.list().len(), 2);
    }
}
