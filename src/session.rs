//! Session bootstrap: give an actor a chat session id, creating the ticket and
//! session on first use and reusing the cached ids afterwards.
//!
//! State lives in goose session data, one [`ActorState`] per user, so nothing
//! here is shared between actors.

use goose::prelude::*;

use crate::api::{AuthHeaders, SupportApi, TicketDraft};
use crate::config::LoadConfig;
use crate::error::{SupportError, SupportResult};
use crate::random_text;
use crate::select::pick_preferred;

/// Per-actor identity and caches. The caches are never evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorState {
    pub player_id: String,
    /// `None` until the actor has logged in or chosen to stay anonymous.
    pub auth: Option<AuthHeaders>,
    pub cached_session_id: Option<String>,
    pub cached_ticket_id: Option<String>,
    pub cached_game_id: Option<String>,
    pub cached_issue_type_id: Option<String>,
}

impl ActorState {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            ..Self::default()
        }
    }

    pub fn with_auth(mut self, auth: AuthHeaders) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.cached_session_id = Some(session_id.into());
        self
    }
}

/// Where game and issue-type ids come from.
#[derive(Debug, Clone, Copy)]
pub struct Lookups<'a> {
    pub game_id: Option<&'a str>,
    pub issue_type_id: Option<&'a str>,
    pub preferred_games: &'a [String],
    pub preferred_issue_types: &'a [String],
}

impl<'a> From<&'a LoadConfig> for Lookups<'a> {
    fn from(config: &'a LoadConfig) -> Self {
        Self {
            game_id: config.game_id.as_deref(),
            issue_type_id: config.issue_type_id.as_deref(),
            preferred_games: &config.preferred_games,
            preferred_issue_types: &config.preferred_issue_types,
        }
    }
}

/// Ticket description: a fresh random tag (`desc-x7Yq2a`) or a fixed marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketNote {
    Random(&'static str),
    Fixed(&'static str),
}

impl TicketNote {
    pub fn render(self) -> String {
        match self {
            Self::Random(prefix) => random_text(prefix),
            Self::Fixed(text) => text.to_string(),
        }
    }
}

fn auth_of(state: &ActorState) -> SupportResult<AuthHeaders> {
    state.auth.clone().ok_or(SupportError::Unauthenticated)
}

/// Return the cached session id, or create ticket and session and cache them.
///
/// A cached session costs no network call. Otherwise at most one ticket call
/// and one session call are made. A failed step comes back as
/// [`SupportError::ResolutionFailure`], leaves its cache empty and is not
/// retried until the next invocation. The ticket id is cached as soon as the
/// ticket exists, so a later attempt only retries the session.
pub async fn ensure_session<A>(
    state: &mut ActorState,
    api: &mut A,
    lookups: &Lookups<'_>,
    note: TicketNote,
) -> SupportResult<String>
where
    A: SupportApi + ?Sized,
{
    auth_of(state)?;
    if let Some(session_id) = &state.cached_session_id {
        return Ok(session_id.clone());
    }
    renew_session(state, api, lookups, note).await
}

/// Always create a new session, on the cached ticket when there is one, and
/// make it the actor's cached session.
pub async fn renew_session<A>(
    state: &mut ActorState,
    api: &mut A,
    lookups: &Lookups<'_>,
    note: TicketNote,
) -> SupportResult<String>
where
    A: SupportApi + ?Sized,
{
    let auth = auth_of(state)?;
    let ticket_id = match &state.cached_ticket_id {
        Some(ticket_id) => ticket_id.clone(),
        None => {
            let ticket_id = open_ticket(state, api, lookups, note)
                .await
                .map_err(|e| e.while_resolving("ticket"))?;
            state.cached_ticket_id = Some(ticket_id.clone());
            ticket_id
        }
    };

    let session_id = api
        .create_session(&auth, &ticket_id)
        .await
        .map_err(|e| e.while_resolving("session"))?;
    state.cached_session_id = Some(session_id.clone());
    Ok(session_id)
}

/// Create a new ticket for the actor without touching the ticket cache.
pub async fn open_ticket<A>(
    state: &mut ActorState,
    api: &mut A,
    lookups: &Lookups<'_>,
    note: TicketNote,
) -> SupportResult<String>
where
    A: SupportApi + ?Sized,
{
    let auth = auth_of(state)?;
    let game_id = resolve_game_id(state, api, lookups).await?;
    let issue_type_id = resolve_issue_type_id(state, api, lookups).await?;

    let draft = TicketDraft {
        game_id,
        player_id_or_name: state.player_id.clone(),
        description: note.render(),
        issue_type_ids: vec![issue_type_id],
    };
    api.create_ticket(&auth, &draft).await
}

/// Environment override, then the actor's cache, then the server listing.
pub async fn resolve_game_id<A>(
    state: &mut ActorState,
    api: &mut A,
    lookups: &Lookups<'_>,
) -> SupportResult<String>
where
    A: SupportApi + ?Sized,
{
    if let Some(id) = lookups.game_id {
        return Ok(id.to_string());
    }
    if let Some(id) = &state.cached_game_id {
        return Ok(id.clone());
    }
    let auth = auth_of(state)?;
    let games = api
        .list_games(&auth)
        .await
        .map_err(|e| e.while_resolving("game id"))?;
    let id = pick_preferred(&games, lookups.preferred_games)
        .ok_or_else(|| SupportError::resolution("game id"))?;
    state.cached_game_id = Some(id.clone());
    Ok(id)
}

/// Same policy as [`resolve_game_id`] for issue types.
pub async fn resolve_issue_type_id<A>(
    state: &mut ActorState,
    api: &mut A,
    lookups: &Lookups<'_>,
) -> SupportResult<String>
where
    A: SupportApi + ?Sized,
{
    if let Some(id) = lookups.issue_type_id {
        return Ok(id.to_string());
    }
    if let Some(id) = &state.cached_issue_type_id {
        return Ok(id.clone());
    }
    let auth = auth_of(state)?;
    let types = api
        .list_issue_types(&auth)
        .await
        .map_err(|e| e.while_resolving("issue type id"))?;
    let id = pick_preferred(&types, lookups.preferred_issue_types)
        .ok_or_else(|| SupportError::resolution("issue type id"))?;
    state.cached_issue_type_id = Some(id.clone());
    Ok(id)
}

// ============================================================================
// goose session data
// ============================================================================

/// Copy of the user's state, or a blank one before `on_start` ran.
pub fn load_state(user: &GooseUser) -> ActorState {
    user.get_session_data::<ActorState>()
        .cloned()
        .unwrap_or_default()
}

pub fn store_state(user: &mut GooseUser, state: ActorState) {
    user.set_session_data(state);
}
