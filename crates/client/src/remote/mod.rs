//! Remote backend access.
//!
//! # Architecture
//!
//! - Local state is the source of truth; the backend is a best-effort mirror
//! - Mutations go through the [`SyncQueue`](crate::sync::SyncQueue) and are
//!   never awaited by store actions
//! - Queries are awaited, and any error means "use local or default data"
//! - [`DemoRemote`] stands in when no backend is configured
//!
//! # Endpoints
//!
//! - RPC procedures under `{api_base}/api/trpc/<name>`
//! - Supabase tables under `{supabase}/rest/v1/<table>`
//! - Supabase auth under `{supabase}/auth/v1/...`

mod http;

pub use http::HttpRemote;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Credentials were rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The endpoint cannot be used for this kind of call.
    #[error("Unsupported call: {0}")]
    Unsupported(String),

    /// No backend is configured; nothing was sent.
    #[error("Demo mode: remote calls are disabled")]
    DemoMode,
}

/// RPC procedures exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    ChatSendMessage,
    ChatGetMessages,
    ChatCreateSession,
    BingoCompleteTask,
    BingoCompleteBingo,
    AnalyticsTrackDrunkScale,
    AnalyticsTrackInteraction,
    UserSearchUser,
}

impl Procedure {
    /// Dotted procedure path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::ChatSendMessage => "chat.sendMessage",
            Self::ChatGetMessages => "chat.getMessages",
            Self::ChatCreateSession => "chat.createSession",
            Self::BingoCompleteTask => "bingo.completeTask",
            Self::BingoCompleteBingo => "bingo.completeBingo",
            Self::AnalyticsTrackDrunkScale => "analytics.trackDrunkScale",
            Self::AnalyticsTrackInteraction => "analytics.trackInteraction",
            Self::UserSearchUser => "user.searchUser",
        }
    }
}

/// Backend tables the client reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    UserProfiles,
    DailyStats,
    ChatSessions,
    ChatMessages,
    Friends,
    BingoCompletions,
    BingoCardCompletions,
}

impl Table {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserProfiles => "user_profiles",
            Self::DailyStats => "daily_stats",
            Self::ChatSessions => "chat_sessions",
            Self::ChatMessages => "chat_messages",
            Self::Friends => "friends",
            Self::BingoCompletions => "bingo_completions",
            Self::BingoCardCompletions => "bingo_card_completions",
        }
    }
}

/// Password auth flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFlow {
    SignIn,
    SignUp,
}

/// Where a call is sent.
///
/// - `Procedure`: `mutate` POSTs, `query` GETs with the payload as input
/// - `Table`: `mutate` upserts the payload row(s), `query` selects rows whose
///   columns equal every field of the payload object
/// - `TableDelete`: `mutate` deletes rows matching the payload's fields
/// - `Auth`: `mutate` posts credentials and returns the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Procedure(Procedure),
    Table(Table),
    TableDelete(Table),
    Auth(AuthFlow),
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Procedure(p) => f.write_str(p.path()),
            Self::Table(t) => write!(f, "{}", t.name()),
            Self::TableDelete(t) => write!(f, "delete {}", t.name()),
            Self::Auth(AuthFlow::SignIn) => f.write_str("auth sign-in"),
            Self::Auth(AuthFlow::SignUp) => f.write_str("auth sign-up"),
        }
    }
}

/// Backend client used by the stores and the sync queue.
#[async_trait]
pub trait Remote: Send + Sync + 'static {
    /// Send a write. Store actions call this only through the sync queue.
    async fn mutate(&self, endpoint: &Endpoint, payload: &Value) -> Result<Value, RemoteError>;

    /// Read data.
    async fn query(&self, endpoint: &Endpoint, params: &Value) -> Result<Value, RemoteError>;

    /// Attach (or clear) the signed-in user's access token.
    fn set_access_token(&self, _token: Option<SecretString>) {}

    /// Whether calls are no-ops.
    fn is_demo(&self) -> bool {
        false
    }
}

/// Remote used when no backend is configured.
///
/// Writes succeed without doing anything; reads report
/// [`RemoteError::DemoMode`] so callers fall back to local data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoRemote;

#[async_trait]
impl Remote for DemoRemote {
    async fn mutate(&self, endpoint: &Endpoint, _payload: &Value) -> Result<Value, RemoteError> {
        tracing::debug!(%endpoint, "demo mode, skipping remote write");
        Ok(Value::Null)
    }

    async fn query(&self, _endpoint: &Endpoint, _params: &Value) -> Result<Value, RemoteError> {
        Err(RemoteError::DemoMode)
    }

    fn is_demo(&self) -> bool {
        true
    }
}

/// Log a failed query at the level its cause deserves.
pub(crate) fn log_query_failure(endpoint: &Endpoint, error: &RemoteError) {
    match error {
        RemoteError::DemoMode => tracing::debug!(%endpoint, "demo mode, using local data"),
        e => tracing::warn!(%endpoint, error = %e, "remote query failed, using local data"),
    }
}
