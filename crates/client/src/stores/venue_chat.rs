//! Anonymous per-venue chat.
//!
//! Chat state is not persisted, only the device's anonymous id is. Messages
//! from before the last 5:00 AM are never shown. New messages arrive by
//! polling while subscribed.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use barbuddy_core::{ChatMessageId, ChatSessionId, DayBoundary, VenueId};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::StoreContext;
use crate::error::{ClientError, Result};
use crate::poller::Poller;
use crate::remote::{Endpoint, Procedure, RemoteError, Table, log_query_failure};
use crate::store::{PersistedStore, StoreState};

pub const MAX_MESSAGE_LEN: usize = 200;

const ADJECTIVES: [&str; 10] = [
    "Cool", "Happy", "Chill", "Fun", "Wild", "Epic", "Rad", "Zen", "Bold", "Swift",
];
const NOUNS: [&str; 10] = [
    "Buddy", "Pal", "Friend", "Mate", "Dude", "Champ", "Star", "Hero", "Ace", "Pro",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: ChatSessionId,
    /// The device's anonymous id.
    pub user_id: String,
    pub venue_id: VenueId,
    pub anonymous_name: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub session_id: ChatSessionId,
    pub venue_id: VenueId,
    pub content: String,
    pub anonymous_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub current_session: Option<ChatSession>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct AnonymousIdentity {
    user_id: Option<String>,
}

impl StoreState for AnonymousIdentity {
    const KEY: &'static str = "anonymous-user-id";
}

fn anonymous_name() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or_default();
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or_default();
    format!("{adjective}{noun}{}", rng.random_range(1..=999))
}

/// `anon_<millis>_<9 base-36 chars>`
fn anonymous_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
        .collect();
    format!("anon_{}_{suffix}", now.timestamp_millis())
}

/// State and services the poll task needs. The poller itself lives
/// outside, so the task never keeps the store alive.
#[derive(Debug)]
struct ChatCore {
    ctx: StoreContext,
    state: PersistedStore<ChatState>,
    identity: PersistedStore<AnonymousIdentity>,
}

impl ChatCore {
    fn retention_cutoff(&self) -> DateTime<Utc> {
        DayBoundary::NIGHTLIFE.period_start(self.ctx.now(), &self.ctx.offset())
    }

    fn anonymous_user_id(&self) -> String {
        let now = self.ctx.now();
        self.identity
            .update(|s| s.user_id.get_or_insert_with(|| anonymous_id(now)).clone())
    }

    /// Fetch the venue's messages since the cutoff and merge them with
    /// messages sent from this device that the backend has not returned yet.
    async fn refresh(&self, venue: &VenueId) -> std::result::Result<(), RemoteError> {
        let cutoff = self.retention_cutoff();
        let endpoint = Endpoint::Procedure(Procedure::ChatGetMessages);
        let fetched = self
            .ctx
            .remote
            .query(&endpoint, &json!({ "venueId": venue, "since": cutoff }))
            .await;

        let remote = match fetched.and_then(|v| Ok(serde_json::from_value::<Vec<ChatMessage>>(v)?)) {
            Ok(messages) => messages,
            Err(e) => {
                log_query_failure(&endpoint, &e);
                self.state.update(|s| {
                    s.messages.retain(|m| &m.venue_id == venue && m.created_at >= cutoff);
                });
                return Err(e);
            }
        };

        self.state.update(|s| {
            let mut merged: Vec<ChatMessage> = remote
                .into_iter()
                .filter(|m| &m.venue_id == venue && m.created_at >= cutoff)
                .collect();
            for local in s.messages.drain(..) {
                if &local.venue_id == venue
                    && local.created_at >= cutoff
                    && !merged.iter().any(|m| m.id == local.id)
                {
                    merged.push(local);
                }
            }
            merged.sort_by_key(|m| m.created_at);
            if merged != s.messages {
                s.messages = merged;
            }
        });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct VenueChatStore {
    core: Arc<ChatCore>,
    poller: Arc<Mutex<Option<Poller>>>,
    poll_interval: Duration,
}

impl VenueChatStore {
    pub fn new(ctx: &StoreContext, poll_interval: Duration) -> Self {
        Self {
            core: Arc::new(ChatCore {
                ctx: ctx.clone(),
                state: PersistedStore::in_memory(ChatState::default()),
                identity: ctx.open(),
            }),
            poller: Arc::new(Mutex::new(None)),
            poll_interval,
        }
    }

    #[must_use]
    pub fn get(&self) -> ChatState {
        self.core.state.get()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.core.state.read(|s| s.messages.clone())
    }

    pub fn watch(&self) -> tokio::sync::watch::Receiver<ChatState> {
        self.core.state.subscribe()
    }

    /// This device's anonymous id, created on first use.
    #[must_use]
    pub fn anonymous_user_id(&self) -> String {
        self.core.anonymous_user_id()
    }

    /// Join a venue's chat, reusing this device's session there if the
    /// backend knows one.
    #[instrument(skip(self), fields(venue = %venue))]
    pub async fn create_or_get_session(&self, venue: &VenueId) -> ChatSession {
        if let Some(session) = self
            .core
            .state
            .read(|s| s.current_session.clone().filter(|c| &c.venue_id == venue))
        {
            return session;
        }
        self.core.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let user_id = self.core.anonymous_user_id();
        let existing = self
            .core
            .ctx
            .query(
                Endpoint::Table(Table::ChatSessions),
                &json!({ "user_id": user_id, "venue_id": venue }),
            )
            .await
            .and_then(first_session);

        let now = self.core.ctx.now();
        let session = match existing {
            Some(mut session) => {
                debug!(session = %session.id, "resuming chat session");
                session.last_active = now;
                session
            }
            None => {
                let session = ChatSession {
                    id: ChatSessionId::new(uuid::Uuid::new_v4().to_string()),
                    user_id,
                    venue_id: venue.clone(),
                    anonymous_name: anonymous_name(),
                    created_at: now,
                    last_active: now,
                };
                self.core.ctx.enqueue(
                    "chat session",
                    Endpoint::Procedure(Procedure::ChatCreateSession),
                    json!({
                        "sessionId": session.id,
                        "userId": session.user_id,
                        "venueId": session.venue_id,
                        "anonymousName": session.anonymous_name,
                    }),
                );
                info!(name = %session.anonymous_name, "chat session created");
                session
            }
        };

        self.core.state.update(|s| {
            if s.current_session.as_ref().is_some_and(|c| &c.venue_id != venue) {
                s.messages.clear();
            }
            s.current_session = Some(session.clone());
            s.is_loading = false;
        });
        session
    }

    /// Load the venue's messages since the last 5:00 AM.
    ///
    /// On failure the local messages stay and `error` is set, except in demo
    /// mode where there is nothing to load.
    #[instrument(skip(self), fields(venue = %venue))]
    pub async fn load_messages(&self, venue: &VenueId) {
        self.core.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        let result = self.core.refresh(venue).await;
        self.core.state.update(|s| {
            s.is_loading = false;
            if let Err(e) = &result
                && !matches!(e, RemoteError::DemoMode)
            {
                s.error = Some("Failed to load messages".to_owned());
            }
        });
    }

    /// Post a message. It shows up locally at once and is never rolled back.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` before a session exists and
    /// `ClientError::Validation` for empty or over-long content.
    pub fn send_message(&self, venue: &VenueId, content: &str) -> Result<ChatMessage> {
        let Some(session) = self.core.state.read(|s| s.current_session.clone()) else {
            return Err(ClientError::NoActiveSession);
        };
        let content = content.trim();
        let len = content.chars().count();
        if len == 0 {
            return Err(ClientError::Validation("message must not be empty".to_owned()));
        }
        if len > MAX_MESSAGE_LEN {
            return Err(ClientError::Validation(format!(
                "message must be at most {MAX_MESSAGE_LEN} characters"
            )));
        }

        let now = self.core.ctx.now();
        let message = ChatMessage {
            id: ChatMessageId::new(uuid::Uuid::new_v4().to_string()),
            session_id: session.id.clone(),
            venue_id: venue.clone(),
            content: content.to_owned(),
            anonymous_name: session.anonymous_name.clone(),
            created_at: now,
        };
        self.core.state.update(|s| {
            s.error = None;
            s.messages.push(message.clone());
            if let Some(current) = &mut s.current_session {
                current.last_active = now;
            }
        });
        self.core.ctx.enqueue(
            "chat message",
            Endpoint::Procedure(Procedure::ChatSendMessage),
            json!({
                "id": message.id,
                "sessionId": message.session_id,
                "venueId": message.venue_id,
                "content": message.content,
                "anonymousName": message.anonymous_name,
                "userId": session.user_id,
            }),
        );
        Ok(message)
    }

    /// Poll the venue for new messages until unsubscribed. Replaces any
    /// earlier subscription.
    pub fn subscribe(&self, venue: &VenueId) {
        let core = Arc::clone(&self.core);
        let venue = venue.clone();
        let poller = Poller::spawn(self.poll_interval, move || {
            let core = Arc::clone(&core);
            let venue = venue.clone();
            async move {
                if let Err(e) = core.refresh(&venue).await {
                    debug!(error = %e, "chat poll failed");
                }
            }
        });
        let previous = self.slot().replace(poller);
        if let Some(previous) = previous {
            previous.stop();
        }
    }

    pub fn unsubscribe(&self) {
        if let Some(poller) = self.slot().take() {
            poller.stop();
            debug!("chat polling stopped");
        }
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.slot().as_ref().is_some_and(|p| !p.is_cancelled())
    }

    /// Stop polling and forget the session and messages.
    pub fn cleanup(&self) {
        self.unsubscribe();
        self.core.state.update(|s| {
            s.messages.clear();
            s.current_session = None;
            s.error = None;
            s.is_loading = false;
        });
    }

    pub fn clear_error(&self) {
        self.core.state.update(|s| s.error = None);
    }

    pub async fn flush(&self) {
        self.core.identity.flush().await;
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Poller>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn first_session(rows: Value) -> Option<ChatSession> {
    let Value::Array(rows) = rows else {
        return None;
    };
    rows.into_iter().find_map(|row| {
        serde_json::from_value(row)
            .inspect_err(|e| warn!(error = %e, "malformed chat session row"))
            .ok()
    })
}
