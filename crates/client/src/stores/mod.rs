//! Domain stores.
//!
//! Each store owns one slice of application state and is a cheap `Clone`
//! handle. Stores that need another store's data receive its handle at
//! construction; [`AppState`](crate::state::AppState) wires them together.

mod achievements;
mod age_verification;
mod auth;
mod avatar;
mod bingo;
mod camera_roll;
mod daily_tracker;
mod favorites;
mod profile;
mod terms;
mod theme;
mod venue_chat;
mod venue_interaction;

pub use achievements::{
    Achievement, AchievementState, AchievementStore, ProfileTotals, default_achievements,
};
pub use age_verification::{AgeVerification, AgeVerificationStore};
pub use auth::{AuthState, AuthStore, AuthUser};
pub use avatar::{Avatar, AvatarStore};
pub use bingo::{BingoState, BingoStore, BingoTask};
pub use camera_roll::{CameraPhoto, CameraRollStore};
pub use daily_tracker::{DailyTrackerState, DailyTrackerStore};
pub use favorites::{Favorites, FavoritesStore};
pub use profile::{Friend, ProfileStore, ProfileUpdate, UserProfile, XpActivity};
pub use terms::{CURRENT_TERMS_VERSION, TermsAcceptance, TermsState, TermsStore};
pub use theme::ThemeStore;
pub use venue_chat::{ChatMessage, ChatSession, ChatState, MAX_MESSAGE_LEN, VenueChatStore};
pub use venue_interaction::{TimeSlotActivity, VenueInteraction, VenueInteractionStore};

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;

use crate::clock::Clock;
use crate::remote::{Endpoint, Remote, log_query_failure};
use crate::storage::Storage;
use crate::store::{PersistedStore, StoreState};
use crate::sync::{SyncJob, SyncQueue};

/// Shared services handed to every store.
#[derive(Clone)]
pub struct StoreContext {
    pub storage: Arc<dyn Storage>,
    pub sync: SyncQueue,
    pub remote: Arc<dyn Remote>,
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("demo", &self.remote.is_demo())
            .field("now", &self.now())
            .finish_non_exhaustive()
    }
}

impl StoreContext {
    /// Open the persisted store for `S`.
    pub(crate) fn open<S: StoreState>(&self) -> PersistedStore<S> {
        PersistedStore::open(Arc::clone(&self.storage))
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.clock.offset()
    }

    pub(crate) fn enqueue(&self, label: &'static str, endpoint: Endpoint, payload: Value) {
        self.sync.enqueue(SyncJob::new(label, endpoint, payload));
    }

    /// Run a query, returning `None` (and logging) on any failure.
    pub(crate) async fn query(&self, endpoint: Endpoint, params: &Value) -> Option<Value> {
        match self.remote.query(&endpoint, params).await {
            Ok(value) => Some(value),
            Err(e) => {
                log_query_failure(&endpoint, &e);
                None
            }
        }
    }
}
