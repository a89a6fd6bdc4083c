//! Application state: every store, wired once.

use std::sync::Arc;

use barbuddy_core::XpActivityKind;
use tracing::info;

use crate::clock::SystemClock;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::remote::{DemoRemote, HttpRemote, Remote};
use crate::storage::FileStorage;
use crate::stores::{
    AchievementStore, AgeVerificationStore, AuthStore, AvatarStore, BingoStore, CameraPhoto,
    CameraRollStore, DailyTrackerStore, FavoritesStore, ProfileStore, StoreContext, TermsStore,
    ThemeStore, VenueChatStore, VenueInteractionStore,
};
use crate::sync::SyncQueue;

/// Every store, sharing one storage directory, remote and sync queue.
///
/// Cheap to clone. Create it once at startup and pass it down.
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    config: ClientConfig,
    ctx: StoreContext,
    achievements: AchievementStore,
    profile: ProfileStore,
    daily_tracker: DailyTrackerStore,
    auth: AuthStore,
    theme: ThemeStore,
    favorites: FavoritesStore,
    avatar: AvatarStore,
    age_verification: AgeVerificationStore,
    terms: TermsStore,
    bingo: BingoStore,
    camera_roll: CameraRollStore,
    venue_interaction: VenueInteractionStore,
    venue_chat: VenueChatStore,
}

impl AppState {
    /// Open every store under `config.data_dir`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let storage = Arc::new(FileStorage::open(&config.data_dir)?);
        let remote: Arc<dyn Remote> = match &config.backend {
            Some(backend) if !config.demo_mode => Arc::new(HttpRemote::new(backend)),
            _ => Arc::new(DemoRemote),
        };
        info!(
            data_dir = %config.data_dir.display(),
            demo = remote.is_demo(),
            "opening BarBuddy state"
        );
        let ctx = StoreContext {
            storage,
            sync: SyncQueue::start(Arc::clone(&remote)),
            remote,
            clock: Arc::new(SystemClock),
        };
        Ok(Self::from_parts(config, ctx))
    }

    /// Wire the stores over an existing context.
    #[must_use]
    pub fn from_parts(config: ClientConfig, ctx: StoreContext) -> Self {
        let achievements = AchievementStore::new(&ctx);
        let profile = ProfileStore::new(&ctx, achievements.clone());
        Self {
            inner: Arc::new(AppStateInner {
                daily_tracker: DailyTrackerStore::new(&ctx, profile.clone()),
                bingo: BingoStore::new(&ctx, profile.clone()),
                venue_interaction: VenueInteractionStore::new(&ctx, profile.clone()),
                venue_chat: VenueChatStore::new(&ctx, config.chat_poll_interval),
                auth: AuthStore::new(&ctx),
                theme: ThemeStore::new(&ctx),
                favorites: FavoritesStore::new(&ctx),
                avatar: AvatarStore::new(&ctx),
                age_verification: AgeVerificationStore::new(&ctx),
                terms: TermsStore::new(&ctx),
                camera_roll: CameraRollStore::new(&ctx),
                achievements,
                profile,
                config,
                ctx,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn context(&self) -> &StoreContext {
        &self.inner.ctx
    }

    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.inner.ctx.remote.is_demo()
    }

    #[must_use]
    pub fn achievements(&self) -> &AchievementStore {
        &self.inner.achievements
    }

    #[must_use]
    pub fn profile(&self) -> &ProfileStore {
        &self.inner.profile
    }

    #[must_use]
    pub fn daily_tracker(&self) -> &DailyTrackerStore {
        &self.inner.daily_tracker
    }

    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    #[must_use]
    pub fn theme(&self) -> &ThemeStore {
        &self.inner.theme
    }

    #[must_use]
    pub fn favorites(&self) -> &FavoritesStore {
        &self.inner.favorites
    }

    #[must_use]
    pub fn avatar(&self) -> &AvatarStore {
        &self.inner.avatar
    }

    #[must_use]
    pub fn age_verification(&self) -> &AgeVerificationStore {
        &self.inner.age_verification
    }

    #[must_use]
    pub fn terms(&self) -> &TermsStore {
        &self.inner.terms
    }

    #[must_use]
    pub fn bingo(&self) -> &BingoStore {
        &self.inner.bingo
    }

    #[must_use]
    pub fn camera_roll(&self) -> &CameraRollStore {
        &self.inner.camera_roll
    }

    #[must_use]
    pub fn venue_interaction(&self) -> &VenueInteractionStore {
        &self.inner.venue_interaction
    }

    #[must_use]
    pub fn venue_chat(&self) -> &VenueChatStore {
        &self.inner.venue_chat
    }

    /// Save a photo to the roll and credit it to the profile.
    pub fn record_photo(&self, uri: impl Into<String>) -> CameraPhoto {
        let photo = self.inner.camera_roll.add_photo(uri);
        self.inner
            .profile
            .award_xp(XpActivityKind::PhotoTaken, "Took a photo", None);
        photo
    }

    /// Sign in and pull the account's profile.
    ///
    /// # Errors
    ///
    /// See [`AuthStore::sign_in`].
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let user = self.inner.auth.sign_in(email, password).await?;
        self.inner.profile.load_from_remote(&user).await;
        self.inner.bingo.load_from_remote().await;
        Ok(())
    }

    /// Stop background work and write every store to disk.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        inner.venue_chat.unsubscribe();
        tokio::join!(
            inner.achievements.flush(),
            inner.profile.flush(),
            inner.daily_tracker.flush(),
            inner.auth.flush(),
            inner.theme.flush(),
            inner.favorites.flush(),
            inner.avatar.flush(),
            inner.age_verification.flush(),
            inner.terms.flush(),
            inner.bingo.flush(),
            inner.camera_roll.flush(),
            inner.venue_interaction.flush(),
            inner.venue_chat.flush(),
        );
        inner.ctx.sync.drain().await;
        info!("BarBuddy state flushed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use barbuddy_core::{Stat, Theme};

    use super::*;

    #[tokio::test]
    async fn test_new_demo_state_persists_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::demo(dir.path());

        let state = AppState::new(config.clone()).unwrap();
        assert!(state.is_demo());
        state.theme().set_theme(Theme::Light);
        state.daily_tracker().update_stat(Stat::Beers, 2);
        state.record_photo("file:///tmp/a.jpg");
        state.shutdown().await;

        let reopened = AppState::new(config).unwrap();
        assert_eq!(reopened.theme().theme(), Theme::Light);
        assert_eq!(reopened.daily_tracker().daily().counts.beers, 2);
        assert_eq!(reopened.camera_roll().photo_count(), 1);
        assert_eq!(reopened.profile().get().photos_taken, 1);
    }

    #[tokio::test]
    async fn test_demo_sign_in_fills_profile() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(ClientConfig::demo(dir.path())).unwrap();
        state.sign_in("sam@example.com", "secret1").await.unwrap();
        assert!(state.auth().is_authenticated());
        assert_eq!(state.profile().get().email, "sam@example.com");
        state.shutdown().await;
    }
}
