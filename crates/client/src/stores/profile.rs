//! The user's profile: identity, lifetime counters, ratings, XP and friends.
//!
//! Profile-level once-per-day actions (nights out, drunk-scale submissions)
//! are gated at local midnight. Every change is mirrored to the
//! `user_profiles` table once the user has an onboarded handle.

use barbuddy_core::{
    DailyStats, DayBoundary, DrinkCounts, DrunkScaleRating, OncePerDay, RankTier, Stat, UserId,
    VenueId, XpActivityKind, XpRank, average_rating,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::StoreContext;
use super::achievements::{AchievementStore, ProfileTotals};
use super::auth::AuthUser;
use crate::error::{ClientError, Result};
use crate::remote::{Endpoint, Procedure, Table};
use crate::store::{PersistedStore, StoreState};

const PROFILE_GATE: OncePerDay = OncePerDay::new(DayBoundary::MIDNIGHT);

/// Bars needed in one night before a night out earns XP.
const BARS_FOR_NIGHT_OUT_XP: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub user_id: UserId,
    pub name: String,
    pub profile_picture: Option<String>,
    pub nights_out: u32,
    pub bars_hit: u32,
    pub rank_title: String,
    pub added_at: DateTime<Utc>,
    pub xp: u32,
}

/// One entry in the XP log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpActivity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: XpActivityKind,
    pub xp_awarded: u32,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub join_date: Option<DateTime<Utc>>,
    /// `#NameNNNNN` after onboarding, `default` before.
    pub user_id: UserId,
    /// Account id from auth, used as the remote row key when known.
    pub auth_id: Option<String>,
    pub nights_out: u32,
    pub bars_hit: u32,
    pub drunk_scale_ratings: Vec<DrunkScaleRating>,
    pub last_night_out_date: Option<DateTime<Utc>>,
    pub last_drunk_scale_date: Option<DateTime<Utc>>,
    pub profile_picture: Option<String>,
    pub has_customized_profile: bool,
    pub has_completed_onboarding: bool,
    pub friends: Vec<Friend>,
    pub xp: u32,
    pub xp_activities: Vec<XpActivity>,
    pub visited_bars: Vec<VenueId>,
    pub events_attended: u32,
    pub friends_referred: u32,
    pub live_events_attended: u32,
    pub featured_drinks_tried: u32,
    pub bar_games_played: u32,
    pub photos_taken: u32,
    /// Lifetime drink and game totals.
    pub totals: DrinkCounts,
    /// The last daily snapshot folded into `totals`.
    pub daily_stats: Option<DailyStats>,
}

impl StoreState for UserProfile {
    const KEY: &'static str = "user-profile-storage";
}

impl UserProfile {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    fn achievement_totals(&self) -> ProfileTotals {
        ProfileTotals {
            bars_hit: self.bars_hit,
            nights_out: self.nights_out,
            photos_taken: self.photos_taken,
            friends: u32::try_from(self.friends.len()).unwrap_or(u32::MAX),
            counts: self.totals,
        }
    }

    fn push_activity(&mut self, kind: XpActivityKind, xp: u32, description: String, now: DateTime<Utc>) {
        self.xp = self.xp.saturating_add(xp);
        self.xp_activities.push(XpActivity {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            xp_awarded: xp,
            timestamp: now,
            description,
        });
    }

    /// Award XP and bump the counter the activity belongs to.
    fn award(&mut self, kind: XpActivityKind, description: &str, venue: Option<&VenueId>, now: DateTime<Utc>) {
        match kind {
            XpActivityKind::VisitNewBar => {
                if let Some(venue) = venue
                    && !self.visited_bars.contains(venue)
                {
                    self.visited_bars.push(venue.clone());
                }
            }
            XpActivityKind::ParticipateEvent => self.events_attended += 1,
            XpActivityKind::BringFriend => self.friends_referred += 1,
            XpActivityKind::LiveMusic => self.live_events_attended += 1,
            XpActivityKind::FeaturedDrink => self.featured_drinks_tried += 1,
            XpActivityKind::BarGame => self.bar_games_played += 1,
            XpActivityKind::PhotoTaken => self.photos_taken += 1,
            XpActivityKind::PoolGames => self.totals.pool_games_won += 1,
            XpActivityKind::DartGames => self.totals.dart_games_won += 1,
            _ => {}
        }
        self.push_activity(kind, kind.xp(), description.to_owned(), now);
    }
}

/// Fields an explicit profile edit may change.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
}

/// Row shape of the `user_profiles` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ProfileRow {
    id: String,
    user_id: UserId,
    first_name: String,
    last_name: String,
    email: String,
    join_date: Option<DateTime<Utc>>,
    xp: u32,
    nights_out: u32,
    bars_hit: u32,
    drunk_scale_ratings: Vec<DrunkScaleRating>,
    total_shots: u32,
    total_scoop_and_scores: u32,
    total_beers: u32,
    total_beer_towers: u32,
    total_funnels: u32,
    total_shotguns: u32,
    pool_games_won: u32,
    dart_games_won: u32,
    photos_taken: u32,
    profile_picture: Option<String>,
    visited_bars: Vec<VenueId>,
    has_completed_onboarding: bool,
    last_night_out_date: Option<DateTime<Utc>>,
    last_drunk_scale_date: Option<DateTime<Utc>>,
}

impl ProfileRow {
    fn from_profile(p: &UserProfile) -> Self {
        Self {
            id: p
                .auth_id
                .clone()
                .unwrap_or_else(|| p.user_id.as_str().to_owned()),
            user_id: p.user_id.clone(),
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            email: p.email.clone(),
            join_date: p.join_date,
            xp: p.xp,
            nights_out: p.nights_out,
            bars_hit: p.bars_hit,
            drunk_scale_ratings: p.drunk_scale_ratings.clone(),
            total_shots: p.totals.shots,
            total_scoop_and_scores: p.totals.scoop_and_scores,
            total_beers: p.totals.beers,
            total_beer_towers: p.totals.beer_towers,
            total_funnels: p.totals.funnels,
            total_shotguns: p.totals.shotguns,
            pool_games_won: p.totals.pool_games_won,
            dart_games_won: p.totals.dart_games_won,
            photos_taken: p.photos_taken,
            profile_picture: p.profile_picture.clone(),
            visited_bars: p.visited_bars.clone(),
            has_completed_onboarding: p.has_completed_onboarding,
            last_night_out_date: p.last_night_out_date,
            last_drunk_scale_date: p.last_drunk_scale_date,
        }
    }

    fn apply_to(self, p: &mut UserProfile) {
        p.auth_id = Some(self.id);
        if self.user_id.is_assigned() {
            p.user_id = self.user_id;
        }
        p.first_name = self.first_name;
        p.last_name = self.last_name;
        p.email = self.email;
        p.join_date = self.join_date.or(p.join_date);
        p.xp = self.xp;
        p.nights_out = self.nights_out;
        p.bars_hit = self.bars_hit;
        p.drunk_scale_ratings = self.drunk_scale_ratings;
        p.totals = DrinkCounts {
            shots: self.total_shots,
            scoop_and_scores: self.total_scoop_and_scores,
            beers: self.total_beers,
            beer_towers: self.total_beer_towers,
            funnels: self.total_funnels,
            shotguns: self.total_shotguns,
            pool_games_won: self.pool_games_won,
            dart_games_won: self.dart_games_won,
        };
        p.photos_taken = self.photos_taken;
        p.profile_picture = self.profile_picture.or(p.profile_picture.take());
        p.visited_bars = self.visited_bars;
        p.has_completed_onboarding = self.has_completed_onboarding;
        p.last_night_out_date = self.last_night_out_date;
        p.last_drunk_scale_date = self.last_drunk_scale_date;
    }
}

/// What `user.searchUser` returns for a match.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RemoteUser {
    user_id: UserId,
    name: String,
    profile_picture: Option<String>,
    nights_out: u32,
    bars_hit: u32,
    xp: u32,
}

/// `#` + letters and digits of the name + five random digits.
fn generate_user_id(first_name: &str, last_name: &str) -> UserId {
    let name: String = format!("{first_name}{last_name}")
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let suffix: u32 = rand::rng().random_range(10_000..=99_999);
    UserId::new(format!("#{name}{suffix}"))
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    ctx: StoreContext,
    state: PersistedStore<UserProfile>,
    achievements: AchievementStore,
}

impl ProfileStore {
    pub fn new(ctx: &StoreContext, achievements: AchievementStore) -> Self {
        Self {
            ctx: ctx.clone(),
            state: ctx.open(),
            achievements,
        }
    }

    #[must_use]
    pub fn get(&self) -> UserProfile {
        self.state.get()
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.state.read(|p| p.user_id.clone())
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<UserProfile> {
        self.state.subscribe()
    }

    /// Apply a mutation, refresh achievements and mirror the profile.
    fn mutate<R>(&self, f: impl FnOnce(&mut UserProfile) -> R) -> R {
        let result = self.state.update(f);
        self.changed();
        result
    }

    /// Like `mutate`, for actions that may turn out to be no-ops. Nothing is
    /// written or mirrored when `f` returns `false`.
    fn mutate_if(&self, f: impl FnOnce(&mut UserProfile) -> bool) -> bool {
        let changed = self.state.update_if(f);
        if changed {
            self.changed();
        }
        changed
    }

    fn changed(&self) {
        let (totals, row) = self
            .state
            .read(|p| (p.achievement_totals(), p.user_id.is_assigned().then(|| ProfileRow::from_profile(p))));
        self.achievements.apply_profile_totals(&totals);
        match row.map(serde_json::to_value) {
            Some(Ok(row)) => self.ctx.enqueue("profile upsert", Endpoint::Table(Table::UserProfiles), row),
            Some(Err(e)) => warn!(error = %e, "failed to serialize profile row"),
            None => debug!("profile not onboarded, skipping sync"),
        }
    }

    pub fn update_profile(&self, update: ProfileUpdate) {
        self.mutate(|p| {
            if let Some(first) = update.first_name {
                p.first_name = first.trim().to_owned();
            }
            if let Some(last) = update.last_name {
                p.last_name = last.trim().to_owned();
            }
            if let Some(email) = update.email {
                p.email = email.trim().to_owned();
            }
            if let Some(picture) = update.profile_picture {
                p.profile_picture = Some(picture);
            }
            p.has_customized_profile = true;
        });
    }

    /// Set the display name.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the first name is blank.
    pub fn set_user_name(&self, first_name: &str, last_name: &str) -> Result<()> {
        let (first, last) = (first_name.trim(), last_name.trim());
        if first.is_empty() {
            return Err(ClientError::Validation("first name must not be empty".to_owned()));
        }
        self.mutate(|p| {
            p.first_name = first.to_owned();
            p.last_name = last.to_owned();
            p.has_customized_profile = true;
        });
        Ok(())
    }

    pub fn set_profile_picture(&self, uri: impl Into<String>) {
        let uri = uri.into();
        self.mutate(|p| {
            p.profile_picture = Some(uri);
            p.has_customized_profile = true;
        });
    }

    #[must_use]
    pub fn can_increment_nights_out(&self) -> bool {
        let last = self.state.read(|p| p.last_night_out_date);
        PROFILE_GATE.permits(last, self.ctx.now(), &self.ctx.offset())
    }

    /// Count tonight as a night out. At most once per calendar day.
    pub fn increment_nights_out(&self) -> bool {
        let (now, offset) = (self.ctx.now(), self.ctx.offset());
        let counted = self.mutate_if(|p| {
            if !PROFILE_GATE.try_pass(&mut p.last_night_out_date, now, &offset) {
                return false;
            }
            p.nights_out += 1;
            if p.bars_hit >= BARS_FOR_NIGHT_OUT_XP {
                p.award(XpActivityKind::CompleteNightOut, "Completed a night out", None, now);
            }
            true
        });
        if counted {
            info!("night out counted");
        } else {
            debug!("night out already counted today");
        }
        counted
    }

    pub fn increment_bars_hit(&self) -> u32 {
        self.mutate(|p| {
            p.bars_hit += 1;
            p.bars_hit
        })
    }

    #[must_use]
    pub fn can_submit_drunk_scale(&self) -> bool {
        let last = self.state.read(|p| p.last_drunk_scale_date);
        PROFILE_GATE.permits(last, self.ctx.now(), &self.ctx.offset())
    }

    /// Record tonight's rating. At most once per calendar day.
    pub fn add_drunk_scale_rating(&self, rating: DrunkScaleRating) -> bool {
        let (now, offset) = (self.ctx.now(), self.ctx.offset());
        let accepted = self.mutate_if(|p| {
            if !PROFILE_GATE.try_pass(&mut p.last_drunk_scale_date, now, &offset) {
                return false;
            }
            p.drunk_scale_ratings.push(rating);
            true
        });
        if accepted {
            let user_id = self.user_id();
            self.ctx.enqueue(
                "track drunk scale",
                Endpoint::Procedure(Procedure::AnalyticsTrackDrunkScale),
                json!({
                    "rating": rating.value(),
                    "userId": user_id.is_assigned().then_some(user_id),
                    "timestamp": now,
                }),
            );
        } else {
            debug!("drunk scale already submitted today");
        }
        accepted
    }

    /// Mean rating rounded to one decimal, 0 with no ratings.
    #[must_use]
    pub fn average_drunk_scale(&self) -> f64 {
        self.state.read(|p| average_rating(&p.drunk_scale_ratings))
    }

    #[must_use]
    pub fn rank(&self) -> RankTier {
        RankTier::from_average(self.average_drunk_scale())
    }

    /// Award XP for an activity; returns the new XP total.
    pub fn award_xp(&self, kind: XpActivityKind, description: &str, venue: Option<&VenueId>) -> u32 {
        let now = self.ctx.now();
        let xp = self.mutate(|p| {
            p.award(kind, description, venue, now);
            p.xp
        });
        debug!(?kind, xp, "xp awarded");
        xp
    }

    #[must_use]
    pub fn has_visited(&self, venue: &VenueId) -> bool {
        self.state.read(|p| p.visited_bars.contains(venue))
    }

    #[must_use]
    pub fn xp_rank(&self) -> XpRank {
        XpRank::for_xp(self.state.read(|p| p.xp))
    }

    #[must_use]
    pub fn xp_for_next_rank(&self) -> u32 {
        XpRank::xp_for_next(self.state.read(|p| p.xp))
    }

    #[must_use]
    pub fn progress_to_next_rank(&self) -> f64 {
        XpRank::progress_to_next(self.state.read(|p| p.xp))
    }

    /// Name the user and assign their `#NameNNNNN` handle.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the first name is blank.
    pub fn complete_onboarding(&self, first_name: &str, last_name: &str) -> Result<UserId> {
        let (first, last) = (first_name.trim(), last_name.trim());
        if first.is_empty() {
            return Err(ClientError::Validation("first name must not be empty".to_owned()));
        }
        let now = self.ctx.now();
        let user_id = generate_user_id(first, last);
        self.mutate(|p| {
            p.first_name = first.to_owned();
            p.last_name = last.to_owned();
            p.user_id = user_id.clone();
            p.join_date.get_or_insert(now);
            p.has_completed_onboarding = true;
            p.has_customized_profile = true;
            p.award(XpActivityKind::SpecialAchievement, "Welcome to BarBuddy!", None, now);
        });
        info!(user_id = %user_id, "onboarding complete");
        Ok(user_id)
    }

    /// Fold a day's counters into lifetime totals.
    ///
    /// Only the growth since the last snapshot of the same day is added, so
    /// saving the same day twice never double counts.
    pub fn accumulate_daily(&self, stats: &DailyStats) -> DrinkCounts {
        let now = self.ctx.now();
        let delta = self.mutate(|p| {
            let baseline = p
                .daily_stats
                .filter(|previous| previous.date == stats.date)
                .map(|previous| previous.counts)
                .unwrap_or_default();
            let delta = stats.counts.saturating_sub(&baseline);
            p.totals.add_assign_saturating(&delta);
            for stat in Stat::ALL {
                let units = delta.get(stat);
                if units > 0 {
                    let kind = stat.xp_kind();
                    p.push_activity(
                        kind,
                        units.saturating_mul(kind.xp()),
                        format!("Logged {units} {}", stat.as_str()),
                        now,
                    );
                }
            }
            p.daily_stats = Some(*stats);
            delta
        });
        debug!(added = delta.total(), date = %stats.date, "daily stats accumulated");
        delta
    }

    /// The last daily snapshot folded into the totals.
    #[must_use]
    pub fn daily_stats(&self) -> Option<DailyStats> {
        self.state.read(|p| p.daily_stats)
    }

    /// Look a user up by handle and add them as a friend.
    ///
    /// Returns `false` when the lookup fails, finds nobody, or the user is
    /// already a friend.
    #[instrument(skip(self), fields(friend = %friend_id))]
    pub async fn add_friend(&self, friend_id: &UserId) -> bool {
        let own_id = self.user_id();
        if friend_id == &own_id || self.state.read(|p| p.friends.iter().any(|f| &f.user_id == friend_id)) {
            return false;
        }
        let Some(found) = self
            .ctx
            .query(
                Endpoint::Procedure(Procedure::UserSearchUser),
                &json!({ "userId": friend_id }),
            )
            .await
        else {
            return false;
        };
        let user = match serde_json::from_value::<Option<RemoteUser>>(found) {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("no user with that id");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "unexpected user search response");
                return false;
            }
        };

        let now = self.ctx.now();
        let friend = Friend {
            user_id: friend_id.clone(),
            name: if user.name.is_empty() { friend_id.to_string() } else { user.name },
            profile_picture: user.profile_picture,
            nights_out: user.nights_out,
            bars_hit: user.bars_hit,
            rank_title: XpRank::for_xp(user.xp).title.to_owned(),
            added_at: now,
            xp: user.xp,
        };
        debug!(remote_id = %user.user_id, "user found");
        let added = self.mutate_if(|p| {
            if p.friends.iter().any(|f| f.user_id == friend.user_id) {
                return false;
            }
            p.friends.push(friend);
            p.award(XpActivityKind::BringFriend, "Added a friend", None, now);
            true
        });
        if added && own_id.is_assigned() {
            self.ctx.enqueue(
                "friend upsert",
                Endpoint::Table(Table::Friends),
                json!({ "user_id": own_id, "friend_id": friend_id, "created_at": now }),
            );
        }
        added
    }

    pub fn remove_friend(&self, friend_id: &UserId) -> bool {
        let removed = self.mutate_if(|p| {
            let before = p.friends.len();
            p.friends.retain(|f| &f.user_id != friend_id);
            p.friends.len() != before
        });
        let own_id = self.user_id();
        if removed && own_id.is_assigned() {
            self.ctx.enqueue(
                "friend delete",
                Endpoint::TableDelete(Table::Friends),
                json!({ "user_id": own_id, "friend_id": friend_id }),
            );
        }
        removed
    }

    /// Back to defaults, unless the user has customized their profile.
    pub fn reset_profile(&self) -> bool {
        if self.state.read(|p| p.has_customized_profile) {
            debug!("profile customized, not resetting");
            return false;
        }
        self.state.replace(UserProfile::default());
        true
    }

    /// Zero every counter, rating and XP while keeping identity and friends.
    pub fn reset_stats(&self) {
        self.mutate(|p| {
            p.nights_out = 0;
            p.bars_hit = 0;
            p.drunk_scale_ratings.clear();
            p.last_night_out_date = None;
            p.last_drunk_scale_date = None;
            p.xp = 0;
            p.xp_activities.clear();
            p.visited_bars.clear();
            p.events_attended = 0;
            p.friends_referred = 0;
            p.live_events_attended = 0;
            p.featured_drinks_tried = 0;
            p.bar_games_played = 0;
            p.photos_taken = 0;
            p.totals = DrinkCounts::default();
            p.daily_stats = None;
        });
        info!("profile stats reset");
    }

    /// Pull the signed-in user's row.
    ///
    /// A missing or malformed row is replaced by a profile built from the
    /// account metadata. If the backend cannot be reached the local profile
    /// stays, with blank names filled in from the account.
    #[instrument(skip(self, user), fields(user = %user.id))]
    pub async fn load_from_remote(&self, user: &AuthUser) {
        let Some(rows) = self
            .ctx
            .query(Endpoint::Table(Table::UserProfiles), &json!({ "id": user.id }))
            .await
        else {
            self.state.update(|p| fill_from_account(p, user));
            return;
        };

        match first_valid_row(rows) {
            Some(row) => {
                self.mutate(|p| row.apply_to(p));
                info!("profile loaded from backend");
            }
            None => {
                info!("no usable profile row, creating one from account");
                self.state.update(|p| {
                    fill_from_account(p, user);
                    p.first_name = user.first_name.clone();
                    p.last_name = user.last_name.clone();
                });
                let row = self.state.read(ProfileRow::from_profile);
                match serde_json::to_value(row) {
                    Ok(row) => self.ctx.enqueue("profile create", Endpoint::Table(Table::UserProfiles), row),
                    Err(e) => warn!(error = %e, "failed to serialize profile row"),
                }
            }
        }
    }

    pub async fn flush(&self) {
        self.state.flush().await;
    }
}

fn fill_from_account(p: &mut UserProfile, user: &AuthUser) {
    p.auth_id = Some(user.id.clone());
    if p.first_name.is_empty() {
        p.first_name.clone_from(&user.first_name);
    }
    if p.last_name.is_empty() {
        p.last_name.clone_from(&user.last_name);
    }
    if p.email.is_empty() {
        p.email = user.email.as_str().to_owned();
    }
    p.join_date.get_or_insert(user.created_at);
}

fn first_valid_row(rows: Value) -> Option<ProfileRow> {
    let row = match rows {
        Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
        Value::Object(_) => rows,
        _ => return None,
    };
    match serde_json::from_value::<ProfileRow>(row) {
        Ok(row) if !row.id.is_empty() => Some(row),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "malformed profile row");
            None
        }
    }
}
