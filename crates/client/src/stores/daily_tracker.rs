//! Tonight's counters.
//!
//! The tracker's day runs from 5:00 AM to 5:00 AM local time so a night
//! out that crosses midnight stays one day. Counters are folded into the
//! profile's lifetime totals on [`DailyTrackerStore::save_to_profile`].

use barbuddy_core::{DailyStats, DayBoundary, DrinkCounts, DrunkScaleRating, Stat, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::StoreContext;
use super::profile::ProfileStore;
use crate::remote::{Endpoint, Table};
use crate::store::{PersistedStore, StoreState};

const TRACKER_DAY: DayBoundary = DayBoundary::NIGHTLIFE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DailyTrackerState {
    pub daily: DailyStats,
    /// Running totals of every increment the tracker has seen.
    pub totals: DrinkCounts,
    pub last_reset: Option<DateTime<Utc>>,
    /// Nightlife day of the last successful remote load.
    pub last_sync_date: Option<NaiveDate>,
}

impl Default for DailyTrackerState {
    fn default() -> Self {
        Self {
            daily: DailyStats::empty(NaiveDate::default()),
            totals: DrinkCounts::default(),
            last_reset: None,
            last_sync_date: None,
        }
    }
}

impl StoreState for DailyTrackerState {
    const KEY: &'static str = "daily-tracker-storage";
}

/// Row shape of the `daily_stats` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyStatsRow {
    user_id: UserId,
    date: NaiveDate,
    #[serde(default)]
    shots: u32,
    #[serde(default)]
    scoop_and_scores: u32,
    #[serde(default)]
    beers: u32,
    #[serde(default)]
    beer_towers: u32,
    #[serde(default)]
    funnels: u32,
    #[serde(default)]
    shotguns: u32,
    #[serde(default)]
    pool_games_won: u32,
    #[serde(default)]
    dart_games_won: u32,
    #[serde(default)]
    drunk_scale: Option<DrunkScaleRating>,
}

impl DailyStatsRow {
    fn new(user_id: UserId, stats: &DailyStats) -> Self {
        let c = stats.counts;
        Self {
            user_id,
            date: stats.date,
            shots: c.shots,
            scoop_and_scores: c.scoop_and_scores,
            beers: c.beers,
            beer_towers: c.beer_towers,
            funnels: c.funnels,
            shotguns: c.shotguns,
            pool_games_won: c.pool_games_won,
            dart_games_won: c.dart_games_won,
            drunk_scale: stats.drunk_scale,
        }
    }

    fn into_stats(self) -> DailyStats {
        DailyStats {
            date: self.date,
            counts: DrinkCounts {
                shots: self.shots,
                scoop_and_scores: self.scoop_and_scores,
                beers: self.beers,
                beer_towers: self.beer_towers,
                funnels: self.funnels,
                shotguns: self.shotguns,
                pool_games_won: self.pool_games_won,
                dart_games_won: self.dart_games_won,
            },
            drunk_scale: self.drunk_scale,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DailyTrackerStore {
    ctx: StoreContext,
    state: PersistedStore<DailyTrackerState>,
    profile: ProfileStore,
}

impl DailyTrackerStore {
    pub fn new(ctx: &StoreContext, profile: ProfileStore) -> Self {
        let store = Self {
            ctx: ctx.clone(),
            state: ctx.open(),
            profile,
        };
        store.reset_if_needed();
        store
    }

    #[must_use]
    pub fn get(&self) -> DailyTrackerState {
        self.state.get()
    }

    /// Today's counters, after rolling over if the day has changed.
    #[must_use]
    pub fn daily(&self) -> DailyStats {
        self.reset_if_needed();
        self.state.read(|s| s.daily)
    }

    fn today(&self) -> NaiveDate {
        TRACKER_DAY.day_of(self.ctx.now(), &self.ctx.offset())
    }

    /// Start a fresh day when the 5:00 AM boundary has passed.
    pub fn reset_if_needed(&self) -> bool {
        let (today, now) = (self.today(), self.ctx.now());
        if self.state.read(|s| s.daily.date == today) {
            return false;
        }
        let reset = self.state.update_if(|s| {
            if s.daily.date == today {
                return false;
            }
            s.daily = DailyStats::empty(today);
            s.last_reset = Some(now);
            true
        });
        if reset {
            debug!(%today, "daily counters reset");
        }
        reset
    }

    /// Add `delta` to one counter, clamped at zero. Totals follow the
    /// clamped change. Returns the new counter value.
    pub fn update_stat(&self, stat: Stat, delta: i64) -> u32 {
        self.reset_if_needed();
        self.state.update(|s| {
            let slot = s.daily.counts.get_mut(stat);
            let current = i64::from(*slot);
            let next = u32::try_from(current.saturating_add(delta).max(0)).unwrap_or(u32::MAX);
            let applied = i64::from(next) - current;
            *slot = next;

            let total = s.totals.get_mut(stat);
            *total = u32::try_from((i64::from(*total) + applied).max(0)).unwrap_or(u32::MAX);
            next
        })
    }

    pub fn set_drunk_scale(&self, rating: DrunkScaleRating) {
        self.reset_if_needed();
        self.state.update(|s| s.daily.drunk_scale = Some(rating));
    }

    /// Today's counters, refreshed from the backend at most once per day.
    #[instrument(skip(self))]
    pub async fn load_today_stats(&self) -> DailyStats {
        self.reset_if_needed();
        let today = self.today();
        if self.state.read(|s| s.last_sync_date) == Some(today) {
            debug!("already synced today");
            return self.state.read(|s| s.daily);
        }
        let user_id = self.profile.user_id();
        if !user_id.is_assigned() {
            debug!("profile not onboarded, using local stats");
            return self.state.read(|s| s.daily);
        }

        let Some(rows) = self
            .ctx
            .query(
                Endpoint::Table(Table::DailyStats),
                &serde_json::json!({ "user_id": user_id, "date": today }),
            )
            .await
        else {
            return self.state.read(|s| s.daily);
        };

        let remote = first_row(rows).filter(|stats| stats.date == today);
        self.state.update(|s| {
            if let Some(stats) = remote
                && s.daily.date == today
            {
                s.daily = stats;
            }
            s.last_sync_date = Some(today);
            s.daily
        })
    }

    /// Fold today's counters and rating into the profile, then mirror them.
    pub fn save_to_profile(&self) -> DrinkCounts {
        let daily = self.daily();
        let added = self.profile.accumulate_daily(&daily);
        if let Some(rating) = daily.drunk_scale {
            self.profile.add_drunk_scale_rating(rating);
        }

        let user_id = self.profile.user_id();
        if user_id.is_assigned() {
            match serde_json::to_value(DailyStatsRow::new(user_id, &daily)) {
                Ok(row) => self.ctx.enqueue("daily stats upsert", Endpoint::Table(Table::DailyStats), row),
                Err(e) => warn!(error = %e, "failed to serialize daily stats row"),
            }
        }
        info!(date = %daily.date, added = added.total(), "daily stats saved to profile");
        added
    }

    /// Sum of today's counters.
    #[must_use]
    pub fn daily_total(&self) -> u32 {
        self.daily().counts.total()
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.state.read(|s| s.totals.total())
    }

    pub fn reset_all_stats(&self) {
        let (today, now) = (self.today(), self.ctx.now());
        self.state.update(|s| {
            s.daily = DailyStats::empty(today);
            s.totals = DrinkCounts::default();
            s.last_reset = Some(now);
        });
        info!("daily tracker reset");
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<DailyTrackerState> {
        self.state.subscribe()
    }

    pub async fn flush(&self) {
        self.state.flush().await;
    }
}

fn first_row(rows: Value) -> Option<DailyStats> {
    let row = match rows {
        Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
        Value::Object(_) => rows,
        _ => return None,
    };
    serde_json::from_value::<DailyStatsRow>(row)
        .map(DailyStatsRow::into_stats)
        .inspect_err(|e| warn!(error = %e, "malformed daily stats row"))
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;

    use super::*;
    use crate::clock::Clock;
    use crate::remote::{DemoRemote, Remote};
    use crate::stores::achievements::AchievementStore;
    use crate::testing::{self, ManualClock, RecordingRemote};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 22, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    fn tracker_with(remote: Arc<dyn Remote>) -> (DailyTrackerStore, ProfileStore, StoreContext, Arc<ManualClock>) {
        let (ctx, clock) = testing::context(remote, start());
        let profile = ProfileStore::new(&ctx, AchievementStore::new(&ctx));
        let tracker = DailyTrackerStore::new(&ctx, profile.clone());
        (tracker, profile, ctx, clock)
    }

    #[tokio::test]
    async fn test_update_stat_clamps_at_zero() {
        let (tracker, _, _, _) = tracker_with(Arc::new(DemoRemote));
        assert_eq!(tracker.update_stat(Stat::Beers, 2), 2);
        assert_eq!(tracker.update_stat(Stat::Beers, -5), 0);
        assert_eq!(tracker.update_stat(Stat::Shots, 1), 1);

        let state = tracker.get();
        assert_eq!(state.totals.beers, 0);
        assert_eq!(state.totals.shots, 1);
        assert_eq!(tracker.daily_total(), 1);
    }

    #[tokio::test]
    async fn test_update_stat_extreme_deltas_saturate() {
        let (tracker, _, _, _) = tracker_with(Arc::new(DemoRemote));
        tracker.update_stat(Stat::Beers, 3);
        assert_eq!(tracker.update_stat(Stat::Beers, i64::MAX), u32::MAX);
        assert_eq!(tracker.get().totals.beers, u32::MAX);
        assert_eq!(tracker.update_stat(Stat::Beers, i64::MAX), u32::MAX);

        assert_eq!(tracker.update_stat(Stat::Beers, i64::MIN), 0);
        assert_eq!(tracker.get().totals.beers, 0);
        assert_eq!(tracker.update_stat(Stat::Shots, i64::MIN), 0);
    }

    #[tokio::test]
    async fn test_reads_do_not_notify() {
        let (tracker, _, _, clock) = tracker_with(Arc::new(DemoRemote));
        tracker.update_stat(Stat::Beers, 1);
        let mut rx = tracker.subscribe();
        rx.borrow_and_update();

        let _ = tracker.daily();
        let _ = tracker.daily_total();
        assert!(!tracker.reset_if_needed());
        assert!(!rx.has_changed().unwrap());

        clock.advance(TimeDelta::days(1));
        assert!(tracker.reset_if_needed());
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_day_rolls_over_at_five() {
        let (tracker, _, _, clock) = tracker_with(Arc::new(DemoRemote));
        tracker.update_stat(Stat::Beers, 3);
        assert_eq!(tracker.daily().date, date(17));

        clock.set(Utc.with_ymd_and_hms(2026, 10, 18, 4, 59, 0).unwrap());
        assert!(!tracker.reset_if_needed());
        assert_eq!(tracker.daily().counts.beers, 3);

        clock.set(Utc.with_ymd_and_hms(2026, 10, 18, 5, 0, 0).unwrap());
        assert_eq!(tracker.daily(), DailyStats::empty(date(18)));
        assert_eq!(tracker.total_count(), 3);
        assert_eq!(tracker.get().last_reset, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_save_to_profile() {
        let (tracker, profile, _, _) = tracker_with(Arc::new(DemoRemote));
        tracker.update_stat(Stat::Beers, 4);
        tracker.update_stat(Stat::PoolGamesWon, 1);
        tracker.set_drunk_scale(DrunkScaleRating::new(6).unwrap());

        let added = tracker.save_to_profile();
        assert_eq!(added.beers, 4);

        tracker.update_stat(Stat::Beers, 1);
        tracker.save_to_profile();

        let p = profile.get();
        assert_eq!(p.totals.beers, 5);
        assert_eq!(p.totals.pool_games_won, 1);
        assert_eq!(p.drunk_scale_ratings, vec![DrunkScaleRating::new(6).unwrap()]);
    }

    #[tokio::test]
    async fn test_save_to_profile_syncs_once_onboarded() {
        let remote = Arc::new(RecordingRemote::new());
        let (tracker, profile, ctx, _) = tracker_with(remote.clone());
        tracker.update_stat(Stat::Shots, 2);
        tracker.save_to_profile();
        ctx.sync.drain().await;
        assert!(remote.mutations_to(Endpoint::Table(Table::DailyStats)).is_empty());

        let id = profile.complete_onboarding("Alex", "Kim").unwrap();
        tracker.save_to_profile();
        ctx.sync.drain().await;
        let rows = remote.mutations_to(Endpoint::Table(Table::DailyStats));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["user_id"], id.as_str());
        assert_eq!(rows[0]["date"], "2026-10-17");
        assert_eq!(rows[0]["shots"], 2);
    }

    #[tokio::test]
    async fn test_load_today_stats_skips_remote_when_synced() {
        let remote = Arc::new(RecordingRemote::new());
        let (tracker, profile, _, _) = tracker_with(remote.clone());
        profile.complete_onboarding("Alex", "Kim").unwrap();
        tracker.state.update(|s| s.last_sync_date = Some(date(17)));

        tracker.load_today_stats().await;
        assert!(remote.queries().is_empty());
    }

    #[tokio::test]
    async fn test_load_today_stats_adopts_row() {
        let remote = Arc::new(RecordingRemote::new());
        remote.respond(
            Endpoint::Table(Table::DailyStats),
            json!([{ "user_id": "#AlexKim12345", "date": "2026-10-17", "beers": 6, "drunk_scale": 4 }]),
        );
        let (tracker, profile, _, _) = tracker_with(remote.clone());
        profile.complete_onboarding("Alex", "Kim").unwrap();

        let stats = tracker.load_today_stats().await;
        assert_eq!(stats.counts.beers, 6);
        assert_eq!(stats.drunk_scale, Some(DrunkScaleRating::new(4).unwrap()));
        assert_eq!(tracker.get().last_sync_date, Some(date(17)));

        tracker.load_today_stats().await;
        assert_eq!(remote.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_load_today_stats_failure_keeps_local() {
        let (tracker, profile, _, _) = tracker_with(Arc::new(testing::FailingRemote));
        profile.complete_onboarding("Alex", "Kim").unwrap();
        tracker.update_stat(Stat::Funnels, 1);

        let stats = tracker.load_today_stats().await;
        assert_eq!(stats.counts.funnels, 1);
        assert_eq!(tracker.get().last_sync_date, None);
    }

    #[tokio::test]
    async fn test_reset_all_stats() {
        let (tracker, _, _, clock) = tracker_with(Arc::new(DemoRemote));
        tracker.update_stat(Stat::Shotguns, 2);
        clock.advance(TimeDelta::days(1));
        tracker.update_stat(Stat::Shotguns, 1);
        assert_eq!(tracker.total_count(), 3);

        tracker.reset_all_stats();
        assert_eq!(tracker.total_count(), 0);
        assert_eq!(tracker.daily_total(), 0);
    }
}
