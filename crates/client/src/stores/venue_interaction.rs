//! Per-venue check-ins and likes.
//!
//! Check-ins are limited to one every two hours per venue and their counts
//! reset at 5:00 AM. Each venue takes one like per day, where the like day
//! turns over at 4:59 AM.

use std::collections::BTreeMap;

use barbuddy_core::{DayBoundary, OncePerDay, VenueId, XpActivityKind, time_slots};
use chrono::{DateTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::StoreContext;
use super::profile::ProfileStore;
use crate::remote::{Endpoint, Procedure};
use crate::store::{PersistedStore, StoreState};

const COUNT_DAY: DayBoundary = DayBoundary::NIGHTLIFE;
const LIKE_GATE: OncePerDay = OncePerDay::new(DayBoundary::LIKE_RESET);
const INTERACTION_COOLDOWN: TimeDelta = TimeDelta::hours(2);
const POPULAR_VENUE_LIMIT: usize = 10;
const PEAK_SLOTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueInteraction {
    pub venue_id: VenueId,
    /// Check-ins since the last 5:00 AM reset.
    pub count: u32,
    pub last_reset: DateTime<Utc>,
    #[serde(default)]
    pub last_interaction: Option<DateTime<Utc>>,
    /// `HH:MM` slot the user said they arrived in.
    #[serde(default)]
    pub arrival_time: Option<String>,
    /// Lifetime likes.
    pub likes: u32,
    #[serde(default)]
    pub last_like: Option<DateTime<Utc>>,
    #[serde(default)]
    pub like_time_slot: Option<String>,
}

impl VenueInteraction {
    const fn new(venue_id: VenueId, now: DateTime<Utc>) -> Self {
        Self {
            venue_id,
            count: 0,
            last_reset: now,
            last_interaction: None,
            arrival_time: None,
            likes: 0,
            last_like: None,
            like_time_slot: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct Interactions {
    interactions: Vec<VenueInteraction>,
}

impl StoreState for Interactions {
    const KEY: &'static str = "venue-interaction-storage";
}

impl Interactions {
    fn find(&self, venue: &VenueId) -> Option<&VenueInteraction> {
        self.interactions.iter().find(|i| &i.venue_id == venue)
    }

    /// Run `f` on the venue's record, creating it first if needed.
    fn with_entry<R>(
        &mut self,
        venue: &VenueId,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut VenueInteraction) -> R,
    ) -> R {
        if let Some(existing) = self.interactions.iter_mut().find(|i| &i.venue_id == venue) {
            return f(existing);
        }
        let mut created = VenueInteraction::new(venue.clone(), now);
        let result = f(&mut created);
        self.interactions.push(created);
        result
    }
}

/// Activity in one arrival slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotActivity {
    pub time: String,
    pub visits: u32,
    pub likes: u32,
    pub is_current: bool,
    pub is_peak: bool,
}

#[derive(Debug, Clone)]
pub struct VenueInteractionStore {
    ctx: StoreContext,
    state: PersistedStore<Interactions>,
    profile: ProfileStore,
}

impl VenueInteractionStore {
    pub fn new(ctx: &StoreContext, profile: ProfileStore) -> Self {
        Self {
            ctx: ctx.clone(),
            state: ctx.open(),
            profile,
        }
    }

    #[must_use]
    pub fn interactions(&self) -> Vec<VenueInteraction> {
        self.reset_if_needed();
        self.state.read(|s| s.interactions.clone())
    }

    /// Zero check-in counts whose 5:00 AM reset has passed.
    pub fn reset_if_needed(&self) {
        let (now, offset) = (self.ctx.now(), self.ctx.offset());
        let stale = |i: &VenueInteraction| !COUNT_DAY.same_day(i.last_reset, now, &offset);
        if !self.state.read(|s| s.interactions.iter().any(stale)) {
            return;
        }
        self.state.update(|s| {
            for i in &mut s.interactions {
                if stale(&*i) {
                    i.count = 0;
                    i.arrival_time = None;
                    i.last_reset = now;
                }
            }
        });
    }

    #[must_use]
    pub fn can_interact(&self, venue: &VenueId) -> bool {
        let last = self.state.read(|s| s.find(venue).and_then(|i| i.last_interaction));
        last.is_none_or(|last| self.ctx.now() >= last + INTERACTION_COOLDOWN)
    }

    #[must_use]
    pub fn can_like(&self, venue: &VenueId) -> bool {
        let last = self.state.read(|s| s.find(venue).and_then(|i| i.last_like));
        LIKE_GATE.permits(last, self.ctx.now(), &self.ctx.offset())
    }

    /// Check in at a venue. The first check-in at a venue the profile has
    /// never visited awards new-bar XP.
    pub fn increment_interaction(&self, venue: &VenueId, arrival_time: Option<&str>) -> bool {
        self.reset_if_needed();
        if !self.can_interact(venue) {
            debug!(venue = %venue, "check-in on cooldown");
            return false;
        }
        let now = self.ctx.now();
        let count = self.state.update(|s| {
            s.with_entry(venue, now, |i| {
                i.count += 1;
                i.last_interaction = Some(now);
                if let Some(slot) = arrival_time {
                    i.arrival_time = Some(slot.to_owned());
                }
                i.count
            })
        });

        if !self.profile.has_visited(venue) {
            self.profile
                .award_xp(XpActivityKind::VisitNewBar, "Visited a new bar", Some(venue));
        }
        self.track("check_in", venue, arrival_time, now);
        debug!(venue = %venue, count, "checked in");
        true
    }

    /// Like a venue for the given time slot, once per like day.
    pub fn like_venue(&self, venue: &VenueId, time_slot: &str) -> bool {
        if time_slot.is_empty() || !self.can_like(venue) {
            return false;
        }
        let now = self.ctx.now();
        self.state.update(|s| {
            s.with_entry(venue, now, |i| {
                i.likes += 1;
                i.last_like = Some(now);
                i.like_time_slot = Some(time_slot.to_owned());
            });
        });
        self.track("like", venue, Some(time_slot), now);
        true
    }

    fn track(&self, kind: &str, venue: &VenueId, time_slot: Option<&str>, now: DateTime<Utc>) {
        let user_id = self.profile.user_id();
        self.ctx.enqueue(
            "venue interaction",
            Endpoint::Procedure(Procedure::AnalyticsTrackInteraction),
            json!({
                "type": kind,
                "venueId": venue,
                "timeSlot": time_slot,
                "userId": user_id.is_assigned().then_some(user_id),
                "timestamp": now,
            }),
        );
    }

    #[must_use]
    pub fn interaction_count(&self, venue: &VenueId) -> u32 {
        self.reset_if_needed();
        self.state.read(|s| s.find(venue).map_or(0, |i| i.count))
    }

    #[must_use]
    pub fn like_count(&self, venue: &VenueId) -> u32 {
        self.state.read(|s| s.find(venue).map_or(0, |i| i.likes))
    }

    #[must_use]
    pub fn total_likes(&self) -> u32 {
        self.state.read(|s| s.interactions.iter().map(|i| i.likes).sum())
    }

    /// Venues with at least one check-in today or any like.
    #[must_use]
    pub fn total_bars_visited(&self) -> usize {
        self.reset_if_needed();
        self.state
            .read(|s| s.interactions.iter().filter(|i| i.count > 0 || i.likes > 0).count())
    }

    /// Up to ten venues, most liked first.
    #[must_use]
    pub fn most_popular_venues(&self) -> Vec<(VenueId, u32)> {
        let mut venues: Vec<_> = self.state.read(|s| {
            s.interactions
                .iter()
                .map(|i| (i.venue_id.clone(), i.likes))
                .collect()
        });
        venues.sort_by(|a, b| b.1.cmp(&a.1));
        venues.truncate(POPULAR_VENUE_LIMIT);
        venues
    }

    /// Arrival slot(s) with the most check-ins, joined by `/`.
    #[must_use]
    pub fn popular_arrival_time(&self, venue: &VenueId) -> Option<String> {
        self.reset_if_needed();
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        self.state.read(|s| {
            for i in s.interactions.iter().filter(|i| &i.venue_id == venue && i.count > 0) {
                if let Some(slot) = &i.arrival_time {
                    *counts.entry(slot.clone()).or_default() += i.count;
                }
            }
        });
        let max = counts.values().copied().max()?;
        let slots: Vec<_> = counts
            .into_iter()
            .filter(|(_, c)| *c == max)
            .map(|(slot, _)| slot)
            .collect();
        Some(slots.join("/"))
    }

    /// The liked slot with the most likes.
    #[must_use]
    pub fn hot_time(&self, venue: &VenueId) -> Option<(String, u32)> {
        self.state.read(|s| {
            s.interactions
                .iter()
                .filter(|i| &i.venue_id == venue && i.likes > 0)
                .filter_map(|i| i.like_time_slot.clone().map(|slot| (slot, i.likes)))
                .max_by_key(|(_, likes)| *likes)
        })
    }

    /// Visits and likes per arrival slot, with the current slot and the
    /// three busiest slots flagged.
    #[must_use]
    pub fn time_slot_activity(&self, venue: &VenueId) -> Vec<TimeSlotActivity> {
        self.reset_if_needed();
        let local = self.ctx.now().with_timezone(&self.ctx.offset());
        let current = format!("{:02}:{}", local.hour(), if local.minute() >= 30 { "30" } else { "00" });

        let mut slots: Vec<TimeSlotActivity> = self.state.read(|s| {
            let here: Vec<_> = s.interactions.iter().filter(|i| &i.venue_id == venue).collect();
            time_slots()
                .into_iter()
                .map(|time| {
                    let visits = here
                        .iter()
                        .filter(|i| i.arrival_time.as_deref() == Some(time.as_str()))
                        .map(|i| i.count)
                        .sum();
                    let likes = here
                        .iter()
                        .filter(|i| i.like_time_slot.as_deref() == Some(time.as_str()))
                        .map(|i| i.likes)
                        .sum();
                    TimeSlotActivity {
                        is_current: time == current,
                        time,
                        visits,
                        likes,
                        is_peak: false,
                    }
                })
                .collect()
        });

        let mut busiest: Vec<(usize, u32)> = slots.iter().map(|s| s.visits).enumerate().collect();
        busiest.sort_by(|a, b| b.1.cmp(&a.1));
        for (index, _) in busiest.into_iter().take(PEAK_SLOTS) {
            if let Some(slot) = slots.get_mut(index)
                && slot.visits > 0
            {
                slot.is_peak = true;
            }
        }
        slots
    }

    pub async fn flush(&self) {
        self.state.flush().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;
    use crate::remote::DemoRemote;
    use crate::stores::achievements::AchievementStore;
    use crate::testing::{self, ManualClock, RecordingRemote};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 21, 10, 0).unwrap()
    }

    fn store() -> (VenueInteractionStore, ProfileStore, Arc<ManualClock>) {
        let (ctx, clock) = testing::context(Arc::new(DemoRemote), start());
        let profile = ProfileStore::new(&ctx, AchievementStore::new(&ctx));
        (VenueInteractionStore::new(&ctx, profile.clone()), profile, clock)
    }

    fn jba() -> VenueId {
        VenueId::new("6")
    }

    #[tokio::test]
    async fn test_check_in_cooldown() {
        let (store, _, clock) = store();
        assert!(store.increment_interaction(&jba(), Some("21:00")));
        assert!(!store.can_interact(&jba()));
        assert!(!store.increment_interaction(&jba(), None));

        clock.advance(TimeDelta::minutes(119));
        assert!(!store.can_interact(&jba()));
        clock.advance(TimeDelta::minutes(1));
        assert!(store.increment_interaction(&jba(), None));
        assert_eq!(store.interaction_count(&jba()), 2);
        assert_eq!(store.popular_arrival_time(&jba()).as_deref(), Some("21:00"));
    }

    #[tokio::test]
    async fn test_first_visit_awards_xp_once() {
        let (store, profile, clock) = store();
        store.increment_interaction(&jba(), None);
        clock.advance(TimeDelta::hours(3));
        store.increment_interaction(&jba(), None);

        let p = profile.get();
        assert_eq!(p.xp, 25);
        assert_eq!(p.visited_bars, vec![jba()]);
    }

    #[tokio::test]
    async fn test_counts_reset_at_five() {
        let (store, _, clock) = store();
        store.increment_interaction(&jba(), Some("21:00"));
        clock.set(Utc.with_ymd_and_hms(2026, 10, 18, 4, 59, 0).unwrap());
        assert_eq!(store.interaction_count(&jba()), 1);
        clock.set(Utc.with_ymd_and_hms(2026, 10, 18, 5, 0, 0).unwrap());
        assert_eq!(store.interaction_count(&jba()), 0);
        assert_eq!(store.popular_arrival_time(&jba()), None);
    }

    #[tokio::test]
    async fn test_one_like_per_like_day() {
        let (store, _, clock) = store();
        assert!(store.like_venue(&jba(), "22:00"));
        assert!(!store.like_venue(&jba(), "22:30"));
        assert!(store.like_venue(&VenueId::new("1"), "22:00"));

        clock.set(Utc.with_ymd_and_hms(2026, 10, 18, 4, 58, 0).unwrap());
        assert!(!store.can_like(&jba()));
        clock.set(Utc.with_ymd_and_hms(2026, 10, 18, 4, 59, 0).unwrap());
        assert!(store.like_venue(&jba(), "23:00"));

        assert_eq!(store.like_count(&jba()), 2);
        assert_eq!(store.total_likes(), 3);
        assert_eq!(store.hot_time(&jba()), Some(("23:00".to_owned(), 2)));
        assert_eq!(store.total_bars_visited(), 2);
        assert_eq!(store.most_popular_venues()[0], (jba(), 2));
    }

    #[tokio::test]
    async fn test_like_requires_slot() {
        let (store, _, _) = store();
        assert!(!store.like_venue(&jba(), ""));
        assert_eq!(store.total_likes(), 0);
    }

    #[tokio::test]
    async fn test_time_slot_activity() {
        let (store, _, _) = store();
        store.increment_interaction(&jba(), Some("22:00"));
        store.like_venue(&jba(), "22:00");

        let slots = store.time_slot_activity(&jba());
        let ten = slots.iter().find(|s| s.time == "22:00").unwrap();
        assert_eq!((ten.visits, ten.likes), (1, 1));
        assert!(ten.is_peak);
        assert_eq!(slots.iter().filter(|s| s.is_peak).count(), 1);
        assert!(slots.iter().find(|s| s.time == "21:00").unwrap().is_current);
    }

    #[tokio::test]
    async fn test_interactions_tracked() {
        let remote = Arc::new(RecordingRemote::new());
        let (ctx, _) = testing::context(remote.clone(), start());
        let profile = ProfileStore::new(&ctx, AchievementStore::new(&ctx));
        let store = VenueInteractionStore::new(&ctx, profile);
        store.increment_interaction(&jba(), Some("21:00"));
        store.like_venue(&jba(), "21:00");
        ctx.sync.drain().await;

        let tracked = remote.mutations_to(Endpoint::Procedure(Procedure::AnalyticsTrackInteraction));
        assert_eq!(tracked.len(), 2);
        assert_eq!(tracked[0]["type"], "check_in");
        assert_eq!(tracked[1]["venueId"], "6");
    }
}
