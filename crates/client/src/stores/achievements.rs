//! Trophies.
//!
//! Most achievements are counters over lifetime profile totals. Counter
//! achievements come in five-level chains (e.g. 5, 15, 30, 50 and 100 bars)
//! where each level links to the next. The rest are completed explicitly.

use barbuddy_core::{AchievementCategory, AchievementId, DayBoundary, DrinkCounts, OncePerDay, Stat};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::StoreContext;
use crate::store::{PersistedStore, StoreState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: AchievementId,
    pub title: String,
    pub description: String,
    pub category: AchievementCategory,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub icon: String,
    pub progress: Option<u32>,
    pub max_progress: Option<u32>,
    pub order: u32,
    pub level: Option<u8>,
    #[serde(default)]
    pub is_multi_level: bool,
    pub next_level_id: Option<AchievementId>,
}

impl Achievement {
    /// Mark complete, stamping the time only the first time.
    fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(now);
        true
    }

    /// Set progress and complete once it reaches the maximum.
    fn set_progress(&mut self, progress: u32, now: DateTime<Utc>) -> bool {
        self.progress = Some(progress);
        match self.max_progress {
            Some(max) if progress >= max => self.complete(now),
            _ => false,
        }
    }
}

/// Lifetime numbers achievements are measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileTotals {
    pub bars_hit: u32,
    pub nights_out: u32,
    pub photos_taken: u32,
    pub friends: u32,
    pub counts: DrinkCounts,
}

#[derive(Debug, Clone, Copy)]
enum Metric {
    BarsHit,
    NightsOut,
    PhotosTaken,
    Friends,
    Drink(Stat),
}

impl Metric {
    const fn value(self, totals: &ProfileTotals) -> u32 {
        match self {
            Self::BarsHit => totals.bars_hit,
            Self::NightsOut => totals.nights_out,
            Self::PhotosTaken => totals.photos_taken,
            Self::Friends => totals.friends,
            Self::Drink(stat) => totals.counts.get(stat),
        }
    }
}

struct Chain {
    metric: Metric,
    category: AchievementCategory,
    icon: &'static str,
    /// `{}` is replaced by the threshold.
    description: &'static str,
    levels: [(&'static str, &'static str, u32); 5],
}

const CHAINS: &[Chain] = &[
    Chain {
        metric: Metric::BarsHit,
        category: AchievementCategory::Bars,
        icon: "map-pin",
        description: "Visit {} different bars total",
        levels: [
            ("bar-explorer", "Bar Explorer", 5),
            ("bar-adventurer", "Bar Adventurer", 15),
            ("bar-enthusiast", "Bar Enthusiast", 30),
            ("bar-connoisseur", "Bar Connoisseur", 50),
            ("bar-legend", "Bar Legend", 100),
        ],
    },
    Chain {
        metric: Metric::NightsOut,
        category: AchievementCategory::Nights,
        icon: "moon",
        description: "Complete {} nights out total",
        levels: [
            ("night-owl", "Night Owl", 10),
            ("party-goer", "Party Goer", 25),
            ("social-butterfly-nights", "Social Butterfly", 50),
            ("nightlife-aficionado", "Nightlife Aficionado", 75),
            ("nightlife-legend", "Nightlife Legend", 100),
        ],
    },
    Chain {
        metric: Metric::Drink(Stat::Beers),
        category: AchievementCategory::Consumption,
        icon: "beer",
        description: "Drink {} beers total",
        levels: [
            ("beer-beginner", "Beer Beginner", 10),
            ("brew-enthusiast", "Brew Enthusiast", 50),
            ("lager-lover", "Lager Lover", 100),
            ("ale-aficionado", "Ale Aficionado", 250),
            ("beer-annihilator", "Beer Annihilator", 500),
        ],
    },
    Chain {
        metric: Metric::Drink(Stat::Shots),
        category: AchievementCategory::Consumption,
        icon: "wine",
        description: "Take {} shots total",
        levels: [
            ("shot-starter", "Shot Starter", 10),
            ("quick-shooter", "Quick Shooter", 30),
            ("shot-pro", "Shot Pro", 75),
            ("shot-master", "Shot Master", 150),
            ("shot-legend", "Shot Legend", 300),
        ],
    },
    Chain {
        metric: Metric::Drink(Stat::BeerTowers),
        category: AchievementCategory::Consumption,
        icon: "building",
        description: "Finish {} beer towers total",
        levels: [
            ("tower-rookie", "Tower Rookie", 5),
            ("tower-enthusiast", "Tower Enthusiast", 15),
            ("tower-master", "Tower Master", 30),
            ("tower-connoisseur", "Tower Connoisseur", 50),
            ("tower-titan", "Tower Titan", 100),
        ],
    },
    Chain {
        metric: Metric::Drink(Stat::ScoopAndScores),
        category: AchievementCategory::Consumption,
        icon: "ice-cream",
        description: "Order {} Scoop & Scores total",
        levels: [
            ("rookie-scooper", "Rookie Scooper", 10),
            ("scoop-enthusiast", "Scoop Enthusiast", 25),
            ("scoop-pro", "Scoop Pro", 50),
            ("scoop-master", "Scoop Master", 100),
            ("scoop-champion", "Scoop Champion", 200),
        ],
    },
    Chain {
        metric: Metric::Drink(Stat::Funnels),
        category: AchievementCategory::Consumption,
        icon: "filter",
        description: "Do {} funnels total",
        levels: [
            ("funnel-novice", "Funnel Novice", 5),
            ("funnel-enthusiast", "Funnel Enthusiast", 15),
            ("funnel-pro", "Funnel Pro", 30),
            ("funnel-master", "Funnel Master", 50),
            ("funnel-champion", "Funnel Champion", 75),
        ],
    },
    Chain {
        metric: Metric::Drink(Stat::Shotguns),
        category: AchievementCategory::Consumption,
        icon: "zap",
        description: "Shotgun {} beers total",
        levels: [
            ("shotgun-novice", "Shotgun Novice", 10),
            ("shotgun-enthusiast", "Shotgun Enthusiast", 25),
            ("shotgun-pro", "Shotgun Pro", 50),
            ("shotgun-master", "Shotgun Master", 75),
            ("shotgun-champion", "Shotgun Champion", 100),
        ],
    },
    Chain {
        metric: Metric::Drink(Stat::PoolGamesWon),
        category: AchievementCategory::Games,
        icon: "circle",
        description: "Win {} pool games total",
        levels: [
            ("pool-rookie", "Pool Rookie", 5),
            ("pool-enthusiast", "Pool Enthusiast", 15),
            ("pool-pro", "Pool Pro", 30),
            ("pool-master", "Pool Master", 50),
            ("pool-champion", "Pool Champion", 75),
        ],
    },
    Chain {
        metric: Metric::Drink(Stat::DartGamesWon),
        category: AchievementCategory::Games,
        icon: "target",
        description: "Win {} dart games total",
        levels: [
            ("dart-rookie", "Dart Rookie", 5),
            ("dart-enthusiast", "Dart Enthusiast", 15),
            ("dart-pro", "Dart Pro", 30),
            ("dart-master", "Dart Master", 50),
            ("dart-champion", "Dart Champion", 75),
        ],
    },
];

struct Single {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    category: AchievementCategory,
    icon: &'static str,
    goal: Option<(Metric, u32)>,
    max_progress: Option<u32>,
}

const SINGLES: &[Single] = &[
    Single {
        id: "first-night-out",
        title: "First Night Out",
        description: "Complete your first night out",
        category: AchievementCategory::Milestones,
        icon: "star",
        goal: Some((Metric::NightsOut, 1)),
        max_progress: None,
    },
    Single {
        id: "weekend-warrior",
        title: "Weekend Warrior",
        description: "Go out on both Friday and Saturday",
        category: AchievementCategory::Nights,
        icon: "calendar",
        goal: None,
        max_progress: None,
    },
    Single {
        id: "bar-hopper",
        title: "Bar Hopper",
        description: "Check in at every bar in town",
        category: AchievementCategory::Bars,
        icon: "shuffle",
        goal: None,
        max_progress: None,
    },
    Single {
        id: "three-bars-night",
        title: "Triple Threat",
        description: "Visit 3 bars in one night",
        category: AchievementCategory::Bars,
        icon: "layers",
        goal: None,
        max_progress: Some(3),
    },
    Single {
        id: "photo-enthusiast",
        title: "Photo Enthusiast",
        description: "Take 10 photos",
        category: AchievementCategory::Activities,
        icon: "camera",
        goal: Some((Metric::PhotosTaken, 10)),
        max_progress: None,
    },
    Single {
        id: "photo-master",
        title: "Photo Master",
        description: "Take 50 photos",
        category: AchievementCategory::Activities,
        icon: "aperture",
        goal: Some((Metric::PhotosTaken, 50)),
        max_progress: None,
    },
    Single {
        id: "karaoke-star",
        title: "Karaoke Star",
        description: "Sing at a karaoke night",
        category: AchievementCategory::Activities,
        icon: "mic",
        goal: None,
        max_progress: None,
    },
    Single {
        id: "trivia-master",
        title: "Trivia Master",
        description: "Win a trivia night",
        category: AchievementCategory::Activities,
        icon: "help-circle",
        goal: None,
        max_progress: None,
    },
    Single {
        id: "pool-shark",
        title: "Pool Shark",
        description: "Win three pool games in a row",
        category: AchievementCategory::Games,
        icon: "award",
        goal: None,
        max_progress: None,
    },
    Single {
        id: "social-butterfly",
        title: "Social Butterfly",
        description: "Add 5 friends",
        category: AchievementCategory::Social,
        icon: "users",
        goal: Some((Metric::Friends, 5)),
        max_progress: None,
    },
    Single {
        id: "conversation-starter",
        title: "Conversation Starter",
        description: "Send your first venue chat message",
        category: AchievementCategory::Social,
        icon: "message-circle",
        goal: None,
        max_progress: None,
    },
    Single {
        id: "group-leader",
        title: "Group Leader",
        description: "Bring a group of friends out",
        category: AchievementCategory::Social,
        icon: "flag",
        goal: None,
        max_progress: None,
    },
    Single {
        id: "trifecta",
        title: "Trifecta",
        description: "Have a beer, a shot and a Scoop & Score in one night",
        category: AchievementCategory::Special,
        icon: "triangle",
        goal: None,
        max_progress: None,
    },
];

/// The full catalog in display order, nothing completed.
#[must_use]
pub fn default_achievements() -> Vec<Achievement> {
    let chains = CHAINS.iter().flat_map(|chain| {
        chain.levels.iter().enumerate().map(move |(index, (id, title, threshold))| Achievement {
            id: AchievementId::new(*id),
            title: (*title).to_owned(),
            description: chain.description.replace("{}", &threshold.to_string()),
            category: chain.category,
            completed: false,
            completed_at: None,
            icon: chain.icon.to_owned(),
            progress: Some(0),
            max_progress: Some(*threshold),
            order: 0,
            level: u8::try_from(index + 1).ok(),
            is_multi_level: true,
            next_level_id: chain
                .levels
                .get(index + 1)
                .map(|(next, _, _)| AchievementId::new(*next)),
        })
    });
    let singles = SINGLES.iter().map(|single| {
        let max_progress = single.goal.map(|(_, goal)| goal).or(single.max_progress);
        Achievement {
            id: AchievementId::new(single.id),
            title: single.title.to_owned(),
            description: single.description.to_owned(),
            category: single.category,
            completed: false,
            completed_at: None,
            icon: single.icon.to_owned(),
            progress: max_progress.map(|_| 0),
            max_progress,
            order: 0,
            level: None,
            is_multi_level: false,
            next_level_id: None,
        }
    });

    chains
        .chain(singles)
        .zip(1..)
        .map(|(mut achievement, order)| {
            achievement.order = order;
            achievement
        })
        .collect()
}

/// Metric and target behind an automatically tracked achievement.
fn goal_for(id: &AchievementId) -> Option<(Metric, u32)> {
    CHAINS
        .iter()
        .find_map(|chain| {
            chain
                .levels
                .iter()
                .find(|(level_id, _, _)| *level_id == id.as_str())
                .map(|(_, _, threshold)| (chain.metric, *threshold))
        })
        .or_else(|| {
            SINGLES
                .iter()
                .find(|s| s.id == id.as_str())
                .and_then(|s| s.goal)
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AchievementState {
    pub achievements: Vec<Achievement>,
    pub popup_shown: bool,
    pub last_popup_date: Option<DateTime<Utc>>,
}

impl Default for AchievementState {
    fn default() -> Self {
        Self {
            achievements: default_achievements(),
            popup_shown: false,
            last_popup_date: None,
        }
    }
}

impl StoreState for AchievementState {
    const KEY: &'static str = "achievement-storage";
}

#[derive(Debug, Clone)]
pub struct AchievementStore {
    ctx: StoreContext,
    state: PersistedStore<AchievementState>,
}

impl AchievementStore {
    pub fn new(ctx: &StoreContext) -> Self {
        let store = Self {
            ctx: ctx.clone(),
            state: ctx.open(),
        };
        store.initialize();
        store
    }

    /// Add catalog entries missing from a saved state.
    pub fn initialize(&self) {
        let missing: Vec<Achievement> = self.state.read(|s| {
            default_achievements()
                .into_iter()
                .filter(|a| !s.achievements.iter().any(|have| have.id == a.id))
                .collect()
        });
        if !missing.is_empty() {
            self.state.update(|s| {
                s.achievements.extend(missing);
                s.achievements.sort_by_key(|a| a.order);
            });
        }
    }

    #[must_use]
    pub fn get(&self) -> AchievementState {
        self.state.get()
    }

    #[must_use]
    pub fn achievements(&self) -> Vec<Achievement> {
        self.state.read(|s| s.achievements.clone())
    }

    #[must_use]
    pub fn find(&self, id: &AchievementId) -> Option<Achievement> {
        self.state.read(|s| s.achievements.iter().find(|a| &a.id == id).cloned())
    }

    /// Complete an achievement by id. Returns `true` if it was newly completed.
    pub fn complete(&self, id: &AchievementId) -> bool {
        let now = self.ctx.now();
        let done = self.state.update(|s| {
            s.achievements
                .iter_mut()
                .find(|a| &a.id == id)
                .is_some_and(|a| a.complete(now))
        });
        if done {
            info!(achievement = %id, "achievement completed");
        }
        done
    }

    /// Set progress; completes when a maximum exists and is reached.
    pub fn update_progress(&self, id: &AchievementId, progress: u32) -> bool {
        let now = self.ctx.now();
        self.state.update(|s| {
            s.achievements
                .iter_mut()
                .find(|a| &a.id == id)
                .is_some_and(|a| a.set_progress(progress, now))
        })
    }

    /// Recompute every counter achievement from lifetime totals.
    ///
    /// Progress is capped at each level's threshold. Returns the ids that
    /// became complete.
    pub fn apply_profile_totals(&self, totals: &ProfileTotals) -> Vec<AchievementId> {
        let now = self.ctx.now();
        let completed = self.state.update(|s| {
            let mut completed = Vec::new();
            for achievement in &mut s.achievements {
                let Some((metric, target)) = goal_for(&achievement.id) else {
                    continue;
                };
                let progress = metric.value(totals).min(target);
                if achievement.set_progress(progress, now) {
                    completed.push(achievement.id.clone());
                }
            }
            completed
        });
        for id in &completed {
            info!(achievement = %id, "achievement completed");
        }
        completed
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.state.read(|s| s.achievements.iter().filter(|a| a.completed).count())
    }

    #[must_use]
    pub fn by_category(&self, category: AchievementCategory) -> Vec<Achievement> {
        self.state.read(|s| {
            s.achievements
                .iter()
                .filter(|a| a.category == category)
                .cloned()
                .collect()
        })
    }

    /// Back to the untouched catalog with popup flags cleared.
    pub fn reset(&self) {
        self.state.replace(AchievementState::default());
    }

    #[must_use]
    pub fn should_show_popup(&self) -> bool {
        self.state
            .read(|s| !s.popup_shown && s.achievements.iter().any(|a| !a.completed))
    }

    pub fn mark_popup_shown(&self) {
        self.state.update(|s| s.popup_shown = true);
    }

    /// The end-of-night prompt: during the 3 AM hour, once per calendar day.
    #[must_use]
    pub fn should_show_3am_popup(&self) -> bool {
        if self.ctx.clock.local_now().hour() != 3 {
            return false;
        }
        let last = self.state.read(|s| s.last_popup_date);
        OncePerDay::new(DayBoundary::MIDNIGHT).permits(last, self.ctx.now(), &self.ctx.offset())
    }

    pub fn mark_3am_popup_shown(&self) {
        let now = self.ctx.now();
        self.state.update(|s| {
            s.popup_shown = true;
            s.last_popup_date = Some(now);
        });
    }

    pub async fn flush(&self) {
        self.state.flush().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::remote::DemoRemote;
    use crate::testing;

    fn id(s: &str) -> AchievementId {
        AchievementId::new(s)
    }

    #[test]
    fn test_catalog_shape() {
        let catalog = default_achievements();
        assert_eq!(catalog.len(), CHAINS.len() * 5 + SINGLES.len());

        let explorer = catalog.iter().find(|a| a.id == id("bar-explorer")).unwrap();
        assert_eq!(explorer.description, "Visit 5 different bars total");
        assert_eq!(explorer.level, Some(1));
        assert_eq!(explorer.next_level_id, Some(id("bar-adventurer")));

        let legend = catalog.iter().find(|a| a.id == id("bar-legend")).unwrap();
        assert_eq!(legend.next_level_id, None);
        assert_eq!(legend.max_progress, Some(100));

        let orders: Vec<_> = catalog.iter().map(|a| a.order).collect();
        assert!(orders.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_apply_totals_completes_levels_once() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 22, 0, 0).unwrap();
        let (ctx, clock) = testing::context(Arc::new(DemoRemote), now);
        let store = AchievementStore::new(&ctx);

        let totals = ProfileTotals {
            bars_hit: 16,
            nights_out: 1,
            ..ProfileTotals::default()
        };
        let completed = store.apply_profile_totals(&totals);
        assert!(completed.contains(&id("bar-explorer")));
        assert!(completed.contains(&id("bar-adventurer")));
        assert!(completed.contains(&id("first-night-out")));
        assert!(!completed.contains(&id("bar-enthusiast")));

        let enthusiast = store.find(&id("bar-enthusiast")).unwrap();
        assert_eq!(enthusiast.progress, Some(16));
        assert_eq!(store.find(&id("bar-explorer")).unwrap().progress, Some(5));

        clock.advance(TimeDelta::hours(1));
        assert!(store.apply_profile_totals(&totals).is_empty());
        assert_eq!(store.find(&id("bar-explorer")).unwrap().completed_at, Some(now));
    }

    #[tokio::test]
    async fn test_drink_chains_follow_counts() {
        let (ctx, _) = testing::context(Arc::new(DemoRemote), Utc::now());
        let store = AchievementStore::new(&ctx);
        let mut counts = DrinkCounts::default();
        counts.beers = 12;
        counts.pool_games_won = 5;
        let completed = store.apply_profile_totals(&ProfileTotals {
            counts,
            ..ProfileTotals::default()
        });
        assert!(completed.contains(&id("beer-beginner")));
        assert!(completed.contains(&id("pool-rookie")));
        assert_eq!(completed.len(), 2);
    }

    #[tokio::test]
    async fn test_manual_complete_and_progress() {
        let (ctx, _) = testing::context(Arc::new(DemoRemote), Utc::now());
        let store = AchievementStore::new(&ctx);
        assert!(store.complete(&id("karaoke-star")));
        assert!(!store.complete(&id("karaoke-star")));
        assert!(!store.complete(&id("no-such-thing")));

        assert!(!store.update_progress(&id("three-bars-night"), 2));
        assert!(store.update_progress(&id("three-bars-night"), 3));
        assert_eq!(store.completed_count(), 2);

        store.reset();
        assert_eq!(store.completed_count(), 0);
    }

    #[tokio::test]
    async fn test_popup_flags() {
        let (ctx, _) = testing::context(Arc::new(DemoRemote), Utc::now());
        let store = AchievementStore::new(&ctx);
        assert!(store.should_show_popup());
        store.mark_popup_shown();
        assert!(!store.should_show_popup());
    }

    #[tokio::test]
    async fn test_3am_popup_once_per_day() {
        let two_am = Utc.with_ymd_and_hms(2026, 10, 18, 2, 30, 0).unwrap();
        let (ctx, clock) = testing::context(Arc::new(DemoRemote), two_am);
        let store = AchievementStore::new(&ctx);
        assert!(!store.should_show_3am_popup());

        clock.advance(TimeDelta::minutes(45));
        assert!(store.should_show_3am_popup());
        store.mark_3am_popup_shown();
        assert!(!store.should_show_3am_popup());

        clock.advance(TimeDelta::days(1));
        assert!(store.should_show_3am_popup());
    }
}
