//! Drink and game counters tracked per nightlife day and over a lifetime.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::rank::XpActivityKind;
use super::rating::DrunkScaleRating;

/// One tracked counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stat {
    Shots,
    ScoopAndScores,
    Beers,
    BeerTowers,
    Funnels,
    Shotguns,
    PoolGamesWon,
    DartGamesWon,
}

impl Stat {
    /// Every counter, in display order.
    pub const ALL: [Self; 8] = [
        Self::Shots,
        Self::ScoopAndScores,
        Self::Beers,
        Self::BeerTowers,
        Self::Funnels,
        Self::Shotguns,
        Self::PoolGamesWon,
        Self::DartGamesWon,
    ];

    /// Stable kebab-case name, also accepted by [`std::str::FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shots => "shots",
            Self::ScoopAndScores => "scoop-and-scores",
            Self::Beers => "beers",
            Self::BeerTowers => "beer-towers",
            Self::Funnels => "funnels",
            Self::Shotguns => "shotguns",
            Self::PoolGamesWon => "pool-games-won",
            Self::DartGamesWon => "dart-games-won",
        }
    }

    /// The XP activity awarded per unit of this counter.
    #[must_use]
    pub const fn xp_kind(self) -> XpActivityKind {
        match self {
            Self::Shots => XpActivityKind::Shots,
            Self::ScoopAndScores => XpActivityKind::ScoopAndScores,
            Self::Beers => XpActivityKind::Beers,
            Self::BeerTowers => XpActivityKind::BeerTowers,
            Self::Funnels => XpActivityKind::Funnels,
            Self::Shotguns => XpActivityKind::Shotguns,
            Self::PoolGamesWon => XpActivityKind::PoolGames,
            Self::DartGamesWon => XpActivityKind::DartGames,
        }
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stat| stat.as_str() == s)
            .ok_or_else(|| format!("invalid stat: {s}"))
    }
}

/// A full set of counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrinkCounts {
    pub shots: u32,
    pub scoop_and_scores: u32,
    pub beers: u32,
    pub beer_towers: u32,
    pub funnels: u32,
    pub shotguns: u32,
    pub pool_games_won: u32,
    pub dart_games_won: u32,
}

impl DrinkCounts {
    /// Read one counter.
    #[must_use]
    pub const fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Shots => self.shots,
            Stat::ScoopAndScores => self.scoop_and_scores,
            Stat::Beers => self.beers,
            Stat::BeerTowers => self.beer_towers,
            Stat::Funnels => self.funnels,
            Stat::Shotguns => self.shotguns,
            Stat::PoolGamesWon => self.pool_games_won,
            Stat::DartGamesWon => self.dart_games_won,
        }
    }

    /// Mutable access to one counter.
    pub const fn get_mut(&mut self, stat: Stat) -> &mut u32 {
        match stat {
            Stat::Shots => &mut self.shots,
            Stat::ScoopAndScores => &mut self.scoop_and_scores,
            Stat::Beers => &mut self.beers,
            Stat::BeerTowers => &mut self.beer_towers,
            Stat::Funnels => &mut self.funnels,
            Stat::Shotguns => &mut self.shotguns,
            Stat::PoolGamesWon => &mut self.pool_games_won,
            Stat::DartGamesWon => &mut self.dart_games_won,
        }
    }

    /// Sum of every counter.
    #[must_use]
    pub fn total(&self) -> u32 {
        Stat::ALL.into_iter().map(|stat| self.get(stat)).sum()
    }

    /// Per-counter `self - earlier`, floored at zero.
    #[must_use]
    pub fn saturating_sub(&self, earlier: &Self) -> Self {
        let mut out = Self::default();
        for stat in Stat::ALL {
            *out.get_mut(stat) = self.get(stat).saturating_sub(earlier.get(stat));
        }
        out
    }

    /// Per-counter addition, saturating at `u32::MAX`.
    pub fn add_assign_saturating(&mut self, other: &Self) {
        for stat in Stat::ALL {
            let slot = self.get_mut(stat);
            *slot = slot.saturating_add(other.get(stat));
        }
    }
}

/// Counters for one nightlife day plus the optional rating of that night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// The nightlife day these counters belong to.
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: DrinkCounts,
    #[serde(default)]
    pub drunk_scale: Option<DrunkScaleRating>,
}

impl DailyStats {
    /// Empty counters for `date`.
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            counts: DrinkCounts::default(),
            drunk_scale: None,
        }
    }
}
