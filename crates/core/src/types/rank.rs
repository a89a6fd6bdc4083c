//! Rank computation.
//!
//! Two independent ladders exist. [`RankTier`] is derived from the average
//! drunk-scale rating and is what the profile badge shows. [`XpRank`] is the
//! 20-step experience ladder fed by [`XpActivityKind`] awards.

use serde::{Deserialize, Serialize};

/// Badge tier derived from the average drunk-scale rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankTier {
    SoberStar,
    BuzzedBeginner,
    TipsyTalent,
    BigChocolate,
}

impl RankTier {
    /// Map an average rating (0 when nothing is recorded) to its tier.
    ///
    /// Thresholds are fixed: `< 3.01`, `< 5.51`, `< 8.5`, and the rest.
    /// Non-finite input lands in the first tier.
    #[must_use]
    pub fn from_average(average: f64) -> Self {
        if average.is_nan() || average < 3.01 {
            Self::SoberStar
        } else if average < 5.51 {
            Self::BuzzedBeginner
        } else if average < 8.5 {
            Self::TipsyTalent
        } else {
            Self::BigChocolate
        }
    }

    /// 1-based tier number.
    #[must_use]
    pub const fn tier(self) -> u8 {
        match self {
            Self::SoberStar => 1,
            Self::BuzzedBeginner => 2,
            Self::TipsyTalent => 3,
            Self::BigChocolate => 4,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::SoberStar => "Sober Star",
            Self::BuzzedBeginner => "Buzzed Beginner",
            Self::TipsyTalent => "Tipsy Talent",
            Self::BigChocolate => "Big Chocolate",
        }
    }

    /// Hex display color.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::SoberStar => "#4CAF50",
            Self::BuzzedBeginner => "#FFC107",
            Self::TipsyTalent => "#FF9800",
            Self::BigChocolate => "#FF5722",
        }
    }
}

impl std::fmt::Display for RankTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Something worth experience points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpActivityKind {
    VisitNewBar,
    ParticipateEvent,
    BringFriend,
    CompleteNightOut,
    SpecialAchievement,
    LiveMusic,
    FeaturedDrink,
    BarGame,
    PhotoTaken,
    Shots,
    ScoopAndScores,
    Beers,
    BeerTowers,
    Funnels,
    Shotguns,
    PoolGames,
    DartGames,
}

impl XpActivityKind {
    /// XP granted per occurrence.
    #[must_use]
    pub const fn xp(self) -> u32 {
        match self {
            Self::VisitNewBar => 25,
            Self::ParticipateEvent => 50,
            Self::BringFriend => 30,
            Self::CompleteNightOut => 100,
            Self::SpecialAchievement => 75,
            Self::LiveMusic => 40,
            Self::FeaturedDrink => 20,
            Self::BarGame => 35,
            Self::PhotoTaken => 10,
            Self::Shots | Self::BeerTowers => 5,
            Self::ScoopAndScores => 4,
            Self::Beers => 2,
            Self::Funnels | Self::Shotguns => 3,
            Self::PoolGames | Self::DartGames => 10,
        }
    }
}

const XP_PER_RANK: u32 = 125;

const LADDER_TITLES: [(&str, &str); 5] = [
    ("Sober Star", "#4CAF50"),
    ("Buzzed Beginner", "#FFC107"),
    ("Tipsy Talent", "#FF9800"),
    ("Big Chocolate", "#FF5722"),
    ("Scoop & Score Champ", "#9C27B0"),
];

const LADDER_SUBTITLES: [[&str; 4]; 5] = [
    ["Newcomer", "Explorer", "Enthusiast", "Rising Star"],
    ["Novice", "Adventurer", "Socializer", "Party Starter"],
    ["Local Hero", "Crowd Pleaser", "Nightlife Navigator", "Star of the Scene"],
    ["Legend", "Icon", "Elite", "Master of the Night"],
    ["Champion", "MVP", "Hall of Famer", "Ultimate Legend"],
];

/// One step of the XP ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XpRank {
    /// 1..=5
    pub tier: u8,
    /// 1..=4 within the tier
    pub sub_rank: u8,
    pub title: &'static str,
    pub sub_title: &'static str,
    pub color: &'static str,
    pub min_xp: u32,
    pub max_xp: u32,
}

impl XpRank {
    /// Number of steps on the ladder.
    pub const COUNT: usize = 20;

    fn at(index: usize) -> Self {
        let index = index.min(Self::COUNT - 1);
        let (tier, sub) = (index / 4, index % 4);
        let (title, color) = LADDER_TITLES.get(tier).copied().unwrap_or(("", ""));
        let sub_title = LADDER_SUBTITLES
            .get(tier)
            .and_then(|subs| subs.get(sub))
            .copied()
            .unwrap_or_default();
        let step = u32::try_from(index).unwrap_or(0);
        Self {
            tier: u8::try_from(tier + 1).unwrap_or(u8::MAX),
            sub_rank: u8::try_from(sub + 1).unwrap_or(u8::MAX),
            title,
            sub_title,
            color,
            min_xp: if step == 0 { 0 } else { step * XP_PER_RANK + 1 },
            max_xp: (step + 1) * XP_PER_RANK,
        }
    }

    /// Every step, lowest first.
    #[must_use]
    pub fn ladder() -> Vec<Self> {
        (0..Self::COUNT).map(Self::at).collect()
    }

    /// The highest step whose minimum is at or below `xp`.
    #[must_use]
    pub fn for_xp(xp: u32) -> Self {
        Self::at(Self::index_for(xp))
    }

    fn index_for(xp: u32) -> usize {
        (0..Self::COUNT)
            .rev()
            .find(|i| xp >= Self::at(*i).min_xp)
            .unwrap_or(0)
    }

    /// XP at which the next step starts, or this step's maximum at the top.
    #[must_use]
    pub fn xp_for_next(xp: u32) -> u32 {
        let index = Self::index_for(xp);
        if index + 1 < Self::COUNT {
            Self::at(index + 1).min_xp
        } else {
            Self::at(index).max_xp
        }
    }

    /// Percent progress from this step's minimum to the next step, 0..=100.
    #[must_use]
    pub fn progress_to_next(xp: u32) -> f64 {
        let current = Self::for_xp(xp);
        let next = Self::xp_for_next(xp);
        if next == current.max_xp {
            return 100.0;
        }
        let span = f64::from(next - current.min_xp);
        let progress = f64::from(xp.saturating_sub(current.min_xp)) / span * 100.0;
        progress.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::rating::{DrunkScaleRating, average_rating};

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RankTier::from_average(0.0), RankTier::SoberStar);
        assert_eq!(RankTier::from_average(3.0), RankTier::SoberStar);
        assert_eq!(RankTier::from_average(3.01), RankTier::BuzzedBeginner);
        assert_eq!(RankTier::from_average(5.5), RankTier::BuzzedBeginner);
        assert_eq!(RankTier::from_average(5.51), RankTier::TipsyTalent);
        assert_eq!(RankTier::from_average(8.49), RankTier::TipsyTalent);
        assert_eq!(RankTier::from_average(8.5), RankTier::BigChocolate);
        assert_eq!(RankTier::from_average(10.0), RankTier::BigChocolate);
    }

    #[test]
    fn test_tiers_monotonic_over_range() {
        let mut previous = RankTier::SoberStar;
        for step in 0..=1000 {
            let average = f64::from(step) / 100.0;
            let tier = RankTier::from_average(average);
            assert!(tier >= previous, "tier dropped at {average}");
            previous = tier;
        }
        assert_eq!(previous, RankTier::BigChocolate);
    }

    #[test]
    fn test_ratings_scenario() {
        let mut ratings: Vec<_> = [2, 4]
            .into_iter()
            .map(|v| DrunkScaleRating::new(v).unwrap())
            .collect();
        let average = average_rating(&ratings);
        assert!((average - 3.0).abs() < f64::EPSILON);
        assert_eq!(RankTier::from_average(average).tier(), 1);

        ratings.push(DrunkScaleRating::new(9).unwrap());
        let average = average_rating(&ratings);
        assert!((average - 5.0).abs() < f64::EPSILON);
        assert_eq!(RankTier::from_average(average).tier(), 2);
    }

    #[test]
    fn test_ladder_shape() {
        let ladder = XpRank::ladder();
        assert_eq!(ladder.len(), 20);
        assert_eq!(ladder[0].min_xp, 0);
        assert_eq!(ladder[0].max_xp, 125);
        assert_eq!(ladder[1].min_xp, 126);
        assert_eq!(ladder[19].max_xp, 2500);
        assert_eq!(ladder[19].sub_title, "Ultimate Legend");
        assert_eq!(ladder[4].title, "Buzzed Beginner");
        assert_eq!(ladder[4].sub_title, "Novice");
    }

    #[test]
    fn test_xp_lookup_and_progress() {
        assert_eq!(XpRank::for_xp(0).sub_title, "Newcomer");
        assert_eq!(XpRank::for_xp(125).sub_title, "Newcomer");
        assert_eq!(XpRank::for_xp(126).sub_title, "Explorer");
        assert_eq!(XpRank::xp_for_next(0), 126);
        assert!((XpRank::progress_to_next(63) - 50.0).abs() < 1.0);
        assert_eq!(XpRank::for_xp(9999).tier, 5);
        assert!((XpRank::progress_to_next(9999) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_xp_values() {
        assert_eq!(XpActivityKind::CompleteNightOut.xp(), 100);
        assert_eq!(XpActivityKind::VisitNewBar.xp(), 25);
        assert_eq!(XpActivityKind::Beers.xp(), 2);
        assert_eq!(
            serde_json::to_value(XpActivityKind::ScoopAndScores).unwrap(),
            "scoop_and_scores"
        );
    }
}
