//! Core types for BarBuddy.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod day;
pub mod email;
pub mod id;
pub mod rank;
pub mod rating;
pub mod stats;
pub mod status;
pub mod venue;

pub use day::{DayBoundary, OncePerDay, session_sweep_cutoff};
pub use email::{Email, EmailError};
pub use id::*;
pub use rank::{RankTier, XpActivityKind, XpRank};
pub use rating::{DrunkScaleRating, RatingError, average_rating};
pub use stats::{DailyStats, DrinkCounts, Stat};
pub use status::*;
pub use venue::*;
