//! BarBuddy Core - Shared types library.
//!
//! This crate provides the domain types used across all BarBuddy components:
//! - `client` - Persisted stores, remote sync and the venue fixture
//! - `cli` - Command-line front end driving the stores
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage,
//! no HTTP clients. Everything here is deterministic given its inputs, which
//! is why the day-boundary and rank logic live here rather than in the stores.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email, ratings, counters, day boundaries, ranks
//!   and venue records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
