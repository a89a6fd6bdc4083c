//! BarBuddy client core.
//!
//! Offline-first state for the BarBuddy app. Every store persists locally
//! and pushes changes to the backend in the background; a failed push is
//! logged and never rolls local state back.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod clock;
pub mod config;
pub mod error;
pub mod poller;
pub mod remote;
pub mod state;
pub mod storage;
pub mod store;
pub mod stores;
pub mod sync;
pub mod venues;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{BackendConfig, ClientConfig, ConfigError};
pub use error::{ClientError, Result};
pub use state::AppState;
