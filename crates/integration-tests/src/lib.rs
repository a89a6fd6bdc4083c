//! Integration tests for the BarBuddy client core.
//!
//! Tests drive a full [`AppState`] over real files in a temporary
//! directory, a scripted remote and a manual clock.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p barbuddy-integration-tests
//! ```

use std::path::Path;
use std::sync::Arc;

use barbuddy_client::remote::Remote;
use barbuddy_client::storage::FileStorage;
use barbuddy_client::testing::{self, ManualClock};
use barbuddy_client::{AppState, ClientConfig};
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

/// An app over a temporary data directory.
pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    dir: TempDir,
}

impl TestApp {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn new(remote: Arc<dyn Remote>, now: DateTime<Utc>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let (state, clock) = open(dir.path(), remote, now);
        Self { state, clock, dir }
    }

    /// Flush, then open a second app over the same directory.
    pub async fn restart(self, remote: Arc<dyn Remote>) -> Self {
        let now = self.state.context().now();
        self.state.shutdown().await;
        let (state, clock) = open(self.dir.path(), remote, now);
        Self {
            state,
            clock,
            dir: self.dir,
        }
    }
}

#[allow(clippy::unwrap_used)]
fn open(dir: &Path, remote: Arc<dyn Remote>, now: DateTime<Utc>) -> (AppState, Arc<ManualClock>) {
    let storage = Arc::new(FileStorage::open(dir).unwrap());
    let (ctx, clock) = testing::context_with_storage(storage, remote, now);
    (AppState::from_parts(ClientConfig::demo(dir), ctx), clock)
}

/// A UTC instant.
///
/// # Panics
///
/// Panics on an invalid date.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}
