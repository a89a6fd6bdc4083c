use barbuddy_core::PhotoId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::StoreContext;
use crate::store::{PersistedStore, StoreState};

/// A photo taken in the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraPhoto {
    pub id: PhotoId,
    pub uri: String,
    pub timestamp: DateTime<Utc>,
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct CameraRoll {
    photos: Vec<CameraPhoto>,
}

impl StoreState for CameraRoll {
    const KEY: &'static str = "camera-roll-storage";
}

/// Photos, newest first.
#[derive(Debug, Clone)]
pub struct CameraRollStore {
    ctx: StoreContext,
    state: PersistedStore<CameraRoll>,
}

impl CameraRollStore {
    pub fn new(ctx: &StoreContext) -> Self {
        Self {
            ctx: ctx.clone(),
            state: ctx.open(),
        }
    }

    /// Record a new photo at the front of the roll.
    pub fn add_photo(&self, uri: impl Into<String>) -> CameraPhoto {
        let timestamp = self.ctx.now();
        let photo = CameraPhoto {
            id: PhotoId::new(uuid::Uuid::new_v4().to_string()),
            uri: uri.into(),
            timestamp,
            filename: format!("barbuddy_{}.jpg", timestamp.timestamp_millis()),
        };
        self.state.update(|s| s.photos.insert(0, photo.clone()));
        debug!(photo_id = %photo.id, "photo added");
        photo
    }

    /// Remove the photo with `id`. Returns `false` if no photo matched.
    pub fn remove_photo(&self, id: &PhotoId) -> bool {
        self.state.update(|s| {
            s.photos
                .iter()
                .position(|p| &p.id == id)
                .map(|index| s.photos.remove(index))
                .is_some()
        })
    }

    pub fn clear_all_photos(&self) {
        self.state.update(|s| s.photos.clear());
    }

    #[must_use]
    pub fn photos(&self) -> Vec<CameraPhoto> {
        self.state.read(|s| s.photos.clone())
    }

    #[must_use]
    pub fn photo_count(&self) -> usize {
        self.state.read(|s| s.photos.len())
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

    #[tokio::test]
    async fn test_add_prepends_with_filename() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 23, 0, 0).unwrap();
        let (ctx, clock) = testing::context(Arc::new(DemoRemote), now);
        let store = CameraRollStore::new(&ctx);

        let first = store.add_photo("file:///a.jpg");
        clock.advance(TimeDelta::seconds(1));
        let second = store.add_photo("file:///b.jpg");

        assert_ne!(first.id, second.id);
        assert_eq!(first.filename, format!("barbuddy_{}.jpg", now.timestamp_millis()));
        let photos = store.photos();
        assert_eq!(photos[0], second);
        assert_eq!(photos[1], first);
    }

    #[tokio::test]
    async fn test_remove_exactly_one_then_clear() {
        let (ctx, _) = testing::context(Arc::new(DemoRemote), Utc::now());
        let store = CameraRollStore::new(&ctx);
        let photos: Vec<_> = (0..3).map(|i| store.add_photo(format!("file:///{i}.jpg"))).collect();

        assert!(store.remove_photo(&photos[1].id));
        assert_eq!(store.photo_count(), 2);
        assert!(store.photos().iter().all(|p| p.id != photos[1].id));
        assert!(!store.remove_photo(&PhotoId::new("missing")));
        assert_eq!(store.photo_count(), 2);

        store.clear_all_photos();
        assert_eq!(store.photo_count(), 0);
    }
}
