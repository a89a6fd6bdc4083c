use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreContext;
use crate::store::{PersistedStore, StoreState};

/// Cartoon avatar settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Avatar {
    pub skin_tone: String,
    pub hair_type: String,
    pub hair_color: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for Avatar {
    fn default() -> Self {
        Self {
            skin_tone: "#FFE0BD".to_owned(),
            hair_type: "short".to_owned(),
            hair_color: "#000000".to_owned(),
            last_updated: None,
        }
    }
}

impl StoreState for Avatar {
    const KEY: &'static str = "avatar-storage";
}

#[derive(Debug, Clone)]
pub struct AvatarStore {
    ctx: StoreContext,
    state: PersistedStore<Avatar>,
}

impl AvatarStore {
    pub fn new(ctx: &StoreContext) -> Self {
        Self {
            ctx: ctx.clone(),
            state: ctx.open(),
        }
    }

    #[must_use]
    pub fn get(&self) -> Avatar {
        self.state.get()
    }

    pub fn set_skin_tone(&self, tone: impl Into<String>) {
        let tone = tone.into();
        self.state.update(|s| s.skin_tone = tone);
    }

    pub fn set_hair_type(&self, hair_type: impl Into<String>) {
        let hair_type = hair_type.into();
        self.state.update(|s| s.hair_type = hair_type);
    }

    pub fn set_hair_color(&self, color: impl Into<String>) {
        let color = color.into();
        self.state.update(|s| s.hair_color = color);
    }

    /// Stamp the avatar as saved.
    pub fn save_avatar(&self) -> DateTime<Utc> {
        let now = self.ctx.now();
        self.state.update(|s| s.last_updated = Some(now));
        now
    }

    pub fn reset_avatar(&self) {
        self.state.replace(Avatar::default());
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
    use crate::testing;

    #[tokio::test]
    async fn test_edit_save_reset() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 21, 0, 0).unwrap();
        let (ctx, _) = testing::context(Arc::new(DemoRemote), now);
        let store = AvatarStore::new(&ctx);
        assert_eq!(store.get(), Avatar::default());

        store.set_hair_color("#8B4513");
        store.set_hair_type("curly");
        assert_eq!(store.save_avatar(), now);
        let avatar = store.get();
        assert_eq!(avatar.hair_color, "#8B4513");
        assert_eq!(avatar.last_updated, Some(now));

        store.reset_avatar();
        assert_eq!(store.get().hair_type, "short");
        assert_eq!(store.get().last_updated, None);
    }
}
