use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::StoreContext;
use crate::store::{PersistedStore, StoreState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgeVerification {
    pub is_verified: bool,
    pub verification_date: Option<DateTime<Utc>>,
}

impl StoreState for AgeVerification {
    const KEY: &'static str = "age-verification-storage";
}

/// Records that the user confirmed they are of drinking age.
#[derive(Debug, Clone)]
pub struct AgeVerificationStore {
    ctx: StoreContext,
    state: PersistedStore<AgeVerification>,
}

impl AgeVerificationStore {
    pub fn new(ctx: &StoreContext) -> Self {
        Self {
            ctx: ctx.clone(),
            state: ctx.open(),
        }
    }

    #[must_use]
    pub fn get(&self) -> AgeVerification {
        self.state.get()
    }

    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.state.read(|s| s.is_verified)
    }

    /// Set the flag; the date is stamped when verified and cleared otherwise.
    pub fn set_verified(&self, verified: bool) {
        let date = verified.then(|| self.ctx.now());
        self.state.update(|s| {
            s.is_verified = verified;
            s.verification_date = date;
        });
        info!(verified, "age verification updated");
    }

    pub async fn flush(&self) {
        self.state.flush().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::remote::DemoRemote;
    use crate::testing;

    #[tokio::test]
    async fn test_set_and_clear() {
        let now = Utc::now();
        let (ctx, _) = testing::context(Arc::new(DemoRemote), now);
        let store = AgeVerificationStore::new(&ctx);
        assert!(!store.is_verified());

        store.set_verified(true);
        assert!(store.is_verified());
        assert_eq!(store.get().verification_date, Some(now));

        store.set_verified(false);
        assert_eq!(store.get(), AgeVerification::default());
    }
}
