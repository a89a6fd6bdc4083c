use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::StoreContext;
use crate::store::{PersistedStore, StoreState};

/// Version recorded when the caller does not name one.
pub const CURRENT_TERMS_VERSION: &str = "1.0";

const USER_AGENT: &str = "BarBuddy Mobile App";

/// Proof of acceptance kept for the legal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsAcceptance {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
    pub accepted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TermsState {
    pub has_accepted_terms: bool,
    pub terms_acceptance: Option<TermsAcceptance>,
}

impl StoreState for TermsState {
    const KEY: &'static str = "terms-storage";
}

#[derive(Debug, Clone)]
pub struct TermsStore {
    ctx: StoreContext,
    state: PersistedStore<TermsState>,
}

impl TermsStore {
    pub fn new(ctx: &StoreContext) -> Self {
        Self {
            ctx: ctx.clone(),
            state: ctx.open(),
        }
    }

    /// Accept `version` (default [`CURRENT_TERMS_VERSION`]) and return the record.
    pub fn accept_terms(&self, version: Option<&str>) -> TermsAcceptance {
        let record = TermsAcceptance {
            version: version.unwrap_or(CURRENT_TERMS_VERSION).to_owned(),
            timestamp: self.ctx.now(),
            user_agent: USER_AGENT.to_owned(),
            accepted: true,
        };
        self.state.update(|s| {
            s.has_accepted_terms = true;
            s.terms_acceptance = Some(record.clone());
        });
        info!(version = %record.version, "terms accepted");
        record
    }

    #[must_use]
    pub fn has_accepted_terms(&self) -> bool {
        self.state.read(|s| s.has_accepted_terms)
    }

    #[must_use]
    pub fn acceptance_record(&self) -> Option<TermsAcceptance> {
        self.state.read(|s| s.terms_acceptance.clone())
    }

    pub async fn flush(&self) {
        self.state.flush().await;
    }
}
