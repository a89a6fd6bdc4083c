//! Test doubles: a settable clock and scripted remotes.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for the integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, TimeDelta, Utc};
use serde_json::Value;

use crate::clock::Clock;
use crate::remote::{Endpoint, Remote, RemoteError};
use crate::storage::{MemoryStorage, Storage};
use crate::stores::StoreContext;
use crate::sync::SyncQueue;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    offset: FixedOffset,
}

impl ManualClock {
    /// Clock in UTC.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    #[must_use]
    pub const fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Mutex::new(now),
            offset,
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// A call seen by [`RecordingRemote`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub payload: Value,
    pub is_query: bool,
}

/// Remote that records every call and answers queries from a script.
///
/// Mutations succeed with `null`. Queries return the scripted response for
/// the endpoint, or `DemoMode` when nothing is scripted.
#[derive(Debug, Default)]
pub struct RecordingRemote {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<Endpoint, Value>>,
}

impl RecordingRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries to `endpoint` with `response`.
    pub fn respond(&self, endpoint: Endpoint, response: Value) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(endpoint, response);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn mutations(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| !c.is_query).collect()
    }

    #[must_use]
    pub fn queries(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.is_query).collect()
    }

    /// Mutations sent to `endpoint`.
    #[must_use]
    pub fn mutations_to(&self, endpoint: Endpoint) -> Vec<Value> {
        self.mutations()
            .into_iter()
            .filter(|c| c.endpoint == endpoint)
            .map(|c| c.payload)
            .collect()
    }

    fn record(&self, endpoint: &Endpoint, payload: &Value, is_query: bool) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                endpoint: *endpoint,
                payload: payload.clone(),
                is_query,
            });
    }
}

#[async_trait]
impl Remote for RecordingRemote {
    async fn mutate(&self, endpoint: &Endpoint, payload: &Value) -> Result<Value, RemoteError> {
        self.record(endpoint, payload, false);
        Ok(Value::Null)
    }

    async fn query(&self, endpoint: &Endpoint, params: &Value) -> Result<Value, RemoteError> {
        self.record(endpoint, params, true);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(endpoint)
            .cloned()
            .ok_or(RemoteError::DemoMode)
    }
}

/// Remote that rejects everything with a server error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRemote;

impl FailingRemote {
    fn error() -> RemoteError {
        RemoteError::Status {
            status: 503,
            body: "service unavailable".to_owned(),
        }
    }
}

#[async_trait]
impl Remote for FailingRemote {
    async fn mutate(&self, _endpoint: &Endpoint, _payload: &Value) -> Result<Value, RemoteError> {
        Err(Self::error())
    }

    async fn query(&self, _endpoint: &Endpoint, _params: &Value) -> Result<Value, RemoteError> {
        Err(Self::error())
    }
}

/// Context over in-memory storage and a manual clock.
///
/// Must be called from within a Tokio runtime.
pub fn context(remote: Arc<dyn Remote>, now: DateTime<Utc>) -> (StoreContext, Arc<ManualClock>) {
    context_with_storage(Arc::new(MemoryStorage::new()), remote, now)
}

/// Like [`context`] but over the given storage.
pub fn context_with_storage(
    storage: Arc<dyn Storage>,
    remote: Arc<dyn Remote>,
    now: DateTime<Utc>,
) -> (StoreContext, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    let ctx = StoreContext {
        storage,
        sync: SyncQueue::start(Arc::clone(&remote)),
        remote,
        clock: clock.clone(),
    };
    (ctx, clock)
}
