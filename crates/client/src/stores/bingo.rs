//! Nightlife bingo card.

use barbuddy_core::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::StoreContext;
use super::profile::ProfileStore;
use crate::remote::{Endpoint, Procedure, Table};
use crate::store::{PersistedStore, StoreState};

/// `(id, title, description, emoji)` for every square on the card.
const CARD: [(&str, &str, &str, &str); 9] = [
    ("shots-late-nite", "Took shots at Late Nite", "Get lit at the hottest club", "\u{1F943}"),
    ("dart-bird", "Smoked a dart at The Bird", "Step outside for a quick break", "\u{1F6AC}"),
    ("pool-jba", "Played pool at JBA", "Show off your skills", "\u{1F3B1}"),
    ("three-bars", "Went to 3 bars in one night", "Bar hop like a pro", "\u{1F37B}"),
    ("group-shot-cashmans", "Took a group shot at Cashmans", "Cheers with the crew", "\u{1F4F8}"),
    ("drink-grants", "Got a drink at Grants", "Visit the legendary venue", "\u{1F37A}"),
    ("bathroom-selfie", "Took a selfie in a bathroom", "Classic nightlife moment", "\u{1F933}"),
    ("beer-library", "Drank a beer at The Library", "Study up on good times", "\u{1F4DA}"),
    ("surprise-drink", "Asked bartender for surprise drink", "Live dangerously", "\u{1F3B2}"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BingoTask {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub emoji: String,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

fn fresh_card() -> Vec<BingoTask> {
    CARD.iter()
        .map(|&(id, title, description, emoji)| BingoTask {
            id: TaskId::new(id),
            title: title.to_owned(),
            description: description.to_owned(),
            emoji: emoji.to_owned(),
            completed: false,
            completed_at: None,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BingoState {
    pub tasks: Vec<BingoTask>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StoreState for BingoState {
    const KEY: &'static str = "bingo-storage";
}

impl BingoState {
    fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Mark the card done the first time every square is checked.
    fn settle(&mut self, now: DateTime<Utc>) -> bool {
        let full = !self.tasks.is_empty() && self.completed_count() == CARD.len();
        let newly = full && !self.is_completed;
        if newly {
            self.is_completed = true;
            self.completed_at.get_or_insert(now);
        }
        newly
    }
}

#[derive(Debug, Deserialize)]
struct CompletionRow {
    task_id: TaskId,
    completed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CardCompletionRow {
    completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BingoStore {
    ctx: StoreContext,
    state: PersistedStore<BingoState>,
    profile: ProfileStore,
}

impl BingoStore {
    pub fn new(ctx: &StoreContext, profile: ProfileStore) -> Self {
        let store = Self {
            ctx: ctx.clone(),
            state: ctx.open(),
            profile,
        };
        store.initialize_tasks();
        store
    }

    /// Fill an empty card with the nine squares.
    pub fn initialize_tasks(&self) {
        self.state.update(|s| {
            if s.tasks.is_empty() {
                s.tasks = fresh_card();
            }
        });
    }

    #[must_use]
    pub fn get(&self) -> BingoState {
        self.state.get()
    }

    #[must_use]
    pub fn tasks(&self) -> Vec<BingoTask> {
        self.state.read(|s| s.tasks.clone())
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.state.read(BingoState::completed_count)
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state.read(|s| s.is_completed)
    }

    /// Check off a square. Returns `false` for unknown or already
    /// completed squares.
    pub fn complete_task(&self, task_id: &TaskId) -> bool {
        let now = self.ctx.now();
        let (checked, card_done) = self.state.update(|s| {
            let Some(task) = s.tasks.iter_mut().find(|t| &t.id == task_id && !t.completed) else {
                return (false, false);
            };
            task.completed = true;
            task.completed_at = Some(now);
            (true, s.settle(now))
        });
        if !checked {
            return false;
        }

        let user_id = self.profile.user_id();
        if user_id.is_assigned() {
            self.ctx.enqueue(
                "bingo task",
                Endpoint::Procedure(Procedure::BingoCompleteTask),
                json!({ "userId": user_id, "taskId": task_id, "completedAt": now }),
            );
            if card_done {
                self.ctx.enqueue(
                    "bingo card",
                    Endpoint::Procedure(Procedure::BingoCompleteBingo),
                    json!({ "userId": user_id, "completedAt": now }),
                );
            }
        }
        if card_done {
            info!("bingo card completed");
        }
        true
    }

    /// Fresh card, and the user's remote completions cleared.
    pub fn reset_bingo(&self) {
        self.state.replace(BingoState {
            tasks: fresh_card(),
            ..BingoState::default()
        });
        let user_id = self.profile.user_id();
        if user_id.is_assigned() {
            for table in [Table::BingoCompletions, Table::BingoCardCompletions] {
                self.ctx
                    .enqueue("bingo reset", Endpoint::TableDelete(table), json!({ "user_id": user_id }));
            }
        }
        info!("bingo card reset");
    }

    /// Merge completions recorded on other devices.
    ///
    /// Squares are only ever checked by a merge, never unchecked.
    #[instrument(skip(self))]
    pub async fn load_from_remote(&self) {
        let user_id = self.profile.user_id();
        if !user_id.is_assigned() {
            debug!("profile not onboarded, skipping bingo load");
            return;
        }
        let filter = json!({ "user_id": user_id });
        let Some(rows) = self
            .ctx
            .query(Endpoint::Table(Table::BingoCompletions), &filter)
            .await
        else {
            return;
        };
        let completions: Vec<CompletionRow> = parse_rows(rows);
        let card: Option<DateTime<Utc>> = self
            .ctx
            .query(Endpoint::Table(Table::BingoCardCompletions), &filter)
            .await
            .map(parse_rows::<CardCompletionRow>)
            .and_then(|rows| rows.into_iter().map(|r| r.completed_at).max());

        let now = self.ctx.now();
        let merged = self.state.update(|s| {
            let mut merged = 0;
            for row in &completions {
                if let Some(task) = s.tasks.iter_mut().find(|t| t.id == row.task_id && !t.completed) {
                    task.completed = true;
                    task.completed_at = Some(row.completed_at);
                    merged += 1;
                }
            }
            if let Some(at) = card
                && !s.is_completed
            {
                s.is_completed = true;
                s.completed_at = Some(at);
            }
            s.settle(now);
            merged
        });
        debug!(merged, "bingo completions merged");
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<BingoState> {
        self.state.subscribe()
    }

    pub async fn flush(&self) {
        self.state.flush().await;
    }
}

/// Parse each row independently, skipping the malformed ones.
fn parse_rows<T: serde::de::DeserializeOwned>(rows: Value) -> Vec<T> {
    let Value::Array(rows) = rows else {
        warn!("expected an array of rows");
        return Vec::new();
    };
    rows.into_iter()
        .filter_map(|row| {
            serde_json::from_value(row)
                .inspect_err(|e| warn!(error = %e, "skipping malformed row"))
                .ok()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::remote::{DemoRemote, Remote};
    use crate::stores::achievements::AchievementStore;
    use crate::testing::{self, ManualClock, RecordingRemote};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 23, 0, 0).unwrap()
    }

    fn bingo_with(remote: Arc<dyn Remote>) -> (BingoStore, ProfileStore, StoreContext, Arc<ManualClock>) {
        let (ctx, clock) = testing::context(remote, start());
        let profile = ProfileStore::new(&ctx, AchievementStore::new(&ctx));
        (BingoStore::new(&ctx, profile.clone()), profile, ctx, clock)
    }

    #[tokio::test]
    async fn test_initialized_with_nine_tasks() {
        let (bingo, _, _, _) = bingo_with(Arc::new(DemoRemote));
        let tasks = bingo.tasks();
        assert_eq!(tasks.len(), 9);
        assert_eq!(tasks[2].id.as_str(), "pool-jba");
        assert!(tasks.iter().all(|t| !t.completed));

        bingo.initialize_tasks();
        assert_eq!(bingo.tasks().len(), 9);
    }

    #[tokio::test]
    async fn test_complete_task_idempotent() {
        let (bingo, _, _, clock) = bingo_with(Arc::new(DemoRemote));
        let id = TaskId::new("three-bars");
        assert!(bingo.complete_task(&id));
        clock.advance(TimeDelta::minutes(5));
        assert!(!bingo.complete_task(&id));
        assert!(!bingo.complete_task(&TaskId::new("moon-landing")));

        assert_eq!(bingo.completed_count(), 1);
        let task = bingo.tasks().into_iter().find(|t| t.id == id).unwrap();
        assert_eq!(task.completed_at, Some(start()));
    }

    #[tokio::test]
    async fn test_full_card_completes_once() {
        let remote = Arc::new(RecordingRemote::new());
        let (bingo, profile, ctx, clock) = bingo_with(remote.clone());
        profile.complete_onboarding("Alex", "Kim").unwrap();

        for (id, ..) in CARD {
            bingo.complete_task(&TaskId::new(id));
            clock.advance(TimeDelta::minutes(1));
        }
        let state = bingo.get();
        assert!(state.is_completed);
        let done_at = state.completed_at.unwrap();
        assert_eq!(done_at, start() + TimeDelta::minutes(8));

        ctx.sync.drain().await;
        assert_eq!(remote.mutations_to(Endpoint::Procedure(Procedure::BingoCompleteTask)).len(), 9);
        assert_eq!(remote.mutations_to(Endpoint::Procedure(Procedure::BingoCompleteBingo)).len(), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_remote_for_onboarded_user() {
        let remote = Arc::new(RecordingRemote::new());
        let (bingo, profile, ctx, _) = bingo_with(remote.clone());
        bingo.complete_task(&TaskId::new("pool-jba"));
        bingo.reset_bingo();
        assert_eq!(bingo.completed_count(), 0);
        ctx.sync.drain().await;
        assert!(remote.mutations().is_empty());

        profile.complete_onboarding("Alex", "Kim").unwrap();
        bingo.reset_bingo();
        ctx.sync.drain().await;
        assert_eq!(remote.mutations_to(Endpoint::TableDelete(Table::BingoCompletions)).len(), 1);
        assert_eq!(remote.mutations_to(Endpoint::TableDelete(Table::BingoCardCompletions)).len(), 1);
    }

    #[tokio::test]
    async fn test_load_from_remote_merges() {
        let remote = Arc::new(RecordingRemote::new());
        remote.respond(
            Endpoint::Table(Table::BingoCompletions),
            json!([
                { "task_id": "dart-bird", "completed_at": "2026-10-10T23:00:00Z" },
                { "task_id": "not-a-task", "completed_at": "2026-10-10T23:00:00Z" },
                { "task_id": "pool-jba" }
            ]),
        );
        let (bingo, profile, _, _) = bingo_with(remote.clone());
        bingo.load_from_remote().await;
        assert!(remote.queries().is_empty());

        profile.complete_onboarding("Alex", "Kim").unwrap();
        bingo.complete_task(&TaskId::new("beer-library"));
        bingo.load_from_remote().await;

        let done: Vec<_> = bingo
            .tasks()
            .into_iter()
            .filter(|t| t.completed)
            .map(|t| t.id.into_inner())
            .collect();
        assert_eq!(done, vec!["dart-bird", "beer-library"]);
        assert!(!bingo.is_completed());
    }
}
