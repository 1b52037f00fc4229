//! In-memory timeline state and the rules that place todos on days.
//!
//! [`TimelineManager`] is the single authority over the active set and the
//! completed-by-day map. Every mutation is applied in memory first and then
//! written through the store. A failed write is reported to the caller but
//! the in-memory change stays applied.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc;

use chrono::{NaiveDate, TimeDelta};
use uuid::Uuid;

use crate::io::store::{StoreError, TodoStore};
use crate::model::config::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::model::todo::TodoItem;

/// Error type for timeline operations
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("todo title is empty")]
    EmptyTitle,
    #[error("todo title must fit on one line")]
    MultilineTitle,
    #[error("todo not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// State changes announced to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    /// Everything was reloaded from disk
    Reloaded,
    Added { id: Uuid, day: NaiveDate },
    Completed { id: Uuid, day: NaiveDate },
    Restored { id: Uuid, day: NaiveDate },
    Deleted { id: Uuid, day: NaiveDate },
    /// A write failed after the in-memory change was applied
    SaveFailed { message: String },
}

/// Fallback and failure state for a UI to display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notice {
    /// The configured folder could not be used and the default took over
    pub fell_back_to_default: bool,
    /// Message of the most recent failure, if any
    pub last_error: Option<String>,
}

/// The todos shown under one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTodos<'a> {
    pub active: Vec<&'a TodoItem>,
    pub completed: &'a [TodoItem],
}

pub struct TimelineManager<S: TodoStore> {
    store: S,
    today: NaiveDate,
    window_days: i64,
    active: Vec<TodoItem>,
    completed: BTreeMap<NaiveDate, Vec<TodoItem>>,
    dates: Vec<NaiveDate>,
    notice: Notice,
    subscribers: Vec<mpsc::Sender<TimelineEvent>>,
}

impl<S: TodoStore> TimelineManager<S> {
    /// Create an empty manager. Call [`load_data`](Self::load_data) to read
    /// the store.
    pub fn new(store: S, today: NaiveDate) -> Self {
        TimelineManager {
            store,
            today,
            window_days: DEFAULT_WINDOW_DAYS,
            active: Vec::new(),
            completed: BTreeMap::new(),
            dates: Vec::new(),
            notice: Notice::default(),
            subscribers: Vec::new(),
        }
    }

    /// Number of days shown either side of today, clamped to
    /// `0..=MAX_WINDOW_DAYS`
    pub fn with_window_days(mut self, days: i64) -> Self {
        if days > MAX_WINDOW_DAYS {
            tracing::warn!(days, max = MAX_WINDOW_DAYS, "timeline window too large, clamping");
        }
        self.window_days = days.clamp(0, MAX_WINDOW_DAYS);
        self
    }

    /// Mark that the configured folder was unusable and the default is in use.
    pub fn flag_fallback(&mut self, reason: impl Into<String>) {
        self.notice.fell_back_to_default = true;
        self.notice.last_error = Some(reason.into());
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Move "today", e.g. after midnight. Does not reload.
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
        self.dates = self.compute_dates();
    }

    pub fn active(&self) -> &[TodoItem] {
        &self.active
    }

    pub fn completed_by_date(&self) -> &BTreeMap<NaiveDate, Vec<TodoItem>> {
        &self.completed
    }

    /// The scrollable range of days, ascending
    pub fn visible_dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn notice(&self) -> &Notice {
        &self.notice
    }

    /// Receive every state change from now on.
    pub fn subscribe(&mut self) -> mpsc::Receiver<TimelineEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: TimelineEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Repopulate everything from the store and recompute the visible dates.
    pub fn load_data(&mut self) {
        self.active = self.store.load_active(self.today);
        self.completed = self
            .store
            .list_completed_days()
            .into_iter()
            .map(|day| (day, self.store.load_completed(day)))
            .collect();
        self.dates = self.compute_dates();
        tracing::debug!(
            active = self.active.len(),
            days = self.completed.len(),
            "timeline loaded"
        );
        self.emit(TimelineEvent::Reloaded);
    }

    /// today ± window, every day with a completed file, and today itself
    fn compute_dates(&self) -> Vec<NaiveDate> {
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        for offset in -self.window_days..=self.window_days {
            if let Some(day) =
                TimeDelta::try_days(offset).and_then(|d| self.today.checked_add_signed(d))
            {
                dates.insert(day);
            }
        }
        dates.extend(self.completed.keys().copied());
        dates.insert(self.today);
        dates.into_iter().collect()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The todos to show under `day`.
    ///
    /// Pending items from past days roll forward onto today; future days
    /// show only items scheduled for exactly that day; past days show no
    /// pending items.
    pub fn todos_for_date(&self, day: NaiveDate) -> DayTodos<'_> {
        let active = if day == self.today {
            self.active.iter().filter(|t| t.date <= self.today).collect()
        } else if day > self.today {
            self.active.iter().filter(|t| t.date == day).collect()
        } else {
            Vec::new()
        };

        let completed = self
            .completed
            .get(&day)
            .map(|items| items.as_slice())
            .unwrap_or(&[]);

        DayTodos { active, completed }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Add a new active todo scheduled for `day`. Returns its id.
    ///
    /// The title is trimmed the same way the checklist parser trims it, so
    /// it reads back unchanged after a reload.
    pub fn add_todo(&mut self, title: &str, day: NaiveDate) -> Result<Uuid, TimelineError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TimelineError::EmptyTitle);
        }
        if title.contains(['\n', '\r']) {
            return Err(TimelineError::MultilineTitle);
        }
        let item = TodoItem::active(title, day);
        let id = item.id;
        self.active.push(item);
        self.emit(TimelineEvent::Added { id, day });

        let result = self.store.save_active(&self.active);
        self.settle(result)?;
        Ok(id)
    }

    /// Complete the active todo `id` into the bucket for `day`.
    /// Returns the id of the new completed item.
    pub fn complete_todo(&mut self, id: Uuid, day: NaiveDate) -> Result<Uuid, TimelineError> {
        let idx = self
            .active
            .iter()
            .position(|t| t.id == id)
            .ok_or(TimelineError::NotFound(id))?;
        let item = self.active.remove(idx);

        let done = TodoItem::completed(item.title, day);
        let done_id = done.id;
        self.completed.entry(day).or_default().push(done);
        self.emit(TimelineEvent::Completed { id: done_id, day });

        let active_result = self.store.save_active(&self.active);
        let day_result = self.save_day(day);
        self.settle(active_result.and(day_result))?;
        Ok(done_id)
    }

    /// Move the completed todo `id` out of `day` back to the active set,
    /// scheduled for `day`. Returns the id of the new active item.
    pub fn undo_completed_todo(&mut self, id: Uuid, day: NaiveDate) -> Result<Uuid, TimelineError> {
        let bucket = self
            .completed
            .get_mut(&day)
            .ok_or(TimelineError::NotFound(id))?;
        let idx = bucket
            .iter()
            .position(|t| t.id == id)
            .ok_or(TimelineError::NotFound(id))?;
        let item = bucket.remove(idx);

        let restored = TodoItem::active(item.title, day);
        let restored_id = restored.id;
        self.active.push(restored);
        self.emit(TimelineEvent::Restored {
            id: restored_id,
            day,
        });

        let active_result = self.store.save_active(&self.active);
        let day_result = self.save_day(day);
        self.settle(active_result.and(day_result))?;
        Ok(restored_id)
    }

    /// Delete the todo `id` from the active set and/or the bucket for `day`.
    pub fn delete_todo(&mut self, id: Uuid, day: NaiveDate) -> Result<(), TimelineError> {
        let mut removed: Vec<TodoItem> = Vec::new();

        let before = self.active.len();
        self.active.retain(|t| {
            if t.id == id {
                removed.push(t.clone());
                false
            } else {
                true
            }
        });
        let active_changed = self.active.len() != before;

        let mut day_changed = false;
        if let Some(bucket) = self.completed.get_mut(&day) {
            let before = bucket.len();
            bucket.retain(|t| {
                if t.id == id {
                    removed.push(t.clone());
                    false
                } else {
                    true
                }
            });
            day_changed = bucket.len() != before;
        }

        if removed.is_empty() {
            return Err(TimelineError::NotFound(id));
        }
        for item in &removed {
            self.store.record_deletion(item);
        }
        self.emit(TimelineEvent::Deleted { id, day });

        let mut result = Ok(());
        if active_changed {
            result = self.store.save_active(&self.active);
        }
        if day_changed {
            result = result.and(self.save_day(day));
        }
        self.settle(result)
    }

    /// Rewrite the completed file for `day` with its full in-memory set.
    fn save_day(&self, day: NaiveDate) -> Result<(), StoreError> {
        let items = self
            .completed
            .get(&day)
            .map(|items| items.as_slice())
            .unwrap_or(&[]);
        self.store.replace_completed(items, day)
    }

    /// Record the outcome of a write. The in-memory change is kept either way.
    fn settle(&mut self, result: Result<(), StoreError>) -> Result<(), TimelineError> {
        match result {
            Ok(()) => {
                self.notice.last_error = None;
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!("save failed, keeping in-memory change: {}", message);
                self.notice.last_error = Some(message.clone());
                self.emit(TimelineEvent::SaveFailed { message });
                Err(e.into())
            }
        }
    }
}
