use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::models::{first_unread, unread_count, NotificationRecord};

use super::delta::{detect, Delta};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PollerStatus {
    #[default]
    Idle,
    Fetching,
    Scheduled,
}

/// Per-session notification state shared by the poller and the center.
#[derive(Debug, Clone, Default)]
pub struct PollingState {
    pub notifications: Vec<NotificationRecord>,
    /// Unread count after the last successful fetch; `None` until the
    /// session's first fetch lands.
    pub previous_unread: Option<usize>,
    pub enabled: bool,
    pub has_new: bool,
    pub status: PollerStatus,
}

impl PollingState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn unread_count(&self) -> usize {
        unread_count(&self.notifications)
    }

    pub fn previous_unread_count(&self) -> usize {
        self.previous_unread.unwrap_or(0)
    }

    pub fn first_unread(&self) -> Option<&NotificationRecord> {
        first_unread(&self.notifications)
    }

    /// Replaces the list with a fresh fetch and advances the baseline.
    pub fn apply_fetch(&mut self, records: Vec<NotificationRecord>) -> Delta {
        let delta = detect(self.previous_unread, &records);
        self.notifications = records;
        self.previous_unread = Some(delta.new_unread);
        delta
    }

    /// Flags one record as read. Returns whether an unread record changed.
    ///
    /// The baseline only moves on a successful fetch.
    pub fn mark_read_locally(&mut self, id: i64) -> bool {
        match self
            .notifications
            .iter_mut()
            .find(|record| record.id == id && !record.is_read)
        {
            Some(record) => {
                record.is_read = true;
                true
            }
            None => false,
        }
    }

    /// Forgets everything tied to the signed-in user; keeps the preference.
    pub fn reset_session(&mut self) {
        *self = Self::new(self.enabled);
    }

    pub fn snapshot(&self) -> NotificationSnapshot {
        NotificationSnapshot {
            notifications: self.notifications.clone(),
            unread_count: self.unread_count(),
            notifications_enabled: self.enabled,
            has_new_notification: self.has_new,
        }
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSnapshot {
    pub notifications: Vec<NotificationRecord>,
    pub unread_count: usize,
    pub notifications_enabled: bool,
    pub has_new_notification: bool,
}

/// `PollingState` behind a lock, plus a channel publishing snapshots.
pub struct SharedState {
    state: Mutex<PollingState>,
    updates: watch::Sender<NotificationSnapshot>,
}

impl SharedState {
    pub fn new(initial: PollingState) -> Arc<Self> {
        let (updates, _) = watch::channel(initial.snapshot());
        Arc::new(Self {
            state: Mutex::new(initial),
            updates,
        })
    }

    pub async fn lock(&self) -> MutexGuard<'_, PollingState> {
        self.state.lock().await
    }

    pub fn publish(&self, state: &PollingState) {
        self.updates.send_replace(state.snapshot());
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.updates.subscribe()
    }
}
