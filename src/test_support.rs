//! Hand-written fakes shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use tokio::sync::Semaphore;

use crate::{
    alerts::{Alert, AlertHost, HostPermission},
    api::{ApiError, NotificationApi},
    audio::SoundCue,
    models::NotificationRecord,
};

pub(crate) fn record(id: i64, is_read: bool) -> NotificationRecord {
    NotificationRecord {
        id,
        message: format!("notification {id}"),
        is_read,
        created_at: Utc
            .timestamp_opt(1_700_000_000 + id, 0)
            .single()
            .unwrap_or_else(Utc::now),
    }
}

/// `unread` unread records followed by `read` read ones, ids from 1.
pub(crate) fn records(unread: usize, read: usize) -> Vec<NotificationRecord> {
    (0..unread + read)
        .map(|i| record(i as i64 + 1, i >= unread))
        .collect()
}

#[derive(Default)]
pub(crate) struct CountingCue {
    plays: AtomicUsize,
}

impl CountingCue {
    pub(crate) fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl SoundCue for CountingCue {
    fn play(&self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }
}

/// Alert host that records prompts and shown alerts. A prompt moves the
/// permission to the scripted answer.
pub(crate) struct RecordingHost {
    permission: Mutex<HostPermission>,
    answer: HostPermission,
    prompts: AtomicUsize,
    shown: Mutex<Vec<Alert>>,
}

impl RecordingHost {
    pub(crate) fn new(initial: HostPermission, answer: HostPermission) -> Self {
        Self {
            permission: Mutex::new(initial),
            answer,
            prompts: AtomicUsize::new(0),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn granted() -> Self {
        Self::new(HostPermission::Granted, HostPermission::Granted)
    }

    pub(crate) fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub(crate) fn shown(&self) -> Vec<Alert> {
        self.shown.lock().unwrap().clone()
    }

    pub(crate) fn set_permission(&self, permission: HostPermission) {
        *self.permission.lock().unwrap() = permission;
    }
}

#[async_trait]
impl AlertHost for RecordingHost {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> HostPermission {
        *self.permission.lock().unwrap()
    }

    async fn prompt(&self) -> HostPermission {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.set_permission(self.answer);
        self.answer
    }

    fn show(&self, alert: Alert) -> Result<()> {
        self.shown.lock().unwrap().push(alert);
        Ok(())
    }
}

type FetchResponse = Result<Vec<NotificationRecord>, ApiError>;

/// Notification API answering fetches from a script, in call order. An
/// exhausted script answers with an empty list.
pub(crate) struct ScriptedApi {
    responses: Mutex<VecDeque<FetchResponse>>,
    delay: Option<Duration>,
    gate: Option<Semaphore>,
    fail_marks: bool,
    fetch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    marked: Mutex<Vec<i64>>,
}

impl ScriptedApi {
    pub(crate) fn new(responses: Vec<FetchResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            delay: None,
            gate: None,
            fail_marks: false,
            fetch_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            marked: Mutex::new(Vec::new()),
        }
    }

    /// Every fetch sleeps this long before answering.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every fetch waits for a permit from `release`.
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub(crate) fn failing_marks(mut self) -> Self {
        self.fail_marks = true;
        self
    }

    pub(crate) fn release(&self, fetches: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(fetches);
        }
    }

    pub(crate) fn unavailable() -> ApiError {
        ApiError::Status {
            path: "/notifications".into(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn marked(&self) -> Vec<i64> {
        self.marked.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationApi for ScriptedApi {
    async fn fetch_notifications(&self) -> Result<Vec<NotificationRecord>, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    async fn mark_as_read(&self, id: i64) -> Result<(), ApiError> {
        if self.fail_marks {
            return Err(ApiError::Status {
                path: format!("/notifications/{id}/read"),
                status: StatusCode::NOT_FOUND,
            });
        }
        self.marked.lock().unwrap().push(id);
        Ok(())
    }
}
