use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use tokio::sync::watch;

use crate::{
    alerts::{PermissionGateway, PermissionState},
    api::HttpNotificationApi,
    audio::SoundCue,
    auth::AuthSession,
    config::AppConfig,
    effects::EffectDispatcher,
    models::NotificationRecord,
    poller::{
        NotificationPoller, NotificationSnapshot, PollerStatus, PollingState, SessionContext,
        SharedState,
    },
    settings::PreferenceStore,
};

const ENABLE_LOGS: bool = true;
const LOG_SCOPE: &str = "center";

use crate::{log_info, log_warn};

/// Context object the presentation layer talks to: current notifications,
/// the enabled preference and the transient "new" flag.
#[derive(Clone)]
pub struct NotificationCenter {
    shared: Arc<SharedState>,
    poller: NotificationPoller,
    preferences: Arc<PreferenceStore>,
    gateway: Arc<PermissionGateway>,
}

impl NotificationCenter {
    pub fn new(
        preferences: Arc<PreferenceStore>,
        gateway: Arc<PermissionGateway>,
        sound: Arc<dyn SoundCue>,
        poll_interval: Duration,
    ) -> Self {
        let shared = SharedState::new(PollingState::new(preferences.load()));
        let effects = EffectDispatcher::new(sound, Arc::clone(&gateway));
        let poller = NotificationPoller::new(Arc::clone(&shared), effects, poll_interval);

        Self {
            shared,
            poller,
            preferences,
            gateway,
        }
    }

    /// Starts polling for a freshly authenticated session. Any previous
    /// session's state is dropped first.
    pub async fn start_session(&self, ctx: SessionContext) {
        self.poller.start(ctx).await;
    }

    /// Builds an HTTP session from `session` and starts polling. Returns
    /// `false` when the session has already expired.
    pub async fn sign_in(&self, session: &AuthSession, config: &AppConfig) -> Result<bool> {
        if session.is_expired(Utc::now()) {
            log_warn!("session token has expired; not polling");
            return Ok(false);
        }

        let api = HttpNotificationApi::new(&config.api_base_url, session.token(), config.http_timeout)?;
        let ctx = SessionContext::new(Arc::new(api)).with_user(session.user().cloned());
        self.start_session(ctx).await;
        Ok(true)
    }

    /// Stops polling and forgets the session's notifications. The enabled
    /// preference survives.
    pub async fn end_session(&self) {
        self.poller.stop().await;
        let mut state = self.shared.lock().await;
        state.reset_session();
        self.shared.publish(&state);
        log_info!("session ended");
    }

    pub async fn notifications(&self) -> Vec<NotificationRecord> {
        self.shared.lock().await.notifications.clone()
    }

    pub async fn unread_count(&self) -> usize {
        self.shared.lock().await.unread_count()
    }

    pub async fn notifications_enabled(&self) -> bool {
        self.shared.lock().await.enabled
    }

    pub async fn has_new_notification(&self) -> bool {
        self.shared.lock().await.has_new
    }

    pub async fn snapshot(&self) -> NotificationSnapshot {
        self.shared.lock().await.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.shared.subscribe()
    }

    pub async fn poller_status(&self) -> PollerStatus {
        self.poller.status().await
    }

    /// Flips the enabled preference, persists it and asks for alert
    /// permission when switching on. Returns the new value.
    pub async fn toggle_notifications(&self) -> bool {
        let enabled = {
            let mut state = self.shared.lock().await;
            state.enabled = !state.enabled;
            self.shared.publish(&state);
            state.enabled
        };

        self.preferences.save(enabled);
        log_info!(
            "notifications {}",
            if enabled { "enabled" } else { "disabled" }
        );

        if enabled {
            self.gateway.request_permission().await;
        }
        enabled
    }

    pub async fn request_permission(&self) -> PermissionState {
        self.gateway.request_permission().await
    }

    /// Errors are logged, never returned; local state only changes once the
    /// server has accepted the update.
    pub async fn mark_as_read(&self, id: i64) {
        if let Err(err) = self.poller.mark_as_read(id).await {
            log_warn!("{err:#}");
        }
    }

    /// Fetches right away instead of waiting for the next tick.
    pub async fn refresh_notifications(&self) {
        self.poller.refresh().await;
    }

    pub async fn clear_new_notification_flag(&self) {
        let mut state = self.shared.lock().await;
        if state.has_new {
            state.has_new = false;
            self.shared.publish(&state);
        }
    }
}
