// Out-of-band alerts (desktop notifications) and the permission that gates them.
//
// - mod.rs: permission states, the host capability trait and the gateway
// - desktop.rs: notify-rust backed host (feature `desktop-alerts`)

#[cfg(feature = "desktop-alerts")]
pub mod desktop;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Alerts close themselves after this long unless dismissed earlier.
pub const ALERT_TIMEOUT: Duration = Duration::from_secs(5);

/// Application name attached to every alert so hosts can group or replace them.
pub const ALERT_APP_NAME: &str = "marketplace-notifier";

/// Permission as seen by the rest of the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionState {
    Granted,
    Denied,
    Unsupported,
}

/// Raw permission reported by a host. `Undecided` means the user has not
/// answered a prompt yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPermission {
    Undecided,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    pub app_name: &'static str,
    pub timeout: Duration,
}

/// Capability-checked access to the host's alert facility.
#[async_trait]
pub trait AlertHost: Send + Sync {
    fn is_supported(&self) -> bool;

    fn permission(&self) -> HostPermission;

    /// Asks the user (or the platform) once and returns the answer.
    async fn prompt(&self) -> HostPermission;

    /// Shows `alert`. Hosts own auto-dismissal and click handling.
    fn show(&self, alert: Alert) -> Result<()>;
}

/// Host without any alert facility.
pub struct UnsupportedHost;

#[async_trait]
impl AlertHost for UnsupportedHost {
    fn is_supported(&self) -> bool {
        false
    }

    fn permission(&self) -> HostPermission {
        HostPermission::Denied
    }

    async fn prompt(&self) -> HostPermission {
        HostPermission::Denied
    }

    fn show(&self, _alert: Alert) -> Result<()> {
        Ok(())
    }
}

/// Default host for this build: desktop notifications when compiled in.
pub fn default_alert_host() -> Arc<dyn AlertHost> {
    #[cfg(feature = "desktop-alerts")]
    {
        Arc::new(desktop::DesktopAlertHost::new())
    }

    #[cfg(not(feature = "desktop-alerts"))]
    {
        Arc::new(UnsupportedHost)
    }
}

pub struct PermissionGateway {
    host: Arc<dyn AlertHost>,
}

impl PermissionGateway {
    pub fn new(host: Arc<dyn AlertHost>) -> Self {
        Self { host }
    }

    pub fn is_supported(&self) -> bool {
        self.host.is_supported()
    }

    /// Current state without prompting.
    pub fn current_state(&self) -> PermissionState {
        if !self.host.is_supported() {
            return PermissionState::Unsupported;
        }

        match self.host.permission() {
            HostPermission::Granted => PermissionState::Granted,
            HostPermission::Denied | HostPermission::Undecided => PermissionState::Denied,
        }
    }

    /// Prompts only while the host is undecided; granted and denied answers
    /// are returned as they stand.
    pub async fn request_permission(&self) -> PermissionState {
        if !self.host.is_supported() {
            info!("Out-of-band alerts are not supported on this host");
            return PermissionState::Unsupported;
        }

        match self.host.permission() {
            HostPermission::Granted => PermissionState::Granted,
            HostPermission::Denied => PermissionState::Denied,
            HostPermission::Undecided => match self.host.prompt().await {
                HostPermission::Granted => {
                    info!("Alert permission granted");
                    PermissionState::Granted
                }
                HostPermission::Denied | HostPermission::Undecided => {
                    info!("Alert permission not granted");
                    PermissionState::Denied
                }
            },
        }
    }

    /// Shows an alert when permission is granted; otherwise does nothing.
    pub fn dispatch_alert(&self, title: &str, body: &str) {
        if self.current_state() != PermissionState::Granted {
            debug!("Skipping alert '{title}': permission not granted");
            return;
        }

        let alert = Alert {
            title: title.to_string(),
            body: body.to_string(),
            app_name: ALERT_APP_NAME,
            timeout: ALERT_TIMEOUT,
        };

        if let Err(err) = self.host.show(alert) {
            warn!("Failed to show alert: {err:#}");
        }
    }
}
