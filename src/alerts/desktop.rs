use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use notify_rust::{Notification, Timeout};

use super::{Alert, AlertHost, HostPermission};

/// Called when the user clicks an alert; should bring the application forward.
pub type FocusHook = Arc<dyn Fn() + Send + Sync>;

/// Desktop notifications through the platform notification service.
///
/// Desktop sessions have no consent dialog, so the "prompt" probes whether a
/// notification service is reachable and records the answer.
pub struct DesktopAlertHost {
    permission: Mutex<HostPermission>,
    on_focus: Option<FocusHook>,
}

impl DesktopAlertHost {
    pub fn new() -> Self {
        Self {
            permission: Mutex::new(HostPermission::Undecided),
            on_focus: None,
        }
    }

    pub fn with_focus_hook(mut self, hook: FocusHook) -> Self {
        self.on_focus = Some(hook);
        self
    }

    fn set_permission(&self, permission: HostPermission) {
        let mut guard = match self.permission.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = permission;
    }
}

impl Default for DesktopAlertHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertHost for DesktopAlertHost {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> HostPermission {
        match self.permission.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    async fn prompt(&self) -> HostPermission {
        let answer = match tokio::task::spawn_blocking(probe_notification_service).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!("Notification service probe failed to join: {err}");
                HostPermission::Undecided
            }
        };
        self.set_permission(answer);
        answer
    }

    fn show(&self, alert: Alert) -> Result<()> {
        let on_focus = self.on_focus.clone();

        // Showing and waiting for the click both block on the notification
        // service, so each alert gets its own short-lived thread.
        thread::Builder::new()
            .name("desktop-alert".into())
            .spawn(move || present(alert, on_focus))
            .context("failed to spawn desktop alert thread")?;
        Ok(())
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn probe_notification_service() -> HostPermission {
    match notify_rust::get_server_information() {
        Ok(info) => {
            info!("Using notification service {} {}", info.name, info.version);
            HostPermission::Granted
        }
        Err(err) => {
            warn!("No desktop notification service reachable: {err}");
            HostPermission::Denied
        }
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn probe_notification_service() -> HostPermission {
    info!("Desktop notifications available");
    HostPermission::Granted
}

fn present(alert: Alert, on_focus: Option<FocusHook>) {
    let millis = u32::try_from(alert.timeout.as_millis()).unwrap_or(u32::MAX);

    let mut notification = Notification::new();
    notification
        .summary(&alert.title)
        .body(&alert.body)
        .appname(alert.app_name)
        .timeout(Timeout::Milliseconds(millis));

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        notification.action("default", "Open");
    }

    let handle = match notification.show() {
        Ok(handle) => handle,
        Err(err) => {
            warn!("Failed to show desktop alert: {err}");
            return;
        }
    };

    // Clicking invokes the default action and closes the alert.
    #[cfg(all(unix, not(target_os = "macos")))]
    handle.wait_for_action(|action| {
        if action == "default" {
            if let Some(focus) = &on_focus {
                focus();
            }
        }
    });

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    {
        let _ = (handle, on_focus);
    }
}
