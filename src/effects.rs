use std::sync::Arc;
use std::time::Duration;

use crate::alerts::PermissionGateway;
use crate::audio::SoundCue;
use crate::poller::PollingState;

/// Title of the desktop alert raised for a new notification.
pub const ALERT_TITLE: &str = "New notification";

/// How long consumers should show the "new" animation before clearing the
/// flag with `clear_new_notification_flag`.
pub const NEW_FLAG_WINDOW: Duration = Duration::from_millis(600);

/// Fires the user-facing effects of a newly-arrived notification.
#[derive(Clone)]
pub struct EffectDispatcher {
    sound: Arc<dyn SoundCue>,
    gateway: Arc<PermissionGateway>,
}

impl EffectDispatcher {
    pub fn new(sound: Arc<dyn SoundCue>, gateway: Arc<PermissionGateway>) -> Self {
        Self { sound, gateway }
    }

    /// Chime, then alert, then raise the transient flag.
    pub fn fire(&self, message: &str, state: &mut PollingState) {
        self.sound.play();
        self.gateway.dispatch_alert(ALERT_TITLE, message);
        state.has_new = true;
    }
}
