use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{ApiError, NotificationApi},
    auth::SessionUser,
    effects::EffectDispatcher,
    models::NotificationRecord,
};

use super::{PollerStatus, SharedState};

const ENABLE_LOGS: bool = true;
const LOG_SCOPE: &str = "poller";

use crate::{log_debug, log_info, log_warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Everything a polling session needs from the auth layer.
#[derive(Clone)]
pub struct SessionContext {
    pub api: Arc<dyn NotificationApi>,
    pub user: Option<SessionUser>,
}

impl SessionContext {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        Self { api, user: None }
    }

    pub fn with_user(mut self, user: Option<SessionUser>) -> Self {
        self.user = user;
        self
    }

    fn label(&self) -> &str {
        self.user
            .as_ref()
            .map(|user| user.email.as_str())
            .unwrap_or("anonymous session")
    }
}

struct SessionRun {
    ctx: SessionContext,
    generation: u64,
    in_flight: Arc<AtomicBool>,
}

struct ActiveRun {
    run: Arc<SessionRun>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Single-flight token: at most one fetch per session holds it.
struct FlightGuard(Arc<AtomicBool>);

impl FlightGuard {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct PollerCore {
    shared: Arc<SharedState>,
    effects: EffectDispatcher,
    /// Bumped on every start and stop; results tagged with an older
    /// generation belong to an ended session and are dropped.
    generation: AtomicU64,
}

/// Fetches the notification list on a fixed interval for one session at a
/// time and feeds each result through delta detection.
#[derive(Clone)]
pub struct NotificationPoller {
    core: Arc<PollerCore>,
    active: Arc<Mutex<Option<ActiveRun>>>,
    poll_interval: Duration,
}

impl NotificationPoller {
    pub fn new(shared: Arc<SharedState>, effects: EffectDispatcher, poll_interval: Duration) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };

        Self {
            core: Arc::new(PollerCore {
                shared,
                effects,
                generation: AtomicU64::new(0),
            }),
            active: Arc::new(Mutex::new(None)),
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub async fn is_running(&self) -> bool {
        self.active.lock().await.is_some()
    }

    pub async fn status(&self) -> PollerStatus {
        self.core.shared.lock().await.status
    }

    /// Fetches right away, then once per interval until `stop`. A running
    /// session is replaced, and the state of any earlier session is cleared.
    pub async fn start(&self, ctx: SessionContext) {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            log_info!("replacing running session");
            previous.cancel.cancel();
            previous.handle.abort();
        }

        let generation = self.core.begin().await;
        log_info!(
            "polling notifications every {}s for {}",
            self.poll_interval.as_secs(),
            ctx.label()
        );

        let run = Arc::new(SessionRun {
            ctx,
            generation,
            in_flight: Arc::new(AtomicBool::new(false)),
        });
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_ticker(
            Arc::clone(&self.core),
            Arc::clone(&run),
            self.poll_interval,
            cancel.clone(),
        ));

        *active = Some(ActiveRun {
            run,
            cancel,
            handle,
        });
    }

    /// Cancels the timer. A fetch already in flight keeps running but its
    /// result is discarded. Calling this again is harmless.
    pub async fn stop(&self) {
        let previous = self.active.lock().await.take();
        self.core.retire().await;

        if let Some(ActiveRun { cancel, handle, .. }) = previous {
            cancel.cancel();
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    log_warn!("ticker task failed to join: {err}");
                }
            }
            log_info!("notification polling stopped");
        }
    }

    /// Runs one fetch-and-detect cycle in the background. Returns `false`
    /// when there is no session or a fetch is already in flight.
    pub async fn tick(&self) -> bool {
        let Some(run) = self.current_run().await else {
            log_debug!("tick ignored: no active session");
            return false;
        };
        self.core.launch_fetch(run).await
    }

    /// Like `tick`, but waits for the fetch to be applied.
    pub async fn refresh(&self) -> bool {
        let Some(run) = self.current_run().await else {
            log_debug!("refresh ignored: no active session");
            return false;
        };
        let Some(_guard) = FlightGuard::try_acquire(&run.in_flight) else {
            log_debug!("refresh skipped: fetch already in flight");
            return false;
        };

        self.core.set_status(run.generation, PollerStatus::Fetching).await;
        let result = run.ctx.api.fetch_notifications().await;
        self.core.complete_fetch(run.generation, result).await;
        true
    }

    /// Marks one notification read on the server, then locally. Never
    /// re-fetches and never fires effects.
    pub async fn mark_as_read(&self, id: i64) -> Result<()> {
        let run = self
            .current_run()
            .await
            .ok_or_else(|| anyhow!("no active session"))?;

        run.ctx
            .api
            .mark_as_read(id)
            .await
            .with_context(|| format!("failed to mark notification {id} as read"))?;

        self.core.apply_read(run.generation, id).await;
        Ok(())
    }

    async fn current_run(&self) -> Option<Arc<SessionRun>> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| Arc::clone(&active.run))
    }
}

impl PollerCore {
    fn is_live(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn launch_fetch(self: &Arc<Self>, run: Arc<SessionRun>) -> bool {
        let Some(guard) = FlightGuard::try_acquire(&run.in_flight) else {
            log_debug!("tick skipped: previous fetch still in flight");
            return false;
        };

        self.set_status(run.generation, PollerStatus::Fetching).await;

        let core = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            let result = run.ctx.api.fetch_notifications().await;
            core.complete_fetch(run.generation, result).await;
        });
        true
    }

    async fn set_status(&self, generation: u64, status: PollerStatus) {
        let mut state = self.shared.lock().await;
        if self.is_live(generation) {
            state.status = status;
        }
    }

    async fn complete_fetch(
        &self,
        generation: u64,
        result: Result<Vec<NotificationRecord>, ApiError>,
    ) {
        let mut state = self.shared.lock().await;
        if !self.is_live(generation) {
            log_debug!("discarding fetch result from an ended session");
            return;
        }
        state.status = PollerStatus::Scheduled;

        let records = match result {
            Ok(records) => records,
            Err(err) => {
                log_warn!("failed to fetch notifications: {err}");
                return;
            }
        };

        let previous = state.previous_unread_count();
        let delta = state.apply_fetch(records);

        if delta.is_new && state.enabled {
            log_info!(
                "unread notifications went from {} to {}",
                previous,
                delta.new_unread
            );
            let message = state
                .first_unread()
                .map(|record| record.message.clone())
                .unwrap_or_default();
            self.effects.fire(&message, &mut state);
        }

        self.shared.publish(&state);
    }

    async fn apply_read(&self, generation: u64, id: i64) {
        let mut state = self.shared.lock().await;
        if !self.is_live(generation) {
            return;
        }
        if state.mark_read_locally(id) {
            self.shared.publish(&state);
        } else {
            log_debug!("notification {id} was not unread locally");
        }
    }

    /// Opens a new generation with a fresh baseline. The enabled preference
    /// is kept.
    async fn begin(&self) -> u64 {
        let mut state = self.shared.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        state.reset_session();
        self.shared.publish(&state);
        generation
    }

    async fn retire(&self) {
        let mut state = self.shared.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        state.status = PollerStatus::Idle;
    }
}

async fn run_ticker(
    core: Arc<PollerCore>,
    run: Arc<SessionRun>,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                core.launch_fetch(Arc::clone(&run)).await;
            }
            _ = cancel.cancelled() => {
                log_debug!("ticker shutting down");
                break;
            }
        }
    }
}
