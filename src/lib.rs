pub mod alerts;
pub mod api;
pub mod audio;
pub mod auth;
pub mod center;
pub mod config;
pub mod effects;
pub mod models;
pub mod poller;
pub mod settings;
pub mod utils;

#[cfg(test)]
mod test_support;

use std::{future::Future, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};

pub use alerts::{PermissionGateway, PermissionState};
pub use auth::{AuthSession, SessionUser};
pub use center::NotificationCenter;
pub use config::AppConfig;
pub use effects::NEW_FLAG_WINDOW;
pub use models::NotificationRecord;
pub use poller::{NotificationSnapshot, SessionContext};
pub use settings::PreferenceStore;

/// Entry point of the `marketplace-notifier` binary.
pub fn run() -> Result<()> {
    let config = AppConfig::from_env();

    // Initialize logging (reads RUST_LOG env var)
    let level = if config.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    info!("Marketplace notifier starting up...");

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(serve(config, shutdown_signal()))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}

/// Runs one session until `shutdown` resolves.
pub async fn serve(config: AppConfig, shutdown: impl Future<Output = ()>) -> Result<()> {
    let preferences = match std::fs::create_dir_all(&config.data_dir) {
        Ok(()) => PreferenceStore::open(config.preferences_path()),
        Err(err) => {
            warn!(
                "Cannot use data dir {}: {err}; preferences will not persist",
                config.data_dir.display()
            );
            PreferenceStore::in_memory()
        }
    };

    let center = NotificationCenter::new(
        Arc::new(preferences),
        Arc::new(PermissionGateway::new(alerts::default_alert_host())),
        audio::default_sound_cue(),
        config.poll_interval,
    );

    if center.notifications_enabled().await {
        let permission = center.request_permission().await;
        info!("Alert permission: {permission:?}");
    }

    match config.token.as_deref() {
        Some(token) => {
            let session = AuthSession::from_callback_token(token).unwrap_or_else(|err| {
                warn!("Token payload unreadable ({err}); using it as an opaque bearer token");
                AuthSession::opaque(token)
            });
            if let Some(user) = session.user() {
                info!("Signed in as {} ({:?})", user.email, user.role);
            }
            center.sign_in(&session, &config).await?;
        }
        None => info!("No MARKETPLACE_TOKEN set; not polling"),
    }

    let mut updates = center.subscribe();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                info!(
                    "{} notifications, {} unread",
                    snapshot.notifications.len(),
                    snapshot.unread_count
                );
                if snapshot.has_new_notification {
                    let center = center.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(NEW_FLAG_WINDOW).await;
                        center.clear_new_notification_flag().await;
                    });
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    center.end_session().await;
    Ok(())
}
