//! Builds an [`Engine`] from [`EngineConfig`].

use std::sync::Arc;

use anyhow::Context;

use crate::config::{EngineConfig, NotificationBackendConfig};
use crate::core::{AppResult, ApplicationStore, Directory, Engine, RelayMode, Spawn};
use crate::infra::mailbox::{FileNotificationStore, InMemoryNotificationStore, NotificationBackend};

/// Open the notification backend selected by `cfg`.
///
/// # Errors
///
/// Fails if the configuration is invalid or the file store cannot be opened.
pub fn build_notification_backend(cfg: &EngineConfig) -> AppResult<NotificationBackend> {
    match cfg.notifications {
        NotificationBackendConfig::InMemory => {
            Ok(NotificationBackend::InMemory(InMemoryNotificationStore::new()))
        }
        NotificationBackendConfig::File => {
            let dir = cfg
                .data_dir
                .as_deref()
                .context("file notification backend requires data_dir")?;
            let store = FileNotificationStore::open(dir, &cfg.stream)
                .with_context(|| format!("opening notification store in {dir}"))?;
            Ok(NotificationBackend::File(store))
        }
    }
}

/// Validate `cfg`, open the notification backend, and wire the engine over `store`.
///
/// With [`RelayMode::Background`] the relay loop is started on `spawner`.
///
/// # Errors
///
/// Fails on invalid configuration or when a backend cannot be opened.
pub fn build_engine<S, Sp>(
    cfg: &EngineConfig,
    store: Arc<S>,
    spawner: &Sp,
) -> AppResult<Engine<S, NotificationBackend>>
where
    S: ApplicationStore + Directory,
    Sp: Spawn,
{
    cfg.validate()
        .map_err(|e| anyhow::anyhow!("config invalid: {e}"))?;
    let notifications = Arc::new(build_notification_backend(cfg)?);
    let engine = Engine::new(store, notifications, cfg.engine_options());
    if cfg.relay == RelayMode::Background {
        engine.relay().spawn_background(spawner, cfg.relay_idle());
    }
    tracing::info!(
        relay = ?cfg.relay,
        notifications = ?cfg.notifications,
        repeat_decision = ?cfg.repeat_decision,
        "engine built"
    );
    Ok(engine)
}
