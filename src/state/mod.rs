//! Shared application state: storage handle, broadcast registry, config.

/// Room membership and presence registry for the realtime channel.
pub mod rooms;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::mongodb::MongoManager, error::ServiceError};

pub use self::rooms::{CHAT_ROOM, ClientConnection, RoomRegistry, poll_room};

/// Cheaply cloneable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state storing the storage handle and the realtime
/// connection registry.
pub struct AppState {
    mongo: RwLock<Option<MongoManager>>,
    rooms: RoomRegistry,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            mongo: RwLock::new(None),
            rooms: RoomRegistry::new(),
            config,
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current storage manager, if one is installed.
    pub async fn mongo(&self) -> Option<MongoManager> {
        let guard = self.mongo.read().await;
        guard.clone()
    }

    /// Obtain the storage manager or fail with a degraded-mode error.
    pub async fn require_mongo(&self) -> Result<MongoManager, ServiceError> {
        self.mongo().await.ok_or(ServiceError::Degraded)
    }

    /// Install a connected storage manager and leave degraded mode.
    pub async fn install_mongo(&self, manager: MongoManager) {
        {
            let mut guard = self.mongo.write().await;
            *guard = Some(manager);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current storage manager and enter degraded mode.
    pub async fn clear_mongo(&self) {
        {
            let mut guard = self.mongo.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.mongo.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// The broadcast layer's connection and room registry.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Update and broadcast the degraded flag when the value changes.
    async fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn fresh_state_starts_degraded_and_watchers_see_it() {
        let state = AppState::new(AppConfig::default());

        assert!(state.is_degraded().await);
        // Background tasks park on this channel until storage is installed.
        assert!(*state.degraded_watcher().borrow());
    }
}
