//! Periodic capability polling.
//!
//! The poller queries `GET /system/status` immediately and then on a fixed
//! 30-second interval (no backoff). A failed poll is not an error: it
//! synthesizes the explicit fully-offline snapshot. Snapshots replace each
//! other wholesale through a watch channel.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::Smena;
use crate::observability;
use crate::types::SystemStatus;

/// Fixed polling interval.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Performs one poll, mapping any failure to the offline snapshot.
pub async fn poll_once(client: &Smena) -> SystemStatus {
    observability::STATUS_POLLS.click();
    match client.system_status().await {
        Ok(status) => status,
        Err(_) => {
            observability::STATUS_POLL_ERRORS.click();
            SystemStatus::offline()
        }
    }
}

/// Background task publishing capability snapshots.
///
/// The task itself is never cancelled mid-poll; [`StatusPoller::shutdown`]
/// tears down the interval by aborting between ticks.
pub struct StatusPoller {
    handle: JoinHandle<()>,
    rx: watch::Receiver<SystemStatus>,
}

impl StatusPoller {
    /// Spawns a poller on [`POLL_INTERVAL`].
    pub fn spawn(client: Smena) -> Self {
        Self::spawn_with_interval(client, POLL_INTERVAL)
    }

    /// Spawns a poller with a custom interval (shorter in tests).
    pub fn spawn_with_interval(client: Smena, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(SystemStatus::offline());
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let status = poll_once(&client).await;
                if tx.send(status).is_err() {
                    // All receivers gone; nothing left to inform.
                    break;
                }
            }
        });
        Self { handle, rx }
    }

    /// Returns the most recent snapshot.
    pub fn latest(&self) -> SystemStatus {
        self.rx.borrow().clone()
    }

    /// Returns a receiver for callers that want change notifications.
    pub fn subscribe(&self) -> watch::Receiver<SystemStatus> {
        self.rx.clone()
    }

    /// Waits until the first real poll result has been published.
    pub async fn ready(&mut self) {
        // The channel starts with a synthetic offline value; one change
        // means the first poll completed.
        let _ = self.rx.changed().await;
    }

    /// Tears the polling interval down.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}
