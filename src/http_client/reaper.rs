use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle};

use super::pool::{ConnectionManager, WeakConnectionManager};

/// Background task that sweeps the pool on a fixed delay: expired routes
/// first, then routes idle for at least `idle_timeout`.
pub struct IdleConnectionReaper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl IdleConnectionReaper {
    pub fn spawn(manager: &ConnectionManager, interval: Duration, idle_timeout: Duration) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(manager.downgrade(), interval, idle_timeout, shutdown_rx));
        tracing::debug!(interval = ?interval, idle_timeout = ?idle_timeout, "idle connection reaper started");
        Self { shutdown, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            tracing::warn!(error = %err, "idle connection reaper did not stop cleanly");
        }
    }
}

async fn run(
    manager: WeakConnectionManager,
    interval: Duration,
    idle_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::debug!("idle connection reaper stopped");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        let Some(manager) = manager.upgrade() else {
            tracing::trace!("connection manager dropped; idle connection reaper exiting");
            return;
        };
        sweep(&manager, idle_timeout);
    }
}

fn sweep(manager: &ConnectionManager, idle_timeout: Duration) {
    match manager.close_expired_connections() {
        Ok(0) => {}
        Ok(closed) => tracing::debug!(closed, "closed expired connections"),
        Err(err) => tracing::warn!(error = %err, "failed to close expired connections"),
    }
    match manager.close_idle_connections(idle_timeout) {
        Ok(0) => {}
        Ok(closed) => tracing::debug!(closed, "closed idle connections"),
        Err(err) => tracing::warn!(error = %err, "failed to close idle connections"),
    }
}
