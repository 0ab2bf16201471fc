//! Periodic refresh task
//!
//! Runs [`TldEngine::run_with_shutdown`] on its own tokio task. The task
//! talks to the engine only through `refresh()`.

use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::TldEngine;
use crate::error::{Error, Result};

/// Handle to a running periodic refresh
///
/// Dropping the handle without calling [`RefreshTask::stop`] also ends the
/// loop at its next wake-up, but does not wait for it.
pub struct RefreshTask {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl RefreshTask {
    /// Spawn a refresh every `refresh_interval_secs` of the engine's config
    pub fn spawn(engine: TldEngine) -> Result<Self> {
        let period = engine.refresh_period();
        Self::with_period(engine, period)
    }

    /// Spawn a refresh every `period`
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` for a zero period.
    pub fn with_period(engine: TldEngine, period: Duration) -> Result<Self> {
        check_period(period)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle =
            tokio::spawn(async move { engine.run_with_shutdown(period, shutdown_rx).await });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }

    /// Whether the loop has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the loop and wait for it to exit
    ///
    /// A refresh in progress is allowed to finish first.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            // Already exited if the receiver is gone
            let _ = tx.send(());
        }

        self.handle
            .await
            .map_err(|e| Error::Other(format!("Refresh task failed to join: {}", e)))?
    }
}

/// A refresh period must be non-zero
pub(crate) fn check_period(period: Duration) -> Result<()> {
    if period.is_zero() {
        return Err(Error::invalid_input("Refresh period must be greater than zero"));
    }
    Ok(())
}
