//! OS signal handling.
//!
//! Ctrl-C requests cancellation. A transaction already broadcast stays
//! broadcast; the watcher stops at its next poll boundary.

use crate::lifecycle::cancel::CancelHandle;
use std::sync::Arc;

/// Spawn a task that cancels `handle` on Ctrl-C.
pub fn cancel_on_ctrl_c(handle: Arc<CancelHandle>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupt received, cancelling at the next safe point");
                handle.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    })
}
