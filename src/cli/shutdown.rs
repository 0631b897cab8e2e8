//! Interruption handling.
//!
//! Resolves when the process receives SIGINT or SIGTERM. Racing work against
//! this future and dropping the loser is what tears a run down: an in-flight
//! `codesign` or `productsign` child is killed and the scratch directory
//! guard runs its finalizer.

use crate::error::{Result, SignError};
use tokio::signal::unix::{SignalKind, signal};

/// Wait for SIGINT or SIGTERM and return its name.
///
/// Never resolves if the handlers cannot be installed.
pub(crate) async fn shutdown_signal() -> &'static str {
    let handlers = signal(SignalKind::interrupt())
        .and_then(|interrupt| Ok((interrupt, signal(SignalKind::terminate())?)));

    let (mut interrupt, mut terminate) = match handlers {
        Ok(handlers) => handlers,
        Err(e) => {
            log::warn!("Could not install signal handlers: {}", e);
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}

/// Run `work` to completion unless a shutdown signal arrives first.
///
/// Once installed, the handlers replace the default terminate action for the
/// rest of the process, so everything after the first signal-sensitive step
/// has to run in here.
pub(crate) async fn interruptible<T>(work: impl Future<Output = Result<T>>) -> Result<T> {
    // signal branch first, so handlers exist before `work` is polled
    tokio::select! {
        biased;
        signal = shutdown_signal() => Err(SignError::Interrupted { signal }),
        result = work => result,
    }
}
