//! # Cross-platform termination signals.
//!
//! [`wait_for_shutdown_signal`] completes when the process receives a
//! termination signal. [`Engine::run_until_signal`](crate::Engine::run_until_signal)
//! races it against nothing else: the engine runs until told to stop.
//!
//! ## Signals
//! **Unix:** `SIGINT` (Ctrl-C), `SIGTERM` (systemd, Kubernetes), `SIGQUIT`.
//!
//! **Elsewhere:** Ctrl-C via [`tokio::signal::ctrl_c`].

use crate::error::RuntimeError;

/// Waits for a termination signal.
///
/// Each call registers independent listeners; registration failure is a
/// [`RuntimeError::Signal`].
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> Result<&'static str, RuntimeError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for a termination signal.
///
/// Registration failure is a [`RuntimeError::Signal`].
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> Result<&'static str, RuntimeError> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
