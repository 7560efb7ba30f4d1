//! OS signal handling.
//!
//! SIGINT (Ctrl-C) everywhere and SIGTERM on Unix both resolve
//! [`shutdown_signal`]; the caller turns that into a [`Shutdown`] trigger.
//!
//! [`Shutdown`]: crate::lifecycle::Shutdown

/// Resolve when the process is asked to stop.
///
/// If a handler cannot be installed the corresponding branch never fires;
/// the failure is logged.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
