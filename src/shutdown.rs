use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Returns a token that is cancelled once SIGINT or SIGTERM arrives.
/// Subsystems watch the token and drain instead of handling signals
/// themselves.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let signal_token = token.clone();

    tokio::spawn(async move {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("received SIGINT, initiating graceful shutdown"),
            _ = terminate => tracing::info!("received SIGTERM, initiating graceful shutdown"),
        }

        signal_token.cancel();
    });

    token
}
