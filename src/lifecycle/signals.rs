//! OS signal handling.

/// Resolve on Ctrl-C (SIGINT). Errors installing the handler resolve immediately so the
/// caller still tears down cleanly.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
}
