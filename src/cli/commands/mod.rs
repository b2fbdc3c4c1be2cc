//! CLI command implementations.

pub mod read;
pub mod spec;
pub mod write;

use tokio_util::sync::CancellationToken;

/// Token cancelled on Ctrl-C.
pub(crate) fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            trigger.cancel();
        }
    });
    token
}
