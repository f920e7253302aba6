use tokio::task::JoinHandle;
use tracing::{Level, span};

/// A wrapper around `tokio::task::spawn_blocking` that wraps the
/// function into the parent `Span` from `tracing`.
#[inline]
pub fn spawn_blocking<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let current_span = span!(Level::TRACE, "spawn_blocking");

    tokio::task::spawn_blocking(move || {
        let _entered_span = current_span.enter();

        f()
    })
}
