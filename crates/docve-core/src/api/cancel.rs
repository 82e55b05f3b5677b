use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ApiError;

/// Run `request` until it finishes or `token` is cancelled, whichever comes
/// first. On cancellation the request future is dropped, which aborts the
/// HTTP exchange, and `ApiError::Cancelled` is returned.
pub async fn run_cancellable<T, F>(token: &CancellationToken, request: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!("Request cancelled");
            Err(ApiError::Cancelled)
        }
        result = request => result,
    }
}
