use std::future::Future;
use std::time::Duration;

use crate::AuthError;

/// Run `fut` with a deadline.
///
/// Errors from the future are converted into [`AuthError`]; an elapsed
/// deadline becomes [`AuthError::Timeout`] and drops the future.
///
/// # Errors
///
/// Returns the future's error, or `Timeout` when `after` elapses first.
pub async fn bounded<T, E, F>(
    operation: &'static str,
    after: Duration,
    fut: F,
) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, E>>,
    AuthError: From<E>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result.map_err(AuthError::from),
        Err(_) => {
            tracing::warn!(operation, ?after, "Downstream call exceeded deadline");
            Err(AuthError::Timeout { operation, after })
        }
    }
}
