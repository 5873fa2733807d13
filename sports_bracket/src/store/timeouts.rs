//! Query timeout helpers
//!
//! Every PostgreSQL call runs under a deadline so no operation blocks
//! indefinitely. An expired deadline surfaces as a `Connection` error.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::errors::{DomainError, DomainResult};

/// Default timeout for transactions (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Execute a query with timeout, classifying driver errors
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sports_bracket::store::timeouts::with_timeout;
/// # use sqlx::PgPool;
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
///
/// let result = with_timeout(
///     Duration::from_secs(5),
///     sqlx::query("SELECT * FROM matches WHERE id = $1")
///         .bind(1)
///         .fetch_optional(pool)
/// ).await?;
///
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> DomainResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(DomainError::from(e)),
        Err(_) => Err(DomainError::timeout(duration)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_transaction_timeout() {
        assert_eq!(DEFAULT_TRANSACTION_TIMEOUT.as_secs(), 10);
    }

    #[tokio::test]
    async fn test_elapsed_deadline_is_connection_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, sqlx::Error>(1)
        };
        let err = with_timeout(Duration::from_millis(10), slow)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_driver_errors_are_classified() {
        let failing = async { Err::<i32, _>(sqlx::Error::RowNotFound) };
        let err = with_timeout(Duration::from_secs(1), failing)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let ok = async { Ok::<_, sqlx::Error>(7) };
        assert_eq!(with_timeout(Duration::from_secs(1), ok).await.unwrap(), 7);
    }
}
