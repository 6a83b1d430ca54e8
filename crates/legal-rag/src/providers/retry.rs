//! Exponential-backoff retry for outbound HTTP calls

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// A failed attempt, tagged with whether trying again can help
#[derive(Debug)]
pub(crate) enum Attempt {
    /// Connection failure, timeout, 5xx or 429
    Transient(Error),
    /// Anything a retry would only repeat
    Permanent(Error),
}

impl Attempt {
    /// Classify a request that never got a response.
    ///
    /// `wrap` receives the error with its URL stripped.
    pub(crate) fn send_failed(err: reqwest::Error, wrap: impl FnOnce(reqwest::Error) -> Error) -> Self {
        let transient = err.is_connect() || err.is_timeout();
        let error = wrap(err.without_url());
        if transient {
            Self::Transient(error)
        } else {
            Self::Permanent(error)
        }
    }

    /// Classify a non-success response status
    pub(crate) fn status_failed(status: StatusCode, error: Error) -> Self {
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Self::Transient(error)
        } else {
            Self::Permanent(error)
        }
    }
}

impl From<Error> for Attempt {
    fn from(err: Error) -> Self {
        Self::Permanent(err)
    }
}

/// Run `operation` up to `max_retries + 1` times, sleeping 2^attempt
/// seconds between transient failures
pub(crate) async fn retry_request<F, Fut, T>(max_retries: u32, label: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, Attempt>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(Attempt::Transient(e)) if attempt < max_retries => {
                let delay = Duration::from_secs(2u64.pow(attempt));
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {:?}",
                    label,
                    attempt + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(Attempt::Transient(e)) | Err(Attempt::Permanent(e)) => return Err(e),
        }
    }
}
