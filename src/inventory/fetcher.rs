use crate::esi::{ApiError, ApiResult, Page};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per request, the first one included
    pub max_attempts: u32,
    /// Upper bound of the randomized pause between attempts
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            max_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> Duration {
        let max = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::rng().random_range(0..=max))
    }
}

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("{stage}: retries exceeded on page {page} after {attempts} attempts: {last}")]
    RetriesExceeded {
        stage: &'static str,
        page: u32,
        attempts: u32,
        last: ApiError,
    },
}

/// Runs `request` until it succeeds or the policy's attempt ceiling is hit.
pub async fn with_retry<T, F, Fut>(stage: &'static str, page: u32, policy: &RetryPolicy, mut request: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut attempt = 1;
    loop {
        let err = match request().await {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };

        if err.is_rate_limited() {
            tracing::warn!(stage, page, attempt, error = %err, "rate limited by upstream");
        } else {
            tracing::warn!(stage, page, attempt, error = %err, "upstream request failed");
        }

        if attempt >= policy.max_attempts {
            tracing::error!(stage, page, attempts = attempt, "retries exceeded");
            return Err(FetchError::RetriesExceeded {
                stage,
                page,
                attempts: attempt,
                last: err,
            });
        }

        attempt += 1;
        tokio::time::sleep(policy.backoff()).await;
    }
}

/// Fetches every page of a listing, 1-indexed, in page order.
///
/// The page count is taken from each response, so a listing that shrinks while it is being read
/// ends early and one that grows is followed. Any page that exhausts its retries aborts the whole
/// fetch and the pages read so far are discarded.
pub async fn fetch_all_pages<T, F, Fut>(stage: &'static str, policy: &RetryPolicy, mut fetch_page: F) -> Result<Vec<T>, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut total_pages = 1;
    let mut page = 1;

    while page <= total_pages {
        let fetched = with_retry(stage, page, policy, || fetch_page(page)).await?;
        total_pages = fetched.total_pages;
        items.extend(fetched.items);
        page += 1;
    }

    tracing::debug!(stage, pages = total_pages, items = items.len(), "fetched all pages");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn flaky() -> ApiError {
        ApiError::Status {
            status: 502,
            body: "bad gateway".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_two_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let policy = RetryPolicy::default();
        let started = tokio::time::Instant::now();

        let items = fetch_all_pages("assets", &policy, move |page| {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    return Err(flaky());
                }
                Ok(Page {
                    items: vec![page * 10],
                    total_pages: 2,
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![10, 20]);
        // two retries on page 1, one call for page 2
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // two backoff pauses, each at most max_backoff
        assert!(started.elapsed() <= policy.max_backoff * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_five_attempts_on_a_page() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        let err = fetch_all_pages::<u32, _, _>("blueprints", &RetryPolicy::default(), move |page| {
            c.fetch_add(1, Ordering::SeqCst);
            async move {
                if page == 1 {
                    return Ok(Page {
                        items: vec![1],
                        total_pages: 3,
                    });
                }
                Err(ApiError::Status {
                    status: 420,
                    body: "error limited".into(),
                })
            }
        })
        .await
        .unwrap_err();

        let FetchError::RetriesExceeded { stage, page, attempts, last } = err;
        assert_eq!(stage, "blueprints");
        assert_eq!(page, 2);
        assert_eq!(attempts, 5);
        assert!(last.is_rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), 1 + 5);
    }

    #[tokio::test(start_paused = true)]
    async fn follows_page_count_changes() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        // Reports 3 pages at first, then shrinks to 2 while page 2 is read
        let items = fetch_all_pages("assets", &RetryPolicy::default(), move |page| {
            c.fetch_add(1, Ordering::SeqCst);
            async move {
                let total_pages = if page == 1 { 3 } else { 2 };
                Ok(Page {
                    items: vec![page],
                    total_pages,
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn with_retry_returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let v = with_retry("divisions", 1, &RetryPolicy::default(), move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move { if n == 0 { Err(ApiError::Transport("reset".into())) } else { Ok(7) } }
        })
        .await
        .unwrap();
        assert_eq!(v, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
