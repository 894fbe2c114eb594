//! Fixed-interval polling with a wall-clock budget.

use crate::error::{JobError, JobResult};
use crate::provider::{PollStatus, Provider, ProviderError};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Poll `request_id` until it completes, fails or runs out of time.
///
/// `started` is the moment the request was submitted. Each round waits
/// `interval` and then polls. HTTP and transport errors are logged and
/// retried. An explicit failure or a malformed response ends polling at
/// once. Returns the result URLs of a completed request.
pub async fn poll_until_complete<P: Provider + ?Sized>(
    provider: &P,
    request_id: &str,
    started: Instant,
    interval: Duration,
    timeout: Duration,
) -> JobResult<Vec<String>> {
    let mut attempt = 0u32;
    loop {
        let elapsed = started.elapsed();
        if elapsed >= timeout {
            warn!(request_id, attempts = attempt, "polling timed out");
            return Err(JobError::Timeout { elapsed });
        }
        sleep(interval).await;
        attempt += 1;

        let response = match provider.poll_result(request_id).await {
            Ok(response) => response,
            Err(e) if e.is_transient() => {
                warn!(request_id, attempt, error = %e, "transient poll failure, retrying");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match response.status {
            PollStatus::Pending => debug!(request_id, attempt, "still pending"),
            PollStatus::Completed if response.output_urls.is_empty() => {
                return Err(ProviderError::Malformed("completed without an output URL".into()).into());
            }
            PollStatus::Completed => return Ok(response.output_urls),
            PollStatus::Failed => {
                let detail = response.error.unwrap_or_else(|| "no details given".to_string());
                return Err(ProviderError::Failed(detail).into());
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::{EditRequest, PollResponse, ProviderResult};
    use canvasforge_core::storage::BoxFuture;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Provider replaying scripted poll responses. Once the script is
    /// exhausted it reports pending forever.
    #[derive(Default)]
    pub(crate) struct ScriptedPolls {
        pub script: RefCell<VecDeque<ProviderResult<PollResponse>>>,
        pub polls: Cell<u32>,
    }

    impl ScriptedPolls {
        pub fn new(script: Vec<ProviderResult<PollResponse>>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                polls: Cell::new(0),
            }
        }
    }

    impl Provider for ScriptedPolls {
        fn upload_binary(&self, _png: Vec<u8>) -> BoxFuture<'_, ProviderResult<String>> {
            Box::pin(async { Ok("https://cdn/upload.png".to_string()) })
        }

        fn submit_edit(&self, _request: EditRequest) -> BoxFuture<'_, ProviderResult<String>> {
            Box::pin(async { Ok("req-1".to_string()) })
        }

        fn submit_generate(&self, _prompt: &str) -> BoxFuture<'_, ProviderResult<String>> {
            Box::pin(async { Ok("req-1".to_string()) })
        }

        fn poll_result(&self, _request_id: &str) -> BoxFuture<'_, ProviderResult<PollResponse>> {
            Box::pin(async move {
                self.polls.set(self.polls.get() + 1);
                self.script
                    .borrow_mut()
                    .pop_front()
                    .unwrap_or_else(|| Ok(PollResponse::pending()))
            })
        }

        fn download(&self, url: &str) -> BoxFuture<'_, ProviderResult<Vec<u8>>> {
            let url = url.to_string();
            Box::pin(async move { Err(ProviderError::Transport(format!("no download for {url}"))) })
        }
    }

    const INTERVAL: Duration = Duration::from_secs(5);
    const TIMEOUT: Duration = Duration::from_secs(180);

    #[tokio::test(start_paused = true)]
    async fn test_failed_first_poll_is_provider_error() {
        let provider = ScriptedPolls::new(vec![Ok(PollResponse::failed("content policy"))]);
        let started = Instant::now();
        let err = poll_until_complete(&provider, "r", started, INTERVAL, TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err, JobError::Provider(ProviderError::Failed("content policy".into())));
        assert_eq!(provider.polls.get(), 1);
        assert_eq!(started.elapsed(), INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_forever_times_out() {
        let provider = ScriptedPolls::new(vec![]);
        let started = Instant::now();
        let err = poll_until_complete(&provider, "r", started, INTERVAL, TIMEOUT)
            .await
            .unwrap_err();
        let JobError::Timeout { elapsed } = err else {
            panic!("expected timeout, got {err:?}");
        };
        assert!(elapsed >= TIMEOUT);
        assert!(elapsed < TIMEOUT + INTERVAL);
        assert_eq!(provider.polls.get(), 36);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let provider = ScriptedPolls::new(vec![
            Err(ProviderError::Http { status: 503, message: "busy".into() }),
            Ok(PollResponse::pending()),
            Err(ProviderError::Transport("reset".into())),
            Ok(PollResponse::completed(vec!["https://x/out.png".into()])),
        ]);
        let urls = poll_until_complete(&provider, "r", Instant::now(), INTERVAL, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://x/out.png".to_string()]);
        assert_eq!(provider.polls.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_without_output_is_malformed() {
        let provider = ScriptedPolls::new(vec![Ok(PollResponse::completed(vec![]))]);
        let err = poll_until_complete(&provider, "r", Instant::now(), INTERVAL, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Provider(ProviderError::Malformed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_poll_is_terminal() {
        let provider = ScriptedPolls::new(vec![Err(ProviderError::Malformed("no status".into()))]);
        let err = poll_until_complete(&provider, "r", Instant::now(), INTERVAL, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Provider(ProviderError::Malformed(_))));
        assert_eq!(provider.polls.get(), 1);
    }
}
