use std::{future::Future, time::Duration};

/// Per-call knobs accepted by every query and mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub skip_auth: bool,
    pub timeout: Option<Duration>,
    pub retries: u32,
}

impl RequestOptions {
    pub fn new() -> Self { Self::default() }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Runs `fut` under this request's timeout. A future that overruns is
    /// dropped and `elapsed` builds the error.
    pub async fn bounded<T, E, Fut>(
        &self, fut: Fut, elapsed: impl FnOnce(Duration) -> E,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        match self.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(elapsed(limit)),
                }
            }
            None => fut.await,
        }
    }
}
