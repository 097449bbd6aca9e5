use std::sync::Arc;

use async_trait::async_trait;
use reqwest_cookie_store::CookieStoreMutex;
use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("reqwest middleware error: {0}")]
    ReqwestMiddlewareError(#[from] reqwest_middleware::Error),
}

/// Page/script fetch capability the pipeline is handed. Production code uses
/// [`HttpClient`]; tests substitute canned page text.
#[async_trait]
pub trait Fetch {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Wrapper around `reqwest::Client` with a shared cookie store. The
/// extraction pipeline itself never retries; `with_retries` exists for
/// callers that want transient transport errors retried below it.
pub struct HttpClient {
    pub client: ClientWithMiddleware,
    pub cookies: Arc<CookieStoreMutex>,
}

impl HttpClient {
    pub fn new() -> reqwest::Result<HttpClient> {
        Self::build(None)
    }

    pub fn with_retries(max_retries: u32) -> reqwest::Result<HttpClient> {
        Self::build(Some(max_retries))
    }

    fn build(max_retries: Option<u32>) -> reqwest::Result<HttpClient> {
        let cookies = Arc::new(CookieStoreMutex::default());

        let client = reqwest::Client::builder()
            .cookie_provider(cookies.clone())
            .build()?;

        let mut builder = reqwest_middleware::ClientBuilder::new(client);
        if let Some(max_retries) = max_retries {
            let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(HttpClient {
            client: builder.build(),
            cookies,
        })
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.client
            .get(url)
            .send()
            .await?
            .text()
            .await
            .map_err(|e| e.into())
    }
}
