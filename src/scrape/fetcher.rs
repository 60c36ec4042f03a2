use async_trait::async_trait;
use reqwest::StatusCode;
use std::{error::Error, time::Duration};

use super::shaper::ShapedRequest;
use crate::config::ScrapeConfig;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("timed out")]
    Timeout,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("unreadable body: {0}")]
    Body(String),
}

/// Raw document returned by a fetch. Parsing happens at the call site since
/// `scraper::Html` can not be held across an await.
#[derive(Clone, Debug)]
pub struct Page {
    pub url: String,
    pub html: String,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Issue exactly one GET for the shaped request.
    async fn fetch(&self, request: &ShapedRequest) -> Result<Page, FetchError>;
}

fn get_error(error: &reqwest::Error) -> String {
    match error.source() {
        Some(e) => match e.source() {
            Some(e) => e.to_string(),
            None => e.to_string(),
        },
        None => error.to_string(),
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_builder() {
        FetchError::InvalidUrl(get_error(&error))
    } else {
        FetchError::Network(get_error(&error))
    }
}

/// `PageFetcher` backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScrapeConfig) -> anyhow::Result<Self> {
        let mut client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(10));

        if let Some(proxy) = config.proxy() {
            log::debug!("using proxy {proxy:#?}");
            client = client.proxy(reqwest::Proxy::all(&proxy)?);
        }

        Ok(Self {
            client: client.build()?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &ShapedRequest) -> Result<Page, FetchError> {
        let url = &request.url;
        let iden = format!("{}{}", url.host_str().unwrap_or_default(), url.path());

        if !request.pre_delay.is_zero() {
            log::debug!("{iden}: waiting {}ms", request.pre_delay.as_millis());
            tokio::time::sleep(request.pre_delay).await;
        }

        log::debug!("{iden}: requesting");

        let resp = self
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, request.identity.as_str())
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            log::debug!("{iden}: {:?}", status.to_string());
            return Err(FetchError::Status(status.as_u16()));
        }

        // we might get OK, but no text response.
        let bytes = resp.bytes().await.map_err(|err| {
            if err.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(get_error(&err))
            }
        })?;

        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Err(FetchError::Body("empty response".into()));
        }

        Ok(Page {
            url: url.to_string(),
            html: String::from_utf8_lossy(&bytes).to_string(),
        })
    }
}
