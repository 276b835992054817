use std::sync::Arc;
use std::time::Duration;

use binder_core::FetchOutcome;

use crate::extract::{Extractor, SelectorExtractor};

/// Transport knobs for the chapter fetcher. No orchestration-level timeout
/// exists beyond these per-request limits.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("binder/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// One classified network round trip per call. No retries at this layer;
/// retrying is a job-level concept driven by the failure report.
#[async_trait::async_trait]
pub trait ChapterFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// reqwest-backed fetcher that maps every outcome of fetch + extraction
/// onto a [`FetchOutcome`] variant.
pub struct ReqwestChapterFetcher {
    client: reqwest::Client,
    extractor: Arc<dyn Extractor>,
}

impl ReqwestChapterFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, reqwest::Error> {
        Self::with_extractor(settings, Arc::new(SelectorExtractor::default()))
    }

    pub fn with_extractor(
        settings: &FetchSettings,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client, extractor })
    }
}

#[async_trait::async_trait]
impl ChapterFetcher for ReqwestChapterFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let parsed = match url::Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => {
                return FetchOutcome::TransportFailure {
                    message: err.to_string(),
                }
            }
        };

        let response = match self.client.get(parsed).send().await {
            Ok(response) => response,
            Err(err) => {
                return FetchOutcome::TransportFailure {
                    message: err.to_string(),
                }
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            // 403 from these hosts is an anti-automation challenge, not a
            // generic server error.
            return FetchOutcome::Blocked;
        }
        if !status.is_success() {
            return FetchOutcome::TransportStatus {
                code: status.as_u16(),
            };
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return FetchOutcome::TransportFailure {
                    message: err.to_string(),
                }
            }
        };

        match self.extractor.extract(&body) {
            Some(chapter) => FetchOutcome::Success {
                title: chapter.title,
                content: chapter.content,
            },
            None => FetchOutcome::ContentMissing,
        }
    }
}
