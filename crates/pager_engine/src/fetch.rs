use std::time::Duration;

use futures_util::StreamExt;
use pager_core::Category;
use pager_logging::pager_debug;
use reqwest::Url;
use serde::Deserialize;

use crate::{FailureKind, FeedItem, FeedPage, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    pub subreddit: String,
    pub page_size: u32,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            subreddit: "androiddev".to_string(),
            page_size: 30,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 5 * 1024 * 1024,
            user_agent: concat!("feedpager/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Source of feed pages. `key` is the continuation key for `Before`/`After`
/// and is ignored for `Initial`.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, category: Category, key: Option<&str>) -> Result<FeedPage, FetchError>;
}

#[derive(Deserialize)]
struct ListingResponse {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
    after: Option<String>,
    before: Option<String>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: FeedItem,
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// `{base_url}/r/{subreddit}/hot.json?limit=N[&after=key|&before=key]`
    pub fn page_url(&self, category: Category, key: Option<&str>) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::new(FailureKind::InvalidUrl, "base url cannot hold a path"))?
            .pop_if_empty()
            .extend(["r", self.settings.subreddit.as_str(), "hot.json"]);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &self.settings.page_size.to_string());
            match (category, key) {
                (Category::After, Some(key)) => {
                    query.append_pair("after", key);
                }
                (Category::Before, Some(key)) => {
                    query.append_pair("before", key);
                }
                _ => {}
            }
        }
        Ok(url)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(Some(content_len)));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    fn too_large(&self, actual: Option<u64>) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual,
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl FeedFetcher for ReqwestFetcher {
    async fn fetch(&self, category: Category, key: Option<&str>) -> Result<FeedPage, FetchError> {
        let url = self.page_url(category, key)?;
        pager_debug!("fetching {} page from {}", category, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let bytes = self.read_body(response).await?;
        let listing: ListingResponse = serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;

        Ok(FeedPage {
            items: listing
                .data
                .children
                .into_iter()
                .map(|child| child.data)
                .collect(),
            after: listing.data.after,
            before: listing.data.before,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return FetchError::new(FailureKind::InvalidUrl, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
