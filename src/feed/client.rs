//! HTTP client for the MTA realtime feeds

use std::time::Duration;

use prost::Message;
use tracing::debug;

use super::proto::FeedMessage;
use crate::error::{Error, Result};

pub const DEFAULT_FEED_BASE_URL: &str = "http://datamine.mta.info/mta_esi.php";

/// Subway feeds listed at datamine.mta.info/list-of-feeds.
pub const DEFAULT_FEED_IDS: [u32; 6] = [1, 2, 16, 21, 26, 31];

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub api_key: String,
    pub base_url: String,
    pub feed_ids: Vec<u32>,
    pub timeout: Duration,
}

impl FeedConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_FEED_BASE_URL.to_string(),
            feed_ids: DEFAULT_FEED_IDS.to_vec(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    config: FeedConfig,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self { http, config })
    }

    pub fn feed_ids(&self) -> &[u32] {
        &self.config.feed_ids
    }

    pub fn feed_url(&self, feed_id: u32) -> String {
        format!(
            "{}?key={}&feed_id={}",
            self.config.base_url, self.config.api_key, feed_id
        )
    }

    /// Download and decode one feed.
    pub async fn fetch(&self, feed_id: u32) -> Result<FeedMessage> {
        let request_error = |source| Error::FeedRequest { feed_id, source };

        let body = self
            .http
            .get(self.feed_url(feed_id))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(request_error)?
            .bytes()
            .await
            .map_err(request_error)?;

        debug!("Feed {}: received {} bytes", feed_id, body.len());
        FeedMessage::decode(body).map_err(|source| Error::FeedDecode { feed_id, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_url_carries_key_and_id() {
        let client = FeedClient::new(FeedConfig {
            base_url: "http://feeds.test/gtfs".to_string(),
            ..FeedConfig::new("secret")
        })
        .unwrap();
        assert_eq!(client.feed_url(16), "http://feeds.test/gtfs?key=secret&feed_id=16");
        assert_eq!(client.feed_ids(), DEFAULT_FEED_IDS);
    }

    #[tokio::test]
    async fn unreachable_feed_is_a_request_error() {
        let client = FeedClient::new(FeedConfig {
            base_url: "http://127.0.0.1:9/unreachable".to_string(),
            timeout: Duration::from_millis(500),
            ..FeedConfig::new("key")
        })
        .unwrap();
        let err = client.fetch(1).await.unwrap_err();
        assert!(matches!(err, Error::FeedRequest { feed_id: 1, .. }));
    }
}
