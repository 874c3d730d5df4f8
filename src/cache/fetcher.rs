//! Network access for the offline cache

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;

use crate::error::{Result, TripError};

/// A response as seen by the cache layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// 2xx
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs live GET requests. Errors mean the network was unreachable,
/// not that the server answered with an error status.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| TripError::Network {
            url: String::new(),
            message: format!("Failed to create HTTP client: {}", e),
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse> {
        let network_error = |e: reqwest::Error| TripError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url.clone()).send().await.map_err(network_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(network_error)?;

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}
