//! Seed document sources
//!
//! The seed procedure reads four JSON documents: three place lists and the
//! neighborhood metadata. A source only knows how to fetch one document by
//! name; loading all four under a deadline is done by `load_seed_documents`.

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, TripError};

pub const ATTRACTIONS: &str = "attractions";
pub const RESTAURANTS: &str = "restaurants";
pub const MT_FUJI: &str = "mt-fuji";
pub const NEIGHBORHOODS: &str = "neighborhoods";

/// Where seed documents come from
#[async_trait]
pub trait SeedSource: Send + Sync {
    /// Fetch and parse one document by name (without extension)
    async fn load_document(&self, name: &str) -> Result<Value>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;
}

/// Reads `<dir>/<name>.json` from the local filesystem
#[derive(Debug, Clone)]
pub struct DirectorySeedSource {
    dir: PathBuf,
}

impl DirectorySeedSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SeedSource for DirectorySeedSource {
    async fn load_document(&self, name: &str) -> Result<Value> {
        let path = self.dir.join(format!("{}.json", name));
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| TripError::seed_source(name, format!("{:?}: {}", path, e)))?;

        serde_json::from_str(&content).map_err(|e| TripError::seed_source(name, e))
    }

    fn describe(&self) -> String {
        format!("directory {:?}", self.dir)
    }
}

/// Fetches `<base_url>/data/<name>.json` over HTTP
#[derive(Debug, Clone)]
pub struct HttpSeedSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSeedSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn document_url(&self, name: &str) -> String {
        format!("{}/data/{}.json", self.base_url, name)
    }
}

#[async_trait]
impl SeedSource for HttpSeedSource {
    async fn load_document(&self, name: &str) -> Result<Value> {
        let url = self.document_url(name);
        log::debug!("Fetching seed document {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TripError::seed_source(name, e))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| TripError::seed_source(name, e))
    }

    fn describe(&self) -> String {
        format!("http {}", self.base_url)
    }
}

/// The loaded documents, not yet converted to records
#[derive(Debug, Clone)]
pub struct SeedDocuments {
    /// Raw place records from all place documents, concatenated as attractions, restaurants, mt-fuji
    pub places: Vec<Value>,
    pub neighborhoods: Value,
}

async fn load_with_deadline(source: &dyn SeedSource, name: &str, timeout: Duration) -> Result<Value> {
    match tokio::time::timeout(timeout, source.load_document(name)).await {
        Ok(result) => result,
        Err(_) => Err(TripError::seed_source(
            name,
            format!("timed out after {}s", timeout.as_secs_f32()),
        )),
    }
}

fn place_records(name: &str, document: Value) -> Result<Vec<Value>> {
    match document {
        Value::Array(records) => Ok(records),
        _ => Err(TripError::seed_source(name, "expected an array of place records")),
    }
}

/// Load all four documents concurrently, each bounded by `timeout`.
/// Any failure aborts the load and names the document.
pub async fn load_seed_documents(source: &dyn SeedSource, timeout: Duration) -> Result<SeedDocuments> {
    let (attractions, restaurants, mt_fuji, neighborhoods) = tokio::try_join!(
        load_with_deadline(source, ATTRACTIONS, timeout),
        load_with_deadline(source, RESTAURANTS, timeout),
        load_with_deadline(source, MT_FUJI, timeout),
        load_with_deadline(source, NEIGHBORHOODS, timeout),
    )?;

    let mut places = place_records(ATTRACTIONS, attractions)?;
    places.extend(place_records(RESTAURANTS, restaurants)?);
    places.extend(place_records(MT_FUJI, mt_fuji)?);

    Ok(SeedDocuments {
        places,
        neighborhoods,
    })
}
