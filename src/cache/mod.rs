//! Offline cache layer
//!
//! Fronts network requests so the app keeps working without connectivity.
//! One named cache generation is current at a time; `activate` deletes all
//! others. Per request class:
//! - sync traffic passes through untouched
//! - map tiles are network only, with a fallback to a copy already cached
//! - third-party assets are cache first and stored after a successful fetch
//! - first-party assets are network first, refreshed in the cache on success,
//!   and failed navigations fall back to the cached root document

pub mod fetcher;
pub mod policy;
pub mod storage;

use futures_util::future::try_join_all;
use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::{Result, TripError};

pub use fetcher::{FetchResponse, Fetcher, HttpFetcher};
pub use policy::{CachePolicy, RequestClass};
pub use storage::CacheStorage;

/// An intercepted request
#[derive(Debug, Clone)]
pub struct CacheRequest {
    pub url: Url,
    pub method: String,
    /// Top-level page navigation
    pub is_navigation: bool,
}

impl CacheRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: "GET".to_string(),
            is_navigation: false,
        }
    }

    pub fn navigate(url: Url) -> Self {
        Self {
            is_navigation: true,
            ..Self::get(url)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServedFrom {
    Network,
    Cache,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheResponse {
    /// Not intercepted; the caller performs the request itself
    Passthrough,
    Served {
        response: FetchResponse,
        source: ServedFrom,
    },
}

impl CacheResponse {
    fn network(response: FetchResponse) -> Self {
        CacheResponse::Served {
            response,
            source: ServedFrom::Network,
        }
    }

    fn cached(response: FetchResponse) -> Self {
        CacheResponse::Served {
            response,
            source: ServedFrom::Cache,
        }
    }
}

pub struct OfflineCache {
    config: CacheConfig,
    origin: Url,
    policy: CachePolicy,
    storage: Arc<CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
}

impl OfflineCache {
    pub fn new(config: CacheConfig, storage: Arc<CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let origin = Url::parse(&config.origin)
            .map_err(|e| TripError::InvalidInput(format!("invalid cache origin '{}': {}", config.origin, e)))?;

        Ok(Self {
            policy: CachePolicy::new(&config),
            config,
            origin,
            storage,
            fetcher,
        })
    }

    pub fn generation(&self) -> &str {
        &self.config.generation
    }

    /// Resolve an app-relative path (e.g. `./index.html`) against the origin
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.origin
            .join(path)
            .map_err(|e| TripError::InvalidInput(format!("invalid asset path '{}': {}", path, e)))
    }

    /// Precache the app shell and third-party assets into the current generation.
    /// Nothing is stored unless every asset fetched successfully.
    pub async fn install(&self) -> Result<usize> {
        log::info!("Installing offline cache {}", self.config.generation);

        let mut urls = Vec::new();
        for path in &self.config.app_shell {
            urls.push(self.resolve(path)?);
        }
        for asset in &self.config.third_party_assets {
            urls.push(Url::parse(asset).map_err(|e| {
                TripError::InvalidInput(format!("invalid third-party asset '{}': {}", asset, e))
            })?);
        }

        let responses = try_join_all(urls.iter().map(|url| async move {
            let response = self.fetcher.fetch(url).await?;
            if response.is_ok() {
                Ok((url, response))
            } else {
                Err(TripError::Network {
                    url: url.to_string(),
                    message: format!("precache got status {}", response.status),
                })
            }
        }))
        .await?;

        for (url, response) in &responses {
            self.storage.put(&self.config.generation, url.as_str(), response)?;
        }

        log::info!("Precached {} assets", responses.len());
        Ok(responses.len())
    }

    /// Delete every generation other than the current one
    pub fn activate(&self) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .storage
            .cache_names()?
            .into_iter()
            .filter(|name| name != &self.config.generation)
            .collect();

        for name in &stale {
            let removed = self.storage.delete_cache(name)?;
            log::info!("Deleted stale cache {} ({} entries)", name, removed);
        }
        Ok(stale)
    }

    pub async fn handle(&self, request: &CacheRequest) -> Result<CacheResponse> {
        let class = self.policy.classify(&request.url);
        if class == RequestClass::Sync || !request.method.eq_ignore_ascii_case("GET") {
            return Ok(CacheResponse::Passthrough);
        }

        match class {
            RequestClass::Sync => Ok(CacheResponse::Passthrough),
            RequestClass::MapTile => self.network_only(request).await,
            RequestClass::ThirdParty => self.cache_first(request).await,
            RequestClass::FirstParty => self.network_first(request).await,
        }
    }

    fn lookup(&self, url: &Url) -> Result<Option<FetchResponse>> {
        self.storage.get(&self.config.generation, url.as_str())
    }

    async fn network_only(&self, request: &CacheRequest) -> Result<CacheResponse> {
        match self.fetcher.fetch(&request.url).await {
            Ok(response) => Ok(CacheResponse::network(response)),
            Err(e) => match self.lookup(&request.url)? {
                Some(cached) => {
                    log::debug!("Tile offline, serving cached copy of {}", request.url);
                    Ok(CacheResponse::cached(cached))
                }
                None => Err(e),
            },
        }
    }

    async fn cache_first(&self, request: &CacheRequest) -> Result<CacheResponse> {
        if let Some(cached) = self.lookup(&request.url)? {
            return Ok(CacheResponse::cached(cached));
        }

        let response = self.fetcher.fetch(&request.url).await?;
        if response.is_ok() {
            self.storage.put(&self.config.generation, request.url.as_str(), &response)?;
        }
        Ok(CacheResponse::network(response))
    }

    async fn network_first(&self, request: &CacheRequest) -> Result<CacheResponse> {
        let error = match self.fetcher.fetch(&request.url).await {
            Ok(response) => {
                if response.is_ok() {
                    self.storage.put(&self.config.generation, request.url.as_str(), &response)?;
                }
                return Ok(CacheResponse::network(response));
            }
            Err(e) => e,
        };

        if let Some(cached) = self.lookup(&request.url)? {
            log::warn!("Offline, serving cached {}", request.url);
            return Ok(CacheResponse::cached(cached));
        }

        if request.is_navigation {
            let root = self.resolve(&self.config.root_document)?;
            if let Some(shell) = self.lookup(&root)? {
                log::warn!("Offline navigation to {}, serving app shell", request.url);
                return Ok(CacheResponse::cached(shell));
            }
        }

        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Serves from a fixed map, or fails everything while offline
    #[derive(Default)]
    struct MockFetcher {
        pages: HashMap<String, FetchResponse>,
        offline: AtomicBool,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.pages
                .insert(url.to_string(), FetchResponse::new(200, Some("text/plain"), body.to_string()));
            self
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(TripError::Network {
                    url: url.to_string(),
                    message: "offline".to_string(),
                });
            }
            Ok(self
                .pages
                .get(url.as_str())
                .cloned()
                .unwrap_or_else(|| FetchResponse::new(404, None, "")))
        }
    }

    fn small_config() -> CacheConfig {
        CacheConfig {
            generation: "v2".to_string(),
            app_shell: vec!["./".to_string(), "./index.html".to_string()],
            third_party_assets: vec!["https://unpkg.com/vue@3/dist/vue.global.prod.js".to_string()],
            ..CacheConfig::default()
        }
    }

    fn online_fetcher() -> MockFetcher {
        MockFetcher::default()
            .with("http://localhost:8080/", "root")
            .with("http://localhost:8080/index.html", "shell")
            .with("https://unpkg.com/vue@3/dist/vue.global.prod.js", "vue")
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let storage = Arc::new(CacheStorage::open_in_memory().unwrap());
        let fetcher = Arc::new(MockFetcher::default().with("http://localhost:8080/", "root"));
        let cache = OfflineCache::new(small_config(), storage.clone(), fetcher).unwrap();

        assert!(cache.install().await.is_err());
        assert!(storage.keys("v2").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_removes_other_generations() {
        let storage = Arc::new(CacheStorage::open_in_memory().unwrap());
        storage.put("v1", "http://localhost:8080/", &FetchResponse::new(200, None, "old")).unwrap();

        let cache = OfflineCache::new(small_config(), storage.clone(), Arc::new(online_fetcher())).unwrap();
        assert_eq!(cache.install().await.unwrap(), 3);
        assert_eq!(cache.activate().unwrap(), vec!["v1".to_string()]);
        assert_eq!(storage.cache_names().unwrap(), vec!["v2".to_string()]);
    }

    #[tokio::test]
    async fn test_sync_and_writes_pass_through() {
        let storage = Arc::new(CacheStorage::open_in_memory().unwrap());
        let cache = OfflineCache::new(small_config(), storage, Arc::new(online_fetcher())).unwrap();

        let sync = CacheRequest::get(url("https://zc53qry44.dexie.cloud/sync"));
        assert_eq!(cache.handle(&sync).await.unwrap(), CacheResponse::Passthrough);

        let mut post = CacheRequest::get(url("http://localhost:8080/api"));
        post.method = "POST".to_string();
        assert_eq!(cache.handle(&post).await.unwrap(), CacheResponse::Passthrough);
    }

    #[tokio::test]
    async fn test_third_party_is_cache_first() {
        let storage = Arc::new(CacheStorage::open_in_memory().unwrap());
        let fetcher = Arc::new(online_fetcher());
        let cache = OfflineCache::new(small_config(), storage, fetcher.clone()).unwrap();
        let vue = CacheRequest::get(url("https://unpkg.com/vue@3/dist/vue.global.prod.js"));

        let first = cache.handle(&vue).await.unwrap();
        assert!(matches!(first, CacheResponse::Served { source: ServedFrom::Network, .. }));

        let second = cache.handle(&vue).await.unwrap();
        assert!(matches!(second, CacheResponse::Served { source: ServedFrom::Cache, .. }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_party_is_network_first_with_offline_fallback() {
        let storage = Arc::new(CacheStorage::open_in_memory().unwrap());
        let fetcher = Arc::new(online_fetcher());
        let cache = OfflineCache::new(small_config(), storage, fetcher.clone()).unwrap();
        cache.install().await.unwrap();

        let index = CacheRequest::get(url("http://localhost:8080/index.html"));
        assert!(matches!(
            cache.handle(&index).await.unwrap(),
            CacheResponse::Served { source: ServedFrom::Network, .. }
        ));

        fetcher.offline.store(true, Ordering::SeqCst);
        assert!(matches!(
            cache.handle(&index).await.unwrap(),
            CacheResponse::Served { source: ServedFrom::Cache, .. }
        ));

        let deep_link = CacheRequest::navigate(url("http://localhost:8080/itinerary/3"));
        match cache.handle(&deep_link).await.unwrap() {
            CacheResponse::Served { response, source } => {
                assert_eq!(source, ServedFrom::Cache);
                assert_eq!(response.body, bytes::Bytes::from("shell"));
            }
            other => panic!("unexpected response {:?}", other),
        }

        let asset = CacheRequest::get(url("http://localhost:8080/js/missing.js"));
        assert!(matches!(cache.handle(&asset).await.unwrap_err(), TripError::Network { .. }));
    }

    #[tokio::test]
    async fn test_tiles_are_never_stored() {
        let storage = Arc::new(CacheStorage::open_in_memory().unwrap());
        let tile_url = "https://a.tile.openstreetmap.org/15/29100/12903.png";
        let fetcher = Arc::new(online_fetcher().with(tile_url, "png"));
        let cache = OfflineCache::new(small_config(), storage.clone(), fetcher.clone()).unwrap();
        let tile = CacheRequest::get(url(tile_url));

        cache.handle(&tile).await.unwrap();
        assert!(storage.get("v2", tile_url).unwrap().is_none());

        fetcher.offline.store(true, Ordering::SeqCst);
        assert!(cache.handle(&tile).await.is_err());

        storage.put("v2", tile_url, &FetchResponse::new(200, None, "png")).unwrap();
        assert!(matches!(
            cache.handle(&tile).await.unwrap(),
            CacheResponse::Served { source: ServedFrom::Cache, .. }
        ));
    }
}
