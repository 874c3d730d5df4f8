//! Offline cache across a deployment upgrade, on an on-disk cache database

use async_trait::async_trait;
use reqwest::Url;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use trip_planner::cache::{CacheRequest, CacheResponse, CacheStorage, FetchResponse, Fetcher, OfflineCache, ServedFrom};
use trip_planner::config::CacheConfig;
use trip_planner::{Result, TripError};

/// Echoes the URL path as the body; fails everything while offline
#[derive(Default)]
struct EchoFetcher {
    offline: AtomicBool,
}

#[async_trait]
impl Fetcher for EchoFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TripError::Network {
                url: url.to_string(),
                message: "no route to host".to_string(),
            });
        }
        Ok(FetchResponse::new(200, Some("text/plain"), url.path().to_string()))
    }
}

fn config(generation: &str) -> CacheConfig {
    CacheConfig {
        generation: generation.to_string(),
        ..CacheConfig::default()
    }
}

#[tokio::test]
async fn test_upgrade_replaces_generation_and_works_offline() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("offline-cache.db");
    let fetcher = Arc::new(EchoFetcher::default());

    {
        let storage = Arc::new(CacheStorage::open(&path).unwrap());
        let old = OfflineCache::new(config("tokyo-trip-v4"), storage, fetcher.clone()).unwrap();
        old.install().await.unwrap();
        old.activate().unwrap();
    }

    let storage = Arc::new(CacheStorage::open(&path).unwrap());
    let new = OfflineCache::new(config("tokyo-trip-v5"), storage.clone(), fetcher.clone()).unwrap();
    let installed = new.install().await.unwrap();
    assert_eq!(installed, CacheConfig::default().app_shell.len() + CacheConfig::default().third_party_assets.len());

    assert_eq!(new.activate().unwrap(), vec!["tokyo-trip-v4".to_string()]);
    assert_eq!(storage.cache_names().unwrap(), vec!["tokyo-trip-v5".to_string()]);

    fetcher.offline.store(true, Ordering::SeqCst);
    let page = CacheRequest::navigate(new.resolve("./wishlist").unwrap());
    match new.handle(&page).await.unwrap() {
        CacheResponse::Served { response, source } => {
            assert_eq!(source, ServedFrom::Cache);
            assert_eq!(response.body, bytes::Bytes::from("/index.html"));
        }
        other => panic!("expected the app shell, got {:?}", other),
    }
}
