//! Request classification for the offline cache

use reqwest::Url;

use crate::config::CacheConfig;

/// How a request is treated by the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Sync traffic, never intercepted
    Sync,
    /// Map tiles: network only, fall back to an existing cached copy
    MapTile,
    /// Immutable library and font assets: cache first
    ThirdParty,
    /// Application assets: network first
    FirstParty,
}

#[derive(Debug, Clone)]
pub struct CachePolicy {
    sync_hosts: Vec<String>,
    tile_hosts: Vec<String>,
    third_party_hosts: Vec<String>,
}

/// Exact host or any subdomain of it
fn host_matches(host: &str, pattern: &str) -> bool {
    host == pattern
        || host
            .strip_suffix(pattern)
            .map_or(false, |prefix| prefix.ends_with('.'))
}

impl CachePolicy {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            sync_hosts: config.sync_hosts.clone(),
            tile_hosts: config.tile_hosts.clone(),
            third_party_hosts: config.third_party_hosts.clone(),
        }
    }

    pub fn classify(&self, url: &Url) -> RequestClass {
        let host = url.host_str().unwrap_or_default();
        let any = |hosts: &[String]| hosts.iter().any(|h| host_matches(host, h));

        if any(&self.sync_hosts) {
            RequestClass::Sync
        } else if any(&self.tile_hosts) {
            RequestClass::MapTile
        } else if any(&self.third_party_hosts) {
            RequestClass::ThirdParty
        } else {
            RequestClass::FirstParty
        }
    }
}
