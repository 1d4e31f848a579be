//! Top-level configuration

use networking::FetcherConfig;
use storage::KvConfig;

/// Configuration for [`Newsdesk`](crate::Newsdesk)
#[derive(Debug, Clone)]
pub struct NewsdeskConfig {
    /// Backend access
    pub fetcher: FetcherConfig,
    /// Durable cache location; `None` keeps the cache in memory
    pub storage: Option<KvConfig>,
    /// Prefetch the news list for the effective language on boot
    pub warm_up_news: bool,
}

impl Default for NewsdeskConfig {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            storage: None,
            warm_up_news: true,
        }
    }
}

impl NewsdeskConfig {
    /// Create a config for a backend URL with an in-memory cache
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            fetcher: FetcherConfig::new(base_url),
            ..Default::default()
        }
    }

    /// Set the fetcher configuration
    pub fn with_fetcher(mut self, fetcher: FetcherConfig) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Persist the cache with sled
    pub fn with_storage(mut self, storage: KvConfig) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Enable or disable the boot-time news warmup
    pub fn warm_up_news(mut self, enabled: bool) -> Self {
        self.warm_up_news = enabled;
        self
    }
}
