//! News list cache
//!
//! Article lists are cached per language and optional category under
//! `news_cache:<code>` and `news_cache:<code>:<category>`. A language change
//! drops every list for the new language and refetches the unfiltered one.
//! Warmups run in the background and only write if the feed has not been
//! reset since they started.

use api_client::{Article, NewsApi, Preferences};
use async_trait::async_trait;
use i18n::{normalize_code, LanguageSelection};
use networking::FetchError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use storage::json::{read_json, read_string, remove_quietly, write_json};
use storage::{keys, CacheStore};

use crate::catalog::LanguagesSync;
use crate::sync::{DependentCache, Result, SyncError};

/// Cache-first access to news lists
pub struct NewsFeed {
    api: NewsApi,
    store: Arc<dyn CacheStore>,
    epoch: AtomicU64,
    warming: parking_lot::Mutex<HashSet<String>>,
}

impl NewsFeed {
    /// Create a feed
    pub fn new(api: NewsApi, store: Arc<dyn CacheStore>) -> Self {
        Self {
            api,
            store,
            epoch: AtomicU64::new(0),
            warming: parking_lot::Mutex::new(HashSet::new()),
        }
    }

    /// Current epoch
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Cached list, if any
    pub async fn cached(&self, language_code: &str, category: Option<&str>) -> Option<Vec<Article>> {
        let key = keys::news_cache(language_code, category);
        read_json(self.store.as_ref(), &key).await
    }

    /// Fetch a list from the backend and cache it
    ///
    /// The result is returned either way but only cached if no reset happened
    /// while the request was in flight.
    pub async fn fetch(&self, language_code: &str, category: Option<&str>) -> std::result::Result<Vec<Article>, FetchError> {
        self.fetch_for_epoch(self.epoch(), language_code, category).await
    }

    async fn fetch_for_epoch(
        &self,
        epoch: u64,
        language_code: &str,
        category: Option<&str>,
    ) -> std::result::Result<Vec<Article>, FetchError> {
        let articles = self.api.news(language_code, category).await?;

        if self.epoch() == epoch {
            let key = keys::news_cache(language_code, category);
            write_json(self.store.as_ref(), &key, &articles).await;
        } else {
            tracing::debug!(language = language_code, "news feed reset during fetch, not caching");
        }
        Ok(articles)
    }

    /// Cached list, falling back to the backend
    pub async fn load(&self, language_code: &str, category: Option<&str>) -> std::result::Result<Vec<Article>, FetchError> {
        match self.cached(language_code, category).await {
            Some(articles) => Ok(articles),
            None => self.fetch(language_code, category).await,
        }
    }

    /// Remove every cached list for a language, returning how many were removed
    pub async fn invalidate(&self, language_code: &str) -> usize {
        let entries = match self.store.get_all().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(language = language_code, "could not enumerate news cache: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for (key, _) in entries {
            if keys::is_news_key_for(&key, language_code) && remove_quietly(self.store.as_ref(), &key).await {
                removed += 1;
            }
        }

        tracing::debug!(language = language_code, removed, "invalidated news cache");
        removed
    }

    /// Fetch a list in the background
    ///
    /// Returns `false` if a warmup for the same list is already running.
    /// Must be called from within a tokio runtime.
    pub fn warm_up(self: &Arc<Self>, language_code: &str, category: Option<&str>) -> bool {
        let key = keys::news_cache(language_code, category);
        if !self.warming.lock().insert(key.clone()) {
            tracing::debug!(key = %key, "news warmup already running");
            return false;
        }

        let epoch = self.epoch();
        let this = Arc::clone(self);
        let code = language_code.to_string();
        let category = category.map(str::to_string);
        tokio::spawn(async move {
            if let Err(e) = this.fetch_for_epoch(epoch, &code, category.as_deref()).await {
                tracing::warn!(key = %key, "news warmup failed: {}", e);
            }
            this.warming.lock().remove(&key);
        });
        true
    }

    /// Whether a warmup for the list is running
    pub fn is_warming(&self, language_code: &str, category: Option<&str>) -> bool {
        self.warming
            .lock()
            .contains(&keys::news_cache(language_code, category))
    }

    /// Stop in-flight fetches and warmups from writing to the cache
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
}

/// Refreshes the news cache when the preferred language changes
pub struct NewsCacheInvalidator {
    feed: Arc<NewsFeed>,
    catalog: Option<Arc<LanguagesSync>>,
}

impl NewsCacheInvalidator {
    /// Create the invalidator
    ///
    /// Ids missing from the catalog are mapped through a cached language
    /// selection with the same id, and otherwise only work if they are codes
    /// themselves.
    pub fn new(feed: Arc<NewsFeed>, catalog: Option<Arc<LanguagesSync>>) -> Self {
        Self { feed, catalog }
    }

    async fn code_for(&self, language_id: &str) -> Option<String> {
        if let Some(catalog) = &self.catalog {
            if let Some(option) = catalog.find_by_id(language_id).await {
                return normalize_code(&option.code);
            }
        }

        for key in [keys::SELECTED_LANGUAGE, keys::LANGUAGE_LOCAL] {
            let Some(raw) = read_string(self.feed.store.as_ref(), key).await else {
                continue;
            };
            let code = LanguageSelection::from_cached(&raw)
                .filter(|selection| selection.usable_id() == Some(language_id))
                .and_then(|selection| selection.usable_code());
            if code.is_some() {
                return code;
            }
        }

        normalize_code(language_id)
    }
}

#[async_trait]
impl DependentCache<Preferences> for NewsCacheInvalidator {
    fn name(&self) -> &'static str {
        "news_cache"
    }

    async fn invalidate(&self, preferences: &Preferences) -> Result<()> {
        let Some(language_id) = preferences.usable_language_id() else {
            return Ok(());
        };

        let code = self
            .code_for(language_id)
            .await
            .ok_or_else(|| SyncError::Invalidation(format!("no language code for id {}", language_id)))?;

        self.feed.invalidate(&code).await;
        self.feed.fetch(&code, None).await?;
        tracing::info!(language = %code, "news cache refreshed for new language");
        Ok(())
    }
}
