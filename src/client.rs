//! The Newsdesk handle

use api_client::{LanguageOption, MembershipStatus, NewsApi};
use app_state::{
    CategoriesResource, CategoriesSync, EffectiveLanguage, LanguagesResource, LanguagesSync,
    MembershipScope, MembershipsResource, MembershipsSync, NewsCacheInvalidator, NewsFeed,
    PreferenceResolver, PreferencesResource, PreferencesSync, ProfilePhotoCache, ProfileResource,
    ProfileSync, SyncError,
};
use networking::{FetchError, HttpFetcher, RemoteFetcher, SessionHandle};
use std::collections::HashMap;
use std::sync::Arc;
use storage::debug::{dump_entries, EntrySummary, DEFAULT_PREVIEW_LEN};
use storage::json::{read_string, remove_quietly, write_string};
use storage::{keys, CacheStore, MemoryStore, SledStore, StorageError};
use thiserror::Error;

use crate::config::NewsdeskConfig;

/// Errors surfaced by [`Newsdesk`]
#[derive(Debug, Error)]
pub enum NewsdeskError {
    /// Cache store could not be opened or read
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Fetcher could not be built
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A write failed
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Result type for [`Newsdesk`] operations
pub type Result<T> = std::result::Result<T, NewsdeskError>;

/// Every synchronizer of a signed-in app, wired together
pub struct Newsdesk {
    session: SessionHandle,
    store: Arc<dyn CacheStore>,
    api: NewsApi,
    preferences: Arc<PreferencesSync>,
    profile: Arc<ProfileSync>,
    languages: Arc<LanguagesSync>,
    categories: Arc<CategoriesSync>,
    memberships: Arc<MembershipsSync>,
    admin_memberships: parking_lot::Mutex<HashMap<Option<MembershipStatus>, Arc<MembershipsSync>>>,
    news: Arc<NewsFeed>,
    resolver: PreferenceResolver,
    warm_up_news: bool,
}

impl Newsdesk {
    /// Open the cache store and build the HTTP stack from config
    pub fn new(config: NewsdeskConfig, session: SessionHandle) -> Result<Self> {
        let store: Arc<dyn CacheStore> = match config.storage {
            Some(kv) => Arc::new(SledStore::open(kv)?),
            None => Arc::new(MemoryStore::new()),
        };
        let fetcher = HttpFetcher::new(config.fetcher, Arc::new(session.clone()))?;

        Ok(Self::from_parts(session, store, Arc::new(fetcher), config.warm_up_news))
    }

    /// Build from an existing store and fetcher
    pub fn from_parts(
        session: SessionHandle,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn RemoteFetcher>,
        warm_up_news: bool,
    ) -> Self {
        let api = NewsApi::new(fetcher);

        let preferences = Arc::new(PreferencesSync::new(PreferencesResource::new(api.clone()), Arc::clone(&store)));
        let profile = Arc::new(ProfileSync::new(ProfileResource::new(api.clone()), Arc::clone(&store)));
        let languages = Arc::new(LanguagesSync::new(LanguagesResource::new(api.clone()), Arc::clone(&store)));
        let categories = Arc::new(CategoriesSync::new(CategoriesResource::new(api.clone()), Arc::clone(&store)));
        let memberships = Arc::new(MembershipsSync::new(
            MembershipsResource::new(api.clone(), MembershipScope::Mine),
            Arc::clone(&store),
        ));
        let news = Arc::new(NewsFeed::new(api.clone(), Arc::clone(&store)));

        preferences.add_dependent(
            &["languageId"],
            Arc::new(NewsCacheInvalidator::new(Arc::clone(&news), Some(Arc::clone(&languages)))),
        );
        profile.add_dependent(&["photoUrl"], Arc::new(ProfilePhotoCache::new(Arc::clone(&store))));

        let resolver = PreferenceResolver::new(Arc::clone(&store), Arc::new(session.clone()))
            .with_preferences(Arc::clone(&preferences))
            .with_catalog(Arc::clone(&languages));

        Self {
            session,
            store,
            api,
            preferences,
            profile,
            languages,
            categories,
            memberships,
            admin_memberships: parking_lot::Mutex::new(HashMap::new()),
            news,
            resolver,
            warm_up_news,
        }
    }

    /// Hydrate from cache, start background refreshes and resolve the language
    ///
    /// Must be called from within a tokio runtime.
    pub async fn boot(&self) -> EffectiveLanguage {
        self.languages.load().await;
        self.preferences.load().await;
        self.categories.load().await;

        let language = self.resolver.resolve_effective_language().await;
        tracing::info!(language = %language.code, source = ?language.source, "effective language resolved");

        if self.warm_up_news {
            self.news.warm_up(&language.code, None);
        }
        language
    }

    /// Switch the user's language
    ///
    /// The selection is remembered before the write so that caches keyed by
    /// language code can follow the change even when the catalog is not
    /// loaded yet. It is rolled back if the write fails or is skipped.
    /// Returns `Ok(None)` if another preference write is in flight.
    pub async fn change_language(&self, option: &LanguageOption) -> Result<Option<EffectiveLanguage>> {
        if self.preferences.is_writing() {
            tracing::debug!(language = %option.code, "preference write in flight, skipping language change");
            return Ok(None);
        }

        let previous = read_string(self.store.as_ref(), keys::SELECTED_LANGUAGE).await;
        if !self.resolver.remember_selection(option).await {
            tracing::warn!(language = %option.code, "language selection not remembered");
        }

        match self.preferences.update_language(option.id.clone()).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.restore_selection(previous).await;
                return Ok(None);
            }
            Err(e) => {
                self.restore_selection(previous).await;
                return Err(e.into());
            }
        }

        self.session.set_language_id(Some(option.id.clone()));
        let language = self.resolver.resolve_effective_language().await;
        tracing::info!(language = %language.code, "language changed");
        Ok(Some(language))
    }

    async fn restore_selection(&self, previous: Option<String>) {
        match previous {
            Some(raw) => write_string(self.store.as_ref(), keys::SELECTED_LANGUAGE, &raw).await,
            None => remove_quietly(self.store.as_ref(), keys::SELECTED_LANGUAGE).await,
        };
    }

    /// Forget the signed-in user
    ///
    /// User data is removed from memory and cache. In-flight background work
    /// finishes without writing. The language catalog, categories and the
    /// device's language choice are kept.
    pub async fn sign_out(&self) {
        self.session.clear();

        self.preferences.purge().await;
        self.profile.purge().await;
        self.memberships.purge().await;

        let admin: Vec<Arc<MembershipsSync>> = self.admin_memberships.lock().drain().map(|(_, sync)| sync).collect();
        for sync in admin {
            sync.purge().await;
        }

        remove_quietly(self.store.as_ref(), keys::PROFILE_PHOTO_URL).await;
        self.news.reset();
        tracing::info!("signed out");
    }

    /// Admin view of membership applications for a status filter
    pub fn admin_memberships(&self, status: Option<MembershipStatus>) -> Arc<MembershipsSync> {
        let mut views = self.admin_memberships.lock();
        let view = views.entry(status).or_insert_with(|| {
            Arc::new(MembershipsSync::new(
                MembershipsResource::new(self.api.clone(), MembershipScope::Admin(status)),
                Arc::clone(&self.store),
            ))
        });
        Arc::clone(view)
    }

    /// Summaries of every cache entry, also logged at debug level
    pub async fn debug_dump(&self) -> Result<Vec<EntrySummary>> {
        Ok(dump_entries(self.store.as_ref(), DEFAULT_PREVIEW_LEN).await?)
    }

    /// Session handle
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Cache store
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Typed API
    pub fn api(&self) -> &NewsApi {
        &self.api
    }

    /// Preference synchronizer
    pub fn preferences(&self) -> &Arc<PreferencesSync> {
        &self.preferences
    }

    /// Profile synchronizer
    pub fn profile(&self) -> &Arc<ProfileSync> {
        &self.profile
    }

    /// Language catalog synchronizer
    pub fn languages(&self) -> &Arc<LanguagesSync> {
        &self.languages
    }

    /// Category synchronizer
    pub fn categories(&self) -> &Arc<CategoriesSync> {
        &self.categories
    }

    /// The signed-in user's membership applications
    pub fn memberships(&self) -> &Arc<MembershipsSync> {
        &self.memberships
    }

    /// News list cache
    pub fn news(&self) -> &Arc<NewsFeed> {
        &self.news
    }

    /// Effective-language resolver
    pub fn resolver(&self) -> &PreferenceResolver {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_state::LanguageSource;
    use async_trait::async_trait;
    use networking::ApiRequest;
    use serde_json::{json, Value};

    mockall::mock! {
        Fetcher {}

        #[async_trait]
        impl RemoteFetcher for Fetcher {
            async fn execute(&self, request: ApiRequest) -> std::result::Result<Value, FetchError>;
        }
    }

    fn routed_backend() -> MockFetcher {
        let mut mock = MockFetcher::new();
        mock.expect_execute().returning(|req| match req.path.as_str() {
            "/languages" => Ok(json!([
                {"id": 1, "code": "en", "name": "English"},
                {"id": 2, "code": "te", "name": "Telugu"}
            ])),
            "/preferences" => Ok(json!({"languageId": 2})),
            "/categories" => Ok(json!([])),
            "/news" => Ok(json!([])),
            "/admin/memberships" => Ok(json!([])),
            other => Err(FetchError::Http {
                status: 404,
                body: format!("no route for {}", other),
            }),
        });
        mock
    }

    fn desk(store: Arc<dyn CacheStore>) -> Newsdesk {
        let session = SessionHandle::signed_in("token", None);
        Newsdesk::from_parts(session, store, Arc::new(routed_backend()), false)
    }

    #[tokio::test]
    async fn test_boot_uses_cached_preferences_first() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::with_entries([
            (keys::LANGUAGES, r#"[{"id":"2","code":"te","name":"Telugu"}]"#),
            (keys::PREFERENCES, r#"{"languageId":"2"}"#),
        ]));
        let desk = desk(store);

        let language = desk.boot().await;
        assert_eq!(language.code, "te");
        assert_eq!(language.source, LanguageSource::Preferences);
    }

    #[tokio::test]
    async fn test_admin_views_are_shared_per_filter() {
        let desk = desk(Arc::new(MemoryStore::new()));

        let pending = desk.admin_memberships(Some(MembershipStatus::Pending));
        let again = desk.admin_memberships(Some(MembershipStatus::Pending));
        let all = desk.admin_memberships(None);

        assert!(Arc::ptr_eq(&pending, &again));
        assert!(!Arc::ptr_eq(&pending, &all));
    }

    #[tokio::test]
    async fn test_sign_out_keeps_device_language() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::with_entries([
            (keys::PREFERENCES, r#"{"languageId":"2"}"#),
            (keys::PROFILE, r#"{"id":"7","name":"Ravi"}"#),
            (keys::PROFILE_PHOTO_URL, "https://cdn.example.com/p.jpg"),
            (keys::SELECTED_LANGUAGE, r#"{"id":"2","code":"te","name":"Telugu"}"#),
            ("admin_memberships_cache_v1:pending", "[]"),
            (keys::LANGUAGES, r#"[{"id":"2","code":"te","name":"Telugu"}]"#),
        ]));
        let desk = desk(Arc::clone(&store));
        desk.admin_memberships(Some(MembershipStatus::Pending)).cached().await;

        desk.sign_out().await;

        assert!(!desk.session().is_signed_in());
        assert_eq!(store.get(keys::PREFERENCES).await.unwrap(), None);
        assert_eq!(store.get(keys::PROFILE).await.unwrap(), None);
        assert_eq!(store.get(keys::PROFILE_PHOTO_URL).await.unwrap(), None);
        assert_eq!(store.get("admin_memberships_cache_v1:pending").await.unwrap(), None);
        assert!(store.get(keys::SELECTED_LANGUAGE).await.unwrap().is_some());
        assert!(store.get(keys::LANGUAGES).await.unwrap().is_some());

        let language = desk.resolver().resolve_effective_language().await;
        assert_eq!(language.code, "te");
        assert_eq!(language.source, LanguageSource::SelectedLanguage);
    }

    #[tokio::test]
    async fn test_debug_dump_lists_entries() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::with_entries([(keys::LANGUAGE_LOCAL, "te")]));
        let desk = desk(store);

        let entries = desk.debug_dump().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, keys::LANGUAGE_LOCAL);
    }
}
