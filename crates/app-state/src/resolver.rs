//! Effective language resolution
//!
//! The language the app should use is not stored anywhere as such. It is
//! derived from up to four sources that can disagree, checked in order:
//!
//! 1. the language id the backend confirmed for the session
//! 2. the in-memory preference record
//! 3. the `selectedLanguage` cache entry
//! 4. the legacy `language_local` cache entry
//!
//! falling back to English. A source that is missing, blank, malformed,
//! carries an invalid code, or names an id with no known code is skipped.
//! Resolution never fails.

use api_client::LanguageOption;
use i18n::{normalize_code, LanguageSelection, DEFAULT_LANGUAGE_CODE, DEFAULT_LANGUAGE_NAME};
use networking::SessionProvider;
use std::sync::Arc;
use storage::json::{read_string, write_json};
use storage::{keys, CacheStore};

use crate::catalog::LanguagesSync;
use crate::preferences::PreferencesSync;

/// Which source decided the effective language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageSource {
    /// Session language id
    Session,
    /// Preference record
    Preferences,
    /// `selectedLanguage` cache entry
    SelectedLanguage,
    /// `language_local` cache entry
    LegacyLocal,
    /// Built-in default
    Default,
}

/// The language the app should use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveLanguage {
    /// Backend id, if known
    pub id: Option<String>,
    /// Canonical language code
    pub code: String,
    /// Display name, if known
    pub name: Option<String>,
    /// Deciding source
    pub source: LanguageSource,
}

impl EffectiveLanguage {
    fn default_language() -> Self {
        Self {
            id: None,
            code: DEFAULT_LANGUAGE_CODE.to_string(),
            name: Some(DEFAULT_LANGUAGE_NAME.to_string()),
            source: LanguageSource::Default,
        }
    }
}

/// Computes the effective language from every available source
pub struct PreferenceResolver {
    store: Arc<dyn CacheStore>,
    session: Arc<dyn SessionProvider>,
    preferences: Option<Arc<PreferencesSync>>,
    catalog: Option<Arc<LanguagesSync>>,
}

impl PreferenceResolver {
    /// Create a resolver over the cache store and session
    pub fn new(store: Arc<dyn CacheStore>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            store,
            session,
            preferences: None,
            catalog: None,
        }
    }

    /// Consult the preference record
    pub fn with_preferences(mut self, preferences: Arc<PreferencesSync>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Use the language catalog to fill in codes and names
    pub fn with_catalog(mut self, catalog: Arc<LanguagesSync>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Resolve the effective language
    pub async fn resolve_effective_language(&self) -> EffectiveLanguage {
        let selected = self.read_selection(keys::SELECTED_LANGUAGE).await;
        let legacy = self.read_selection(keys::LANGUAGE_LOCAL).await;
        let cached = [selected.as_ref(), legacy.as_ref()];

        let session_id = self.session.language_id();
        if let Some(resolved) = self.from_id(session_id.as_deref(), LanguageSource::Session, &cached).await {
            return resolved;
        }

        let record_id = self.preferences.as_ref().and_then(|p| p.language_id());
        if let Some(resolved) = self.from_id(record_id.as_deref(), LanguageSource::Preferences, &cached).await {
            return resolved;
        }

        if let Some(resolved) = self.from_selection(selected.as_ref(), LanguageSource::SelectedLanguage).await {
            return resolved;
        }

        if let Some(resolved) = self.from_selection(legacy.as_ref(), LanguageSource::LegacyLocal).await {
            return resolved;
        }

        tracing::debug!("no usable language source, using default");
        EffectiveLanguage::default_language()
    }

    /// Persist an explicit choice as the `selectedLanguage` entry
    pub async fn remember_selection(&self, option: &LanguageOption) -> bool {
        let selection = LanguageSelection::new(option.id.clone(), option.code.clone(), option.name.clone());
        write_json(self.store.as_ref(), keys::SELECTED_LANGUAGE, &selection).await
    }

    async fn read_selection(&self, key: &str) -> Option<LanguageSelection> {
        let raw = read_string(self.store.as_ref(), key).await?;
        let selection = LanguageSelection::from_cached(&raw);
        if selection.is_none() {
            tracing::debug!(key, "ignoring unusable language selection");
        }
        selection
    }

    async fn catalog_entry(&self, id: &str) -> Option<LanguageOption> {
        self.catalog.as_ref()?.find_by_id(id).await
    }

    /// Resolve a bare language id, borrowing code and name from the catalog
    /// or from a cached selection with the same id
    ///
    /// An id that maps to no code and is not a code itself yields `None`, so
    /// the next source is consulted instead of guessing.
    async fn from_id(
        &self,
        id: Option<&str>,
        source: LanguageSource,
        cached: &[Option<&LanguageSelection>],
    ) -> Option<EffectiveLanguage> {
        let id = id.map(str::trim).filter(|id| !id.is_empty())?;

        if let Some(option) = self.catalog_entry(id).await {
            if let Some(code) = normalize_code(&option.code) {
                return Some(EffectiveLanguage {
                    id: Some(id.to_string()),
                    code,
                    name: Some(option.name),
                    source,
                });
            }
        }

        let matching = cached
            .iter()
            .flatten()
            .find(|selection| selection.usable_id() == Some(id) && selection.usable_code().is_some());
        if let Some(selection) = matching {
            return Some(EffectiveLanguage {
                id: Some(id.to_string()),
                code: selection.usable_code().unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string()),
                name: selection.usable_name().map(str::to_string),
                source,
            });
        }

        let Some(code) = normalize_code(id) else {
            tracing::debug!(language_id = id, ?source, "language id has no known code, skipping source");
            return None;
        };
        Some(EffectiveLanguage {
            id: Some(id.to_string()),
            code,
            name: None,
            source,
        })
    }

    async fn from_selection(
        &self,
        selection: Option<&LanguageSelection>,
        source: LanguageSource,
    ) -> Option<EffectiveLanguage> {
        let selection = selection?;
        let id = selection.usable_id();
        let entry = match id {
            Some(id) => self.catalog_entry(id).await,
            None => None,
        };

        let code = selection
            .usable_code()
            .or_else(|| entry.as_ref().and_then(|option| normalize_code(&option.code)))
            .or_else(|| id.and_then(normalize_code))?;

        let name = selection
            .usable_name()
            .map(str::to_string)
            .or_else(|| entry.map(|option| option.name));

        Some(EffectiveLanguage {
            id: id.map(str::to_string),
            code,
            name,
            source,
        })
    }
}
