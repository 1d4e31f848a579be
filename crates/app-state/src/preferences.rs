//! User preference synchronization
//!
//! The preference record is written with partial patches. The value kept
//! after a successful write is the previous record, with the patch applied,
//! overlaid with every field the server echoed back.

use api_client::{LocationPreference, NewsApi, PreferencePatch, Preferences};
use async_trait::async_trait;
use networking::FetchError;
use storage::keys;

use crate::sync::{Resource, Result, Synchronizer};

/// Preference record resource
#[derive(Debug, Clone)]
pub struct PreferencesResource {
    api: NewsApi,
}

impl PreferencesResource {
    /// Create the resource
    pub fn new(api: NewsApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Resource for PreferencesResource {
    type Value = Preferences;
    type Mutation = PreferencePatch;

    fn name(&self) -> &'static str {
        "preferences"
    }

    fn cache_key(&self) -> String {
        keys::PREFERENCES.to_string()
    }

    async fn fetch(&self) -> std::result::Result<Preferences, FetchError> {
        self.api.preferences().await
    }

    async fn apply(
        &self,
        current: Option<Preferences>,
        patch: &PreferencePatch,
    ) -> std::result::Result<Preferences, FetchError> {
        let confirmed = self.api.patch_preferences(patch).await?;

        let mut merged = current.unwrap_or_default();
        merged.apply(patch);
        merged.overlay(confirmed);
        Ok(merged)
    }

    fn touched_fields(&self, patch: &PreferencePatch) -> Vec<&'static str> {
        patch.touched_fields()
    }
}

/// Synchronizer for the preference record
pub type PreferencesSync = Synchronizer<PreferencesResource>;

impl Synchronizer<PreferencesResource> {
    /// Change the language
    pub async fn update_language(&self, language_id: impl Into<String>) -> Result<Option<Preferences>> {
        self.update(PreferencePatch::language(language_id)).await
    }

    /// Change the news location
    pub async fn update_location(&self, location: LocationPreference) -> Result<Option<Preferences>> {
        self.update(PreferencePatch::location(location)).await
    }

    /// Register a device push token
    pub async fn update_push_token(&self, token: impl Into<String>) -> Result<Option<Preferences>> {
        self.update(PreferencePatch::push_token(token)).await
    }

    /// Write several fields in one request
    ///
    /// An empty patch returns the current record without a request.
    pub async fn update_all(&self, patch: PreferencePatch) -> Result<Option<Preferences>> {
        if patch.is_empty() {
            return Ok(self.cached().await);
        }
        self.update(patch).await
    }

    /// Language id of the in-memory record
    pub fn language_id(&self) -> Option<String> {
        self.value()
            .and_then(|prefs| prefs.usable_language_id().map(str::to_string))
    }
}
