//! Read-only catalogs: languages and categories

use api_client::{Category, LanguageOption, NewsApi};
use async_trait::async_trait;
use i18n::normalize_code;
use networking::FetchError;
use std::convert::Infallible;
use storage::keys;

use crate::sync::{Resource, Synchronizer};

/// Language catalog resource
#[derive(Debug, Clone)]
pub struct LanguagesResource {
    api: NewsApi,
}

impl LanguagesResource {
    /// Create the resource
    pub fn new(api: NewsApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Resource for LanguagesResource {
    type Value = Vec<LanguageOption>;
    type Mutation = Infallible;

    fn name(&self) -> &'static str {
        "languages"
    }

    fn cache_key(&self) -> String {
        keys::LANGUAGES.to_string()
    }

    async fn fetch(&self) -> Result<Vec<LanguageOption>, FetchError> {
        self.api.languages().await
    }

    async fn apply(&self, _current: Option<Self::Value>, mutation: &Infallible) -> Result<Self::Value, FetchError> {
        match *mutation {}
    }

    fn touched_fields(&self, mutation: &Infallible) -> Vec<&'static str> {
        match *mutation {}
    }
}

/// Synchronizer for the language catalog
pub type LanguagesSync = Synchronizer<LanguagesResource>;

impl Synchronizer<LanguagesResource> {
    /// Catalog entry for a backend id, from memory or cache
    pub async fn find_by_id(&self, id: &str) -> Option<LanguageOption> {
        let id = id.trim();
        self.cached()
            .await?
            .into_iter()
            .find(|option| option.id == id)
    }

    /// Catalog entry for a language code, from memory or cache
    pub async fn find_by_code(&self, code: &str) -> Option<LanguageOption> {
        let code = normalize_code(code)?;
        self.cached()
            .await?
            .into_iter()
            .find(|option| normalize_code(&option.code).as_deref() == Some(code.as_str()))
    }
}

/// News category resource
#[derive(Debug, Clone)]
pub struct CategoriesResource {
    api: NewsApi,
}

impl CategoriesResource {
    /// Create the resource
    pub fn new(api: NewsApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Resource for CategoriesResource {
    type Value = Vec<Category>;
    type Mutation = Infallible;

    fn name(&self) -> &'static str {
        "categories"
    }

    fn cache_key(&self) -> String {
        keys::CATEGORIES.to_string()
    }

    async fn fetch(&self) -> Result<Vec<Category>, FetchError> {
        self.api.categories().await
    }

    async fn apply(&self, _current: Option<Self::Value>, mutation: &Infallible) -> Result<Self::Value, FetchError> {
        match *mutation {}
    }

    fn touched_fields(&self, mutation: &Infallible) -> Vec<&'static str> {
        match *mutation {}
    }
}

/// Synchronizer for news categories
pub type CategoriesSync = Synchronizer<CategoriesResource>;
