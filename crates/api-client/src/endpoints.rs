//! Typed endpoints
//!
//! Each method builds an [`ApiRequest`], executes it through the injected
//! [`RemoteFetcher`] and decodes the body.

use networking::{decode, ApiRequest, FetchError, RemoteFetcher, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::models::{
    Article, Category, LanguageOption, ListPayload, MediaUpload, Membership, MembershipDraft,
    MembershipStatus, MembershipStatusUpdate, PreferencePatch, Preferences, Profile, ProfilePatch,
};

/// Newsdesk backend API
#[derive(Clone)]
pub struct NewsApi {
    fetcher: Arc<dyn RemoteFetcher>,
}

impl std::fmt::Debug for NewsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApi").finish_non_exhaustive()
    }
}

fn with_json<T: Serialize>(request: ApiRequest, body: &T) -> Result<ApiRequest> {
    request
        .json_body(body)
        .map_err(|e| FetchError::Parse(format!("Failed to encode request body: {}", e)))
}

impl NewsApi {
    /// Create an API over a fetcher
    pub fn new(fetcher: Arc<dyn RemoteFetcher>) -> Self {
        Self { fetcher }
    }

    /// The underlying fetcher
    pub fn fetcher(&self) -> &Arc<dyn RemoteFetcher> {
        &self.fetcher
    }

    async fn list<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Vec<T>> {
        let value = self.fetcher.execute(request).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(decode::<ListPayload<T>>(value)?.into_vec())
    }

    async fn object_or_default<T: DeserializeOwned + Default>(&self, request: ApiRequest) -> Result<T> {
        let value = self.fetcher.execute(request).await?;
        if value.is_null() {
            return Ok(T::default());
        }
        decode(value)
    }

    async fn object<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        decode(self.fetcher.execute(request).await?)
    }

    /// Language catalog
    pub async fn languages(&self) -> Result<Vec<LanguageOption>> {
        self.list(ApiRequest::get("/languages")).await
    }

    /// Current preferences; an empty body means no record yet
    pub async fn preferences(&self) -> Result<Preferences> {
        self.object_or_default(ApiRequest::get("/preferences")).await
    }

    /// Update preferences, returning whatever the server confirmed
    pub async fn patch_preferences(&self, patch: &PreferencePatch) -> Result<Preferences> {
        let request = with_json(ApiRequest::patch("/preferences"), patch)?;
        self.object_or_default(request).await
    }

    /// Signed-in user's profile
    pub async fn profile(&self) -> Result<Profile> {
        self.object_or_default(ApiRequest::get("/profile")).await
    }

    /// Update the profile, returning whatever the server confirmed
    pub async fn patch_profile(&self, patch: &ProfilePatch) -> Result<Profile> {
        let request = with_json(ApiRequest::patch("/profile"), patch)?;
        self.object_or_default(request).await
    }

    /// News categories
    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.list(ApiRequest::get("/categories")).await
    }

    /// News list for a language, optionally narrowed to a category
    pub async fn news(&self, language_code: &str, category: Option<&str>) -> Result<Vec<Article>> {
        let request = ApiRequest::get("/news")
            .param("language", language_code)
            .param_opt("category", category);
        self.list(request).await
    }

    /// Signed-in user's membership applications
    pub async fn memberships(&self) -> Result<Vec<Membership>> {
        self.list(ApiRequest::get("/memberships")).await
    }

    /// A single membership application
    pub async fn membership(&self, id: &str) -> Result<Membership> {
        self.object(ApiRequest::get(format!("/memberships/{}", id))).await
    }

    /// Submit a membership application
    pub async fn create_membership(&self, draft: &MembershipDraft) -> Result<Membership> {
        let request = with_json(ApiRequest::post("/memberships"), draft)?;
        self.object(request).await
    }

    /// Applications visible to an admin, optionally filtered by status
    pub async fn admin_memberships(&self, status: Option<MembershipStatus>) -> Result<Vec<Membership>> {
        let request = ApiRequest::get("/admin/memberships").param_opt("status", status.map(|s| s.as_str()));
        self.list(request).await
    }

    /// Approve or reject an application
    pub async fn set_membership_status(&self, id: &str, update: &MembershipStatusUpdate) -> Result<Membership> {
        let request = with_json(ApiRequest::patch(format!("/admin/memberships/{}/status", id)), update)?;
        self.object(request).await
    }

    /// Upload a media file
    pub async fn upload_media(&self, content_type: &str, data: Vec<u8>) -> Result<MediaUpload> {
        tracing::debug!(content_type, size = data.len(), "uploading media");
        self.object(ApiRequest::post("/media/upload").bytes_body(content_type, data)).await
    }
}
