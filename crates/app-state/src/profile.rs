//! Profile synchronization and photo upload

use api_client::{NewsApi, Profile, ProfilePatch};
use async_trait::async_trait;
use networking::FetchError;
use std::sync::Arc;
use storage::json::{read_string, remove_quietly, write_string};
use storage::{keys, CacheStore};

use crate::sync::{DependentCache, Resource, Result, SyncError, Synchronizer};

/// Profile resource
#[derive(Debug, Clone)]
pub struct ProfileResource {
    api: NewsApi,
}

impl ProfileResource {
    /// Create the resource
    pub fn new(api: NewsApi) -> Self {
        Self { api }
    }

    /// The API used by this resource
    pub fn api(&self) -> &NewsApi {
        &self.api
    }
}

#[async_trait]
impl Resource for ProfileResource {
    type Value = Profile;
    type Mutation = ProfilePatch;

    fn name(&self) -> &'static str {
        "profile"
    }

    fn cache_key(&self) -> String {
        keys::PROFILE.to_string()
    }

    async fn fetch(&self) -> std::result::Result<Profile, FetchError> {
        self.api.profile().await
    }

    async fn apply(&self, current: Option<Profile>, patch: &ProfilePatch) -> std::result::Result<Profile, FetchError> {
        let confirmed = self.api.patch_profile(patch).await?;

        let mut merged = current.unwrap_or_default();
        merged.apply(patch);
        merged.overlay(confirmed);
        Ok(merged)
    }

    fn touched_fields(&self, patch: &ProfilePatch) -> Vec<&'static str> {
        patch.touched_fields()
    }
}

/// Synchronizer for the profile
pub type ProfileSync = Synchronizer<ProfileResource>;

impl Synchronizer<ProfileResource> {
    /// Upload a new photo and point the profile at it
    ///
    /// Returns `Ok(None)` without uploading if a profile write is already in
    /// flight.
    pub async fn upload_photo(&self, content_type: &str, data: Vec<u8>) -> Result<Option<Profile>> {
        if self.is_writing() {
            tracing::debug!("profile write in flight, skipping photo upload");
            return Ok(None);
        }

        let upload = self.resource().api().upload_media(content_type, data).await?;
        tracing::info!(media_id = %upload.media_id, "profile photo uploaded");

        self.update(ProfilePatch::photo(upload.url)).await
    }
}

/// Keeps the plain-string `profile_photo_url` entry in step with the profile
pub struct ProfilePhotoCache {
    store: Arc<dyn CacheStore>,
}

impl ProfilePhotoCache {
    /// Create the dependent cache
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Photo URL as last written
    pub async fn cached_url(&self) -> Option<String> {
        read_string(self.store.as_ref(), keys::PROFILE_PHOTO_URL)
            .await
            .filter(|url| !url.trim().is_empty())
    }
}

#[async_trait]
impl DependentCache<Profile> for ProfilePhotoCache {
    fn name(&self) -> &'static str {
        "profile_photo_url"
    }

    async fn invalidate(&self, profile: &Profile) -> Result<()> {
        let stored = match profile.photo_url.as_deref().filter(|url| !url.trim().is_empty()) {
            Some(url) => write_string(self.store.as_ref(), keys::PROFILE_PHOTO_URL, url).await,
            None => remove_quietly(self.store.as_ref(), keys::PROFILE_PHOTO_URL).await,
        };

        if stored {
            Ok(())
        } else {
            Err(SyncError::Invalidation("profile photo url not written".to_string()))
        }
    }
}
