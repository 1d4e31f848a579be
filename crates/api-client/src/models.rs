//! API models
//!
//! Field names follow the backend's camelCase JSON. Identifiers are kept as
//! strings; the backend sends some of them as numbers, so id fields accept
//! either form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Lenient Decoding
// =============================================================================

fn id_from_value(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    id_from_value(value).ok_or_else(|| serde::de::Error::custom("expected string or numeric id"))
}

fn opt_string_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(id_from_value))
}

/// List responses arrive either bare or wrapped in `{"data": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListPayload<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListPayload<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListPayload::Bare(items) | ListPayload::Wrapped { data: items } => items,
        }
    }
}

// =============================================================================
// Languages
// =============================================================================

/// An entry of the language catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageOption {
    /// Backend id
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    /// Language code (e.g. "te")
    pub code: String,
    /// English name
    pub name: String,
    /// Name in the language itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,
}

// =============================================================================
// Preferences
// =============================================================================

/// Where the user reads news from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPreference {
    /// State id
    #[serde(default, deserialize_with = "opt_string_id", skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    /// District id
    #[serde(default, deserialize_with = "opt_string_id", skip_serializing_if = "Option::is_none")]
    pub district_id: Option<String>,
    /// Mandal id
    #[serde(default, deserialize_with = "opt_string_id", skip_serializing_if = "Option::is_none")]
    pub mandal_id: Option<String>,
}

/// The user's preference record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Selected language id
    #[serde(default, deserialize_with = "opt_string_id", skip_serializing_if = "Option::is_none")]
    pub language_id: Option<String>,
    /// News location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationPreference>,
    /// Device push token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    /// Last server-side modification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Preferences {
    /// Non-blank language id
    pub fn usable_language_id(&self) -> Option<&str> {
        self.language_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Apply a patch locally
    pub fn apply(&mut self, patch: &PreferencePatch) {
        if let Some(language_id) = &patch.language_id {
            self.language_id = Some(language_id.clone());
        }
        if let Some(location) = &patch.location {
            self.location = Some(location.clone());
        }
        if let Some(push_token) = &patch.push_token {
            self.push_token = Some(push_token.clone());
        }
    }

    /// Overlay every field the server returned
    pub fn overlay(&mut self, confirmed: Preferences) {
        if confirmed.language_id.is_some() {
            self.language_id = confirmed.language_id;
        }
        if confirmed.location.is_some() {
            self.location = confirmed.location;
        }
        if confirmed.push_token.is_some() {
            self.push_token = confirmed.push_token;
        }
        if confirmed.updated_at.is_some() {
            self.updated_at = confirmed.updated_at;
        }
    }
}

/// Partial update of [`Preferences`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencePatch {
    /// New language id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_id: Option<String>,
    /// New location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationPreference>,
    /// New push token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
}

impl PreferencePatch {
    /// Patch the language only
    pub fn language(language_id: impl Into<String>) -> Self {
        Self {
            language_id: Some(language_id.into()),
            ..Default::default()
        }
    }

    /// Patch the location only
    pub fn location(location: LocationPreference) -> Self {
        Self {
            location: Some(location),
            ..Default::default()
        }
    }

    /// Patch the push token only
    pub fn push_token(token: impl Into<String>) -> Self {
        Self {
            push_token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Wire names of the fields this patch sets
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.language_id.is_some() {
            fields.push("languageId");
        }
        if self.location.is_some() {
            fields.push("location");
        }
        if self.push_token.is_some() {
            fields.push("pushToken");
        }
        fields
    }

    /// Whether the patch sets nothing
    pub fn is_empty(&self) -> bool {
        self.touched_fields().is_empty()
    }
}

// =============================================================================
// Profile
// =============================================================================

/// The signed-in user's profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// User id
    #[serde(default, deserialize_with = "opt_string_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Profile photo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Short bio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Profile {
    /// Overlay every field the server returned
    pub fn overlay(&mut self, confirmed: Profile) {
        let Profile { id, name, email, phone, photo_url, bio } = confirmed;
        self.id = id.or(self.id.take());
        self.name = name.or(self.name.take());
        self.email = email.or(self.email.take());
        self.phone = phone.or(self.phone.take());
        self.photo_url = photo_url.or(self.photo_url.take());
        self.bio = bio.or(self.bio.take());
    }

    /// Apply a patch locally
    pub fn apply(&mut self, patch: &ProfilePatch) {
        let patch = patch.clone();
        self.name = patch.name.or(self.name.take());
        self.email = patch.email.or(self.email.take());
        self.phone = patch.phone.or(self.phone.take());
        self.photo_url = patch.photo_url.or(self.photo_url.take());
        self.bio = patch.bio.or(self.bio.take());
    }
}

/// Partial update of [`Profile`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New photo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// New bio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfilePatch {
    /// Patch the photo only
    pub fn photo(url: impl Into<String>) -> Self {
        Self {
            photo_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Wire names of the fields this patch sets
    pub fn touched_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("email", self.email.is_some()),
            ("phone", self.phone.is_some()),
            ("photoUrl", self.photo_url.is_some()),
            ("bio", self.bio.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, set)| set.then_some(field))
        .collect()
    }
}

// =============================================================================
// Categories and News
// =============================================================================

/// A news category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category id
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// URL-safe name used as the news filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl Category {
    /// Value used to filter news by this category
    pub fn filter_value(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.id)
    }
}

/// A news article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Article id
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    /// Headline
    pub title: String,
    /// Short summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Lead image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Category slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Language code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    /// Publication time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Memberships
// =============================================================================

/// Review state of a membership application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Awaiting admin review
    Pending,
    /// Accepted
    Approved,
    /// Declined
    Rejected,
}

impl MembershipStatus {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Approved => "approved",
            MembershipStatus::Rejected => "rejected",
        }
    }
}

/// A membership application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    /// Membership id
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    /// Applicant name
    pub full_name: String,
    /// Applicant phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Membership tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_type: Option<String>,
    /// Review state
    pub status: MembershipStatus,
    /// Reviewer remarks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Submission time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A new membership application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDraft {
    /// Applicant name
    pub full_name: String,
    /// Applicant phone
    pub phone: String,
    /// Applicant email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Requested tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_type: Option<String>,
}

/// Admin decision on an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipStatusUpdate {
    /// New state
    pub status: MembershipStatus,
    /// Reviewer remarks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

// =============================================================================
// Media
// =============================================================================

/// Result of a media upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    /// Public URL of the uploaded file
    pub url: String,
    /// Media id
    #[serde(deserialize_with = "string_id")]
    pub media_id: String,
}
