//! Cache key names
//!
//! These names are shared with earlier app releases and must not change.

/// Last explicit language choice, JSON `{id?, code?, name?}`
pub const SELECTED_LANGUAGE: &str = "selectedLanguage";

/// Legacy language selection, same shape as [`SELECTED_LANGUAGE`]
pub const LANGUAGE_LOCAL: &str = "language_local";

/// Serialized preference record
pub const PREFERENCES: &str = "preferences_cache_v1";

/// Profile photo URL, stored as a plain string (not JSON)
pub const PROFILE_PHOTO_URL: &str = "profile_photo_url";

/// Serialized profile
pub const PROFILE: &str = "profile_cache_v1";

/// Serialized language catalog
pub const LANGUAGES: &str = "languages_cache_v1";

/// Serialized category list
pub const CATEGORIES: &str = "categories_cache_v1";

/// Serialized list of the signed-in user's memberships
pub const MEMBERSHIPS: &str = "memberships_cache_v1";

/// Prefix for admin membership lists, one key per status filter
pub const ADMIN_MEMBERSHIPS_PREFIX: &str = "admin_memberships_cache_v1";

/// Prefix for news article lists
pub const NEWS_CACHE_PREFIX: &str = "news_cache";

/// News list key for a language, optionally narrowed to a category
///
/// ```
/// use storage::keys::news_cache;
///
/// assert_eq!(news_cache("te", None), "news_cache:te");
/// assert_eq!(news_cache("te", Some("sports")), "news_cache:te:sports");
/// ```
pub fn news_cache(language_code: &str, category: Option<&str>) -> String {
    match category {
        Some(category) => format!("{}:{}:{}", NEWS_CACHE_PREFIX, language_code, category),
        None => format!("{}:{}", NEWS_CACHE_PREFIX, language_code),
    }
}

/// Whether `key` is a news list key belonging to `language_code`
pub fn is_news_key_for(key: &str, language_code: &str) -> bool {
    let base = news_cache(language_code, None);
    key == base || key.starts_with(&format!("{}:", base))
}

/// Admin membership list key for a status filter (`all` when unfiltered)
pub fn admin_memberships(status: Option<&str>) -> String {
    format!("{}:{}", ADMIN_MEMBERSHIPS_PREFIX, status.unwrap_or("all"))
}
