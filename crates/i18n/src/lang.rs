//! Language selection and code handling
//!
//! The app persists the user's language choice as a small JSON object
//! `{id?, code?, name?}`. Older releases wrote numeric ids and occasionally
//! blank strings, so reading is lenient: anything unusable is dropped rather
//! than rejected.

use serde::{Deserialize, Deserializer, Serialize};
use unic_langid::LanguageIdentifier;

/// Language code used when nothing else is known
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// Display name of the default language
pub const DEFAULT_LANGUAGE_NAME: &str = "English";

/// Normalize a language code to its canonical BCP 47 form
///
/// Returns `None` for blank, undetermined or malformed codes.
///
/// ```
/// use i18n::normalize_code;
///
/// assert_eq!(normalize_code(" TE "), Some("te".to_string()));
/// assert_eq!(normalize_code("en_us"), Some("en-US".to_string()));
/// assert_eq!(normalize_code("not a language"), None);
/// ```
pub fn normalize_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return None;
    }

    let langid: LanguageIdentifier = trimmed.replace('_', "-").parse().ok()?;
    let canonical = langid.to_string();
    if canonical == "und" {
        return None;
    }
    Some(canonical)
}

/// A language choice as stored under `selectedLanguage` / `language_local`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSelection {
    /// Backend language id
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Language code (e.g. "te", "hi")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LanguageSelection {
    /// Create a complete selection
    pub fn new(id: impl Into<String>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            code: Some(code.into()),
            name: Some(name.into()),
        }
    }

    /// The built-in fallback language
    pub fn default_language() -> Self {
        Self {
            id: None,
            code: Some(DEFAULT_LANGUAGE_CODE.to_string()),
            name: Some(DEFAULT_LANGUAGE_NAME.to_string()),
        }
    }

    /// Parse a cached payload, returning `None` if it is malformed or unusable
    pub fn from_cached(raw: &str) -> Option<Self> {
        let selection: Self = serde_json::from_str(raw).ok()?;
        selection.is_usable().then_some(selection)
    }

    /// Non-blank id
    pub fn usable_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Canonical code, if the stored code is a valid language identifier
    pub fn usable_code(&self) -> Option<String> {
        self.code.as_deref().and_then(normalize_code)
    }

    /// Non-blank display name
    pub fn usable_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }

    /// Whether the selection identifies a language at all
    pub fn is_usable(&self) -> bool {
        self.usable_id().is_some() || self.usable_code().is_some()
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("te"), Some("te".to_string()));
        assert_eq!(normalize_code("HI"), Some("hi".to_string()));
        assert_eq!(normalize_code(""), None);
        assert_eq!(normalize_code("   "), None);
        assert_eq!(normalize_code("und"), None);
        assert_eq!(normalize_code("??"), None);
    }

    #[test]
    fn test_from_cached_numeric_id() {
        let selection = LanguageSelection::from_cached(r#"{"id":3,"code":"te","name":"తెలుగు"}"#)
            .unwrap();
        assert_eq!(selection.usable_id(), Some("3"));
        assert_eq!(selection.usable_code(), Some("te".to_string()));
        assert_eq!(selection.usable_name(), Some("తెలుగు"));
    }

    #[test]
    fn test_from_cached_rejects_garbage() {
        assert!(LanguageSelection::from_cached("{oops").is_none());
        assert!(LanguageSelection::from_cached("null").is_none());
        assert!(LanguageSelection::from_cached("{}").is_none());
        assert!(LanguageSelection::from_cached(r#"{"id":"  ","code":""}"#).is_none());
        assert!(LanguageSelection::from_cached(r#"["te"]"#).is_none());
    }

    #[test]
    fn test_code_only_selection_is_usable() {
        let selection = LanguageSelection::from_cached(r#"{"code":"hi"}"#).unwrap();
        assert!(selection.usable_id().is_none());
        assert!(selection.is_usable());
    }

    #[test]
    fn test_default_language() {
        let selection = LanguageSelection::default_language();
        assert_eq!(selection.usable_code(), Some(DEFAULT_LANGUAGE_CODE.to_string()));
        assert!(selection.id.is_none());
    }

    #[test]
    fn test_serialization_skips_missing_fields() {
        let selection = LanguageSelection {
            id: None,
            code: Some("te".to_string()),
            name: None,
        };
        assert_eq!(serde_json::to_string(&selection).unwrap(), r#"{"code":"te"}"#);
    }
}
