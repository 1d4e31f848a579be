//! Storage inspection for debugging builds and bug reports

use crate::kv::{CacheStore, Result};

/// Default number of characters kept in a value preview
pub const DEFAULT_PREVIEW_LEN: usize = 120;

/// A cache entry summarized for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    /// Cache key
    pub key: String,
    /// Length of the stored value in bytes
    pub size_bytes: usize,
    /// First characters of the value
    pub preview: String,
    /// Whether the value parses as JSON
    pub is_json: bool,
}

fn preview(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Summarize every entry in the store, sorted by key
///
/// Each summary is also emitted at debug level.
pub async fn dump_entries(store: &dyn CacheStore, max_chars: usize) -> Result<Vec<EntrySummary>> {
    let mut entries = store.get_all().await?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let summaries: Vec<EntrySummary> = entries
        .into_iter()
        .map(|(key, value)| EntrySummary {
            size_bytes: value.len(),
            preview: preview(&value, max_chars),
            is_json: serde_json::from_str::<serde_json::Value>(&value).is_ok(),
            key,
        })
        .collect();

    for entry in &summaries {
        tracing::debug!(
            key = %entry.key,
            size = entry.size_bytes,
            json = entry.is_json,
            "{}",
            entry.preview
        );
    }

    Ok(summaries)
}
