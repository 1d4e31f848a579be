//! Client state for Newsdesk
//!
//! This crate keeps server state available offline: synchronizers for each
//! remote resource, the effective-language resolver, and the news list cache
//! that follows the user's language.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod memberships;
pub mod news;
pub mod preferences;
pub mod profile;
pub mod resolver;
pub mod sync;

#[cfg(test)]
mod testing;

pub use catalog::{CategoriesResource, CategoriesSync, LanguagesResource, LanguagesSync};
pub use memberships::{MembershipMutation, MembershipScope, MembershipsResource, MembershipsSync};
pub use news::{NewsCacheInvalidator, NewsFeed};
pub use preferences::{PreferencesResource, PreferencesSync};
pub use profile::{ProfilePhotoCache, ProfileResource, ProfileSync};
pub use resolver::{EffectiveLanguage, LanguageSource, PreferenceResolver};
pub use sync::{
    DependentCache, RefreshOutcome, Resource, Result, SyncError, SyncSnapshot, SyncStatus,
    Synchronizer,
};
