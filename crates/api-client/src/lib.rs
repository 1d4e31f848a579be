//! Typed Newsdesk backend API
//!
//! Models for every resource the client caches and [`NewsApi`], a thin typed
//! layer over a [`networking::RemoteFetcher`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod endpoints;
pub mod models;

pub use endpoints::NewsApi;
pub use models::{
    Article, Category, LanguageOption, LocationPreference, MediaUpload, Membership,
    MembershipDraft, MembershipStatus, MembershipStatusUpdate, PreferencePatch, Preferences,
    Profile, ProfilePatch,
};
