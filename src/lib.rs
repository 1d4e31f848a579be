//! Newsdesk client state layer
//!
//! Wires the cache store, the HTTP fetcher, the typed API and the
//! synchronizers into a single [`Newsdesk`] handle that the app shell holds
//! for its lifetime.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod telemetry;

pub use client::{Newsdesk, NewsdeskError, Result};
pub use config::NewsdeskConfig;

pub use api_client::{LanguageOption, MembershipStatus, NewsApi};
pub use app_state::{EffectiveLanguage, LanguageSource, SyncSnapshot, SyncStatus};
pub use networking::{FetcherConfig, RetryPolicy, SessionHandle};
pub use storage::KvConfig;
