//! Remote fetching for Newsdesk
//!
//! This crate provides the [`RemoteFetcher`] contract used by every
//! synchronizer, an HTTP implementation with bearer auth and read retries,
//! and the session provider that supplies credentials.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod retry;

pub use auth::{SessionHandle, SessionProvider};
pub use client::{decode, HttpFetcher, RemoteFetcher, RemoteFetcherExt};
pub use config::{FetcherConfig, RetryPolicy};
pub use error::{FetchError, Result};
pub use request::{ApiRequest, HttpMethod, RequestBody};
