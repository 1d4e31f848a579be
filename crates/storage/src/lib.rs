//! Storage layer for Newsdesk
//!
//! This crate provides the local cache store abstraction shared by every
//! synchronizer: a string-only key-value contract, a durable sled-backed
//! implementation, an in-memory implementation for tests, the cache key
//! naming convention, and best-effort JSON helpers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod debug;
pub mod json;
pub mod keys;
pub mod kv;
pub mod memory;

pub use kv::{CacheStore, KvConfig, Result, SledStore, StorageError};
pub use memory::MemoryStore;
