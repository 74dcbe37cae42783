//! Supabase PostgREST metadata-store client.
//!
//! This crate provides:
//! - A thin PostgREST client (select / insert / update) authenticated with
//!   the service-role key
//! - The video job repository (status state machine persistence)
//! - The video asset cache repository (atomic insert-if-absent)
//! - Retry helpers for transient request failures

pub mod cache_repo;
pub mod client;
pub mod error;
pub mod jobs;
pub mod retry;

pub use cache_repo::VideoAssetCacheRepository;
pub use client::{SupabaseClient, SupabaseConfig};
pub use error::{DbError, DbResult};
pub use jobs::VideoJobRepository;
pub use retry::{retry_async, RetryConfig, RetryResult};
