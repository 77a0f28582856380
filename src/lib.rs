//! Earl Box - file upload and download service
//!
//! Accepts base64-encoded uploads over a small RPC surface, stores the bytes
//! under server-generated names and serves them back with strong caching
//! headers.

pub mod allocator;
pub mod api;
pub mod blob_store;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod server;
pub mod stats;
pub mod upload;
