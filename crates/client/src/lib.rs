//! Async job lifecycle client for the style transfer service.
//!
//! Provides the HTTP API wrapper, the lifecycle runner (submit ->
//! poll -> probe -> finalize, supervised by a hard deadline), and the
//! [`TransferManager`](manager::TransferManager) that enforces the
//! single-live-job rule and hands out the snapshot stream.

pub mod api;
pub mod backend;
pub mod manager;
mod runner;
