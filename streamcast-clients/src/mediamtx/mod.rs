//! MediaMTX Control API Client
//!
//! Pure HTTP client for the MediaMTX v3 control API. Only the path
//! configuration and path status endpoints are covered; those are enough to
//! manage on-demand RTSP restreaming paths.

mod client;
pub mod types;

pub use client::{encode_path_name, MediaMtxClient};
pub use types::*;
