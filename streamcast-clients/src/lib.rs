// Streamcast Vendor Clients
//
// This crate contains pure HTTP client implementations for the external systems
// the cast core talks to. The clients are independent of the core's provider
// traits and can be used standalone.
//
// Architecture:
// - streamcast-clients: Pure HTTP clients (Xtream, MediaMTX, Home Assistant)
// - streamcast-core/provider: trait adapters calling these clients
// - streamcast-core/service: resolver, dispatcher and target listing

// Shared error types
pub mod error;

// HTTP clients
pub mod hass;
pub mod mediamtx;
pub mod xtream;

// Re-export client types for convenience
pub use error::ClientError;
pub use hass::HassClient;
pub use mediamtx::MediaMtxClient;
pub use xtream::XtreamClient;
