// External Collaborators
//
// Two-tier architecture:
//
// Tier 1: streamcast-clients (Pure vendor HTTP clients)
//   - xtream::XtreamClient, mediamtx::MediaMtxClient, hass::HassClient
//   - Independent libraries with no dependency on the core traits
//
// Tier 2: streamcast-core/provider (trait adapters)
//   - XtreamProvider implements LiveTvProvider
//   - MediaMtxGateway implements TranscodeGateway
//   - HassHub implements MediaHub
//
// Services only ever see the traits, so tests swap in fakes.

pub mod traits;

pub mod hass;
pub mod mediamtx;
pub mod xtream;

pub use traits::*;

pub use hass::HassHub;
pub use mediamtx::MediaMtxGateway;
pub use xtream::XtreamProvider;
