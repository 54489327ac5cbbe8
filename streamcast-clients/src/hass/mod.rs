//! Home Assistant REST Client
//!
//! Pure HTTP client for the parts of the Home Assistant REST API used for
//! casting: entity states, the `media_player.play_media` service and camera
//! proxy stream URLs.

mod client;
pub mod types;

pub use client::HassClient;
pub use types::*;
