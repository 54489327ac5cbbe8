//! Xtream Codes Live-TV Client
//!
//! Pure HTTP client for the Xtream Codes `player_api.php` surface, independent of
//! the core live-TV provider trait.
//!
//! # Example
//!
//! ```no_run
//! use streamcast_clients::xtream::XtreamClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = XtreamClient::new("http://iptv.example.com:8080", "user", "pass")?;
//! let categories = client.live_categories().await?;
//! let url = client.stream_url("101");
//! # Ok(())
//! # }
//! ```

mod client;
pub mod types;

pub use client::XtreamClient;
pub use types::*;
