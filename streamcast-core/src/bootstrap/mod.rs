//! Bootstrap module for wiring the cast core
//!
//! This module handles:
//! - Configuration loading
//! - Construction of the vendor adapters and services around an injected store

pub mod config;
pub mod services;

pub use config::load_config;
pub use services::{build_services, init_services, start, Services};
