//! Core domain logic for the miggram bot API client.
//!
//! This crate is transport-agnostic. The HTTP client lives behind the
//! [`transport::Transport`] port, implemented in adapter crates.

pub mod classify;
pub mod config;
pub mod cursor;
pub mod domain;
pub mod errors;
pub mod keyboard;
pub mod logging;
pub mod options;
pub mod params;
pub mod transport;
pub mod types;

pub use errors::{Error, Result};
