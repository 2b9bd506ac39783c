//! # taxa-gallery common library
//!
//! Shared code for the taxa-gallery crates:
//! - Error type and result alias
//! - Configuration loading (TOML + environment + CLI overrides)
//! - Gallery event types and the broadcast EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{EventBus, GalleryEvent};
