//! taxa-gallery library
//!
//! Taxon image gallery: taxonomic/continent filtering, paginated rendering
//! with infinite scroll and lazy images, and taxon autocomplete. The page is
//! abstracted behind the traits in [`view`].

pub mod app;
pub mod autocomplete;
pub mod dataset;
pub mod enrichment;
pub mod error;
pub mod filter;
pub mod gallery;
pub mod models;
pub mod sequence;
pub mod services;
pub mod taxonomy;
pub mod url_state;
pub mod view;

pub use crate::app::{build_app, GalleryApp, SubmitOutcome};
pub use crate::error::{GalleryError, GalleryResult};
