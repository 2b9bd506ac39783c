//! Paginated gallery: state, page arithmetic, items and the controller

pub mod controller;
pub mod item;
pub mod lazy_images;
pub mod pagination;
pub mod state;

pub use controller::{PaginatedGalleryController, RenderOutcome};
pub use item::{GalleryItem, GlobalUsage, WikiLanguages, WikiLink};
pub use lazy_images::LazyImageRegistry;
pub use state::GalleryState;
