//! Data models shared across the gallery

pub mod image_record;

pub use image_record::{parse_record_list, parse_sparql_results, split_langs, ImageRecord};
