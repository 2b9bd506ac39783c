//! Taxonomic and geographic reference data

pub mod continents;
pub mod index;

pub use continents::{ContinentRule, ContinentRules};
pub use index::{Taxon, TaxonomyIndex, COUNTRY_CODES_FILE, KEYWORDS_FILE, MAPPING_FILE};
