//! Taxonomic/geographic filtering of the image list
//!
//! The engine asks a [`SpeciesFilter`] strategy for the set of species keys
//! that satisfy a request, then keeps the image records whose `gbif_id` is in
//! that set. The strategy is fixed when the engine is built:
//!
//! - [`LocalSpeciesFilter`]: static distribution data via [`TaxonomyIndex`]
//! - [`OccurrenceSpeciesFilter`]: GBIF occurrence search facets
//!
//! [`TaxonomyIndex`]: crate::taxonomy::TaxonomyIndex

pub mod local;
pub mod occurrence;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use taxa_common::config::DataSource;
use tracing::info;

use crate::error::{GalleryError, GalleryResult};
use crate::models::ImageRecord;
use crate::taxonomy::TaxonomyIndex;

pub use local::LocalSpeciesFilter;
pub use occurrence::{FacetCount, OccurrenceFacets, OccurrenceQuery, OccurrenceSpeciesFilter};

/// Value of the taxon selector meaning "no taxon restriction"
pub const ALL_TAXA: &str = "ALL";

/// Taxon part of a filter request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonSelection {
    All,
    Key(u64),
}

impl TaxonSelection {
    /// Parse a selector value: `"ALL"`, empty, or an integer key
    pub fn parse(value: &str) -> GalleryResult<Self> {
        let value = value.trim();
        if value.is_empty() || value == ALL_TAXA {
            return Ok(TaxonSelection::All);
        }
        value
            .parse::<u64>()
            .map(TaxonSelection::Key)
            .map_err(|_| GalleryError::InvalidTaxonKey(value.to_string()))
    }

    pub fn key(&self) -> Option<u64> {
        match self {
            TaxonSelection::All => None,
            TaxonSelection::Key(k) => Some(*k),
        }
    }
}

impl fmt::Display for TaxonSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonSelection::All => f.write_str(ALL_TAXA),
            TaxonSelection::Key(k) => write!(f, "{}", k),
        }
    }
}

/// A taxon + optional continent restriction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    pub taxon: TaxonSelection,
    pub continent: Option<String>,
}

impl FilterRequest {
    /// Build from raw selector values; an empty continent means none
    pub fn from_params(taxon_key: &str, continent: &str) -> GalleryResult<Self> {
        let continent = continent.trim();
        Ok(Self {
            taxon: TaxonSelection::parse(taxon_key)?,
            continent: (!continent.is_empty()).then(|| continent.to_string()),
        })
    }

    pub fn continent(&self) -> &str {
        self.continent.as_deref().unwrap_or("")
    }

    /// `ALL` with no continent: every record passes
    pub fn is_noop(&self) -> bool {
        self.taxon == TaxonSelection::All && self.continent.is_none()
    }
}

/// Strategy producing the species keys that satisfy a request
#[async_trait]
pub trait SpeciesFilter: Send + Sync {
    fn data_source(&self) -> DataSource;

    async fn matching_species(&self, request: &FilterRequest) -> GalleryResult<HashSet<String>>;
}

/// Applies a species strategy to image lists
#[derive(Clone)]
pub struct FilterEngine {
    strategy: Arc<dyn SpeciesFilter>,
}

impl FilterEngine {
    pub fn new(strategy: Arc<dyn SpeciesFilter>) -> Self {
        Self { strategy }
    }

    /// Engine backed by the static taxonomy
    pub fn local(index: Arc<TaxonomyIndex>) -> Self {
        Self::new(Arc::new(LocalSpeciesFilter::new(index)))
    }

    /// Engine backed by a remote occurrence facet source
    pub fn occurrence(api: Arc<dyn OccurrenceFacets>) -> Self {
        Self::new(Arc::new(OccurrenceSpeciesFilter::new(api)))
    }

    pub fn data_source(&self) -> DataSource {
        self.strategy.data_source()
    }

    /// Filter `images`, preserving their relative order
    pub async fn filter(
        &self,
        request: &FilterRequest,
        images: &[ImageRecord],
    ) -> GalleryResult<Vec<ImageRecord>> {
        if request.is_noop() {
            return Ok(images.to_vec());
        }

        let valid = self.strategy.matching_species(request).await?;
        let filtered = retain_matching(images, &valid);

        info!(
            taxon_key = %request.taxon,
            continent = %request.continent(),
            data_source = %self.data_source(),
            species = valid.len(),
            matched = filtered.len(),
            "Filter applied"
        );
        Ok(filtered)
    }
}

/// Records whose species key is in `valid`, in original order
///
/// Records without a species key never match.
pub fn retain_matching(images: &[ImageRecord], valid: &HashSet<String>) -> Vec<ImageRecord> {
    images
        .iter()
        .filter(|r| r.species_key().is_some_and(|k| valid.contains(k)))
        .cloned()
        .collect()
}
