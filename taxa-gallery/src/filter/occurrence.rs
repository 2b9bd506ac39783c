//! Species filter backed by remote occurrence aggregation
//!
//! The remote side counts occurrences of the requested taxon (optionally
//! restricted to a continent) and facets them by species key. Species with
//! at least the minimum count come back as facet buckets.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taxa_common::config::DataSource;

use super::{FilterRequest, SpeciesFilter};
use crate::error::{GalleryError, GalleryResult};

/// Minimum occurrences for a species bucket to be returned
pub const FACET_MIN_COUNT: u32 = 10;

/// Maximum number of species buckets requested
pub const FACET_LIMIT: u32 = 5000;

/// Parameters of one facet query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceQuery {
    pub taxon_key: Option<u64>,
    pub continent: Option<String>,
    pub facet_min_count: u32,
    pub facet_limit: u32,
}

impl OccurrenceQuery {
    pub fn from_request(request: &FilterRequest) -> Self {
        Self {
            taxon_key: request.taxon.key(),
            continent: request.continent.clone(),
            facet_min_count: FACET_MIN_COUNT,
            facet_limit: FACET_LIMIT,
        }
    }
}

/// One facet bucket: species key and its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub name: String,
    pub count: u64,
}

/// Remote source of species facets
#[async_trait]
pub trait OccurrenceFacets: Send + Sync {
    async fn species_facets(&self, query: &OccurrenceQuery) -> GalleryResult<Vec<FacetCount>>;
}

/// Server-side aggregation strategy
pub struct OccurrenceSpeciesFilter {
    api: Arc<dyn OccurrenceFacets>,
}

impl OccurrenceSpeciesFilter {
    pub fn new(api: Arc<dyn OccurrenceFacets>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SpeciesFilter for OccurrenceSpeciesFilter {
    fn data_source(&self) -> DataSource {
        DataSource::OccurrenceApi
    }

    async fn matching_species(&self, request: &FilterRequest) -> GalleryResult<HashSet<String>> {
        let facets = self
            .api
            .species_facets(&OccurrenceQuery::from_request(request))
            .await?;
        if facets.is_empty() {
            return Err(GalleryError::NoSpecies);
        }

        // buckets that are all zero still mean "nothing here": an empty set, not an error
        Ok(facets
            .into_iter()
            .filter(|f| f.count > 0)
            .map(|f| f.name)
            .collect())
    }
}
