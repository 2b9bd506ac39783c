//! Species filter backed by the static taxonomy index

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use taxa_common::config::DataSource;

use super::{FilterRequest, SpeciesFilter, TaxonSelection};
use crate::error::GalleryResult;
use crate::taxonomy::TaxonomyIndex;

/// Client-side strategy over `gbif_mapping.json`
pub struct LocalSpeciesFilter {
    index: Arc<TaxonomyIndex>,
}

impl LocalSpeciesFilter {
    pub fn new(index: Arc<TaxonomyIndex>) -> Self {
        Self { index }
    }

    /// Keys of the taxa under `taxon` (every key for `All`)
    ///
    /// A specific key selects the taxa whose parent list contains it; the
    /// key itself is not included.
    pub fn species_in_taxon(&self, taxon: TaxonSelection) -> Vec<&str> {
        match taxon {
            TaxonSelection::All => self.index.all_ids().collect(),
            TaxonSelection::Key(key) => self
                .index
                .descendants_of(&key.to_string())
                .iter()
                .map(String::as_str)
                .collect(),
        }
    }

    /// Synchronous core of [`SpeciesFilter::matching_species`]
    pub fn valid_species(&self, request: &FilterRequest) -> HashSet<String> {
        let candidates = self.species_in_taxon(request.taxon);
        let continent = request.continent();

        candidates
            .into_iter()
            .filter(|id| continent.is_empty() || self.index.is_in_continent(id, continent))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl SpeciesFilter for LocalSpeciesFilter {
    fn data_source(&self) -> DataSource {
        DataSource::Local
    }

    async fn matching_species(&self, request: &FilterRequest) -> GalleryResult<HashSet<String>> {
        Ok(self.valid_species(request))
    }
}
