//! Reference mapping builder
//!
//! Produces `gbif_mapping.json` for the local filter strategy: for every
//! GBIF id in an image list, its distribution localities, country codes and
//! parent keys. Ids already in an existing mapping are skipped, so an
//! interrupted run can be resumed.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{error, info};

use crate::error::{GalleryError, GalleryResult};
use crate::models::ImageRecord;
use crate::services::gbif_client::Distribution;
use crate::services::GbifClient;
use crate::taxonomy::{Taxon, TaxonomyIndex};

/// Ids fetched between two progress saves
pub const SAVE_EVERY: usize = 10;

/// Per-taxon lookups needed for the mapping
#[async_trait]
pub trait TaxonDetails: Send + Sync {
    async fn distributions(&self, taxon_key: &str) -> GalleryResult<Distribution>;
    async fn parents(&self, taxon_key: &str) -> GalleryResult<Vec<u64>>;
}

#[async_trait]
impl TaxonDetails for GbifClient {
    async fn distributions(&self, taxon_key: &str) -> GalleryResult<Distribution> {
        GbifClient::distributions(self, taxon_key).await
    }

    async fn parents(&self, taxon_key: &str) -> GalleryResult<Vec<u64>> {
        GbifClient::parents(self, taxon_key).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Ids looked up in this run
    pub fetched: usize,
    /// Ids already present in the mapping
    pub skipped: usize,
    /// Lookups (distributions or parents) that failed
    pub failures: usize,
    /// Entries in the saved mapping
    pub total: usize,
}

pub struct MappingBuilder {
    details: Arc<dyn TaxonDetails>,
    output: PathBuf,
}

impl MappingBuilder {
    pub fn new(details: Arc<dyn TaxonDetails>, output: impl Into<PathBuf>) -> Self {
        Self {
            details,
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Fetch missing entries for the ids in `images` and save the mapping
    pub async fn build(&self, images: &[ImageRecord]) -> GalleryResult<BuildSummary> {
        let mut mapping = self.load_existing().await?;
        let ids = unique_species_keys(images);

        let mut summary = BuildSummary::default();
        let missing: Vec<String> = ids
            .into_iter()
            .filter(|id| {
                let present = mapping.contains_key(id);
                if present {
                    summary.skipped += 1;
                }
                !present
            })
            .collect();

        info!(
            missing = missing.len(),
            skipped = summary.skipped,
            output = %self.output.display(),
            "Building GBIF mapping"
        );

        for batch in missing.chunks(SAVE_EVERY) {
            let results = join_all(batch.iter().map(|id| self.fetch_taxon(id))).await;
            for (id, (taxon, failures)) in batch.iter().zip(results) {
                mapping.insert(id.clone(), taxon);
                summary.failures += failures;
            }
            summary.fetched += batch.len();
            self.save(&mapping).await?;
            info!(done = summary.fetched, of = missing.len(), "Progress saved");
        }

        self.save(&mapping).await?;
        summary.total = mapping.len();
        info!(
            total = summary.total,
            failures = summary.failures,
            "Final GBIF mapping saved to {}",
            self.output.display()
        );
        Ok(summary)
    }

    /// One entry; each lookup fails independently and leaves its fields empty
    async fn fetch_taxon(&self, id: &str) -> (Taxon, usize) {
        let mut taxon = Taxon::default();
        let mut failures = 0;

        match self.details.distributions(id).await {
            Ok(d) => {
                taxon.localities = d.localities;
                taxon.country_codes = d.country_codes;
            }
            Err(e) => {
                error!(gbif_id = %id, "Error fetching distributions: {}", e);
                failures += 1;
            }
        }
        match self.details.parents(id).await {
            Ok(parents) => taxon.parents = parents.iter().map(u64::to_string).collect(),
            Err(e) => {
                error!(gbif_id = %id, "Error fetching parents: {}", e);
                failures += 1;
            }
        }
        (taxon, failures)
    }

    async fn load_existing(&self) -> GalleryResult<BTreeMap<String, Taxon>> {
        match tokio::fs::read_to_string(&self.output).await {
            Ok(content) => Ok(TaxonomyIndex::parse_mapping(&content)?.into_iter().collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(GalleryError::Common(e.into())),
        }
    }

    async fn save(&self, mapping: &BTreeMap<String, Taxon>) -> GalleryResult<()> {
        let json = serde_json::to_string_pretty(mapping).map_err(taxa_common::Error::from)?;
        tokio::fs::write(&self.output, json)
            .await
            .map_err(taxa_common::Error::from)?;
        Ok(())
    }
}

/// Non-empty species keys of `images`, first occurrence order
pub fn unique_species_keys(images: &[ImageRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    images
        .iter()
        .filter_map(ImageRecord::species_key)
        .filter(|k| seen.insert(*k))
        .map(str::to_string)
        .collect()
}
