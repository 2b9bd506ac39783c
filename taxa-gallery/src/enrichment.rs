//! Per-page metadata enrichment
//!
//! After a page is rendered its items are decorated with Wikipedia language
//! availability and Commons global usage counts. Both lookups run
//! concurrently; a failing lookup is logged and simply yields nothing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::GalleryResult;
use crate::gallery::GalleryItem;
use crate::sequence::Generation;
use crate::services::wikidata_client::is_valid_qid;
use crate::services::{CommonsClient, WikidataClient};

/// QID → languages with a Wikipedia article
#[async_trait]
pub trait LanguageLookup: Send + Sync {
    async fn languages(&self, qids: &[String]) -> GalleryResult<HashMap<String, Vec<String>>>;
}

/// File name → global usage count
#[async_trait]
pub trait GlobalUsageLookup: Send + Sync {
    async fn usage_counts(&self, file_names: &[String]) -> GalleryResult<HashMap<String, usize>>;
}

#[async_trait]
impl LanguageLookup for WikidataClient {
    async fn languages(&self, qids: &[String]) -> GalleryResult<HashMap<String, Vec<String>>> {
        self.language_availability(qids).await
    }
}

#[async_trait]
impl GlobalUsageLookup for CommonsClient {
    async fn usage_counts(&self, file_names: &[String]) -> GalleryResult<HashMap<String, usize>> {
        self.global_usage(file_names).await
    }
}

/// Lookup results for one rendered page
#[derive(Debug, Clone)]
pub struct BatchEnrichment {
    pub generation: Generation,
    pub languages: HashMap<String, Vec<String>>,
    pub global_usage: HashMap<String, usize>,
}

#[derive(Clone, Default)]
pub struct Enricher {
    languages: Option<Arc<dyn LanguageLookup>>,
    global_usage: Option<Arc<dyn GlobalUsageLookup>>,
}

impl Enricher {
    pub fn new(
        languages: Option<Arc<dyn LanguageLookup>>,
        global_usage: Option<Arc<dyn GlobalUsageLookup>>,
    ) -> Self {
        Self {
            languages,
            global_usage,
        }
    }

    /// No lookups configured
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.languages.is_some() || self.global_usage.is_some()
    }

    /// Look up metadata for a page of items
    pub async fn enrich(&self, generation: Generation, items: &[GalleryItem]) -> BatchEnrichment {
        let qids = unique_qids(items);
        let files = unique_file_names(items);

        let langs = async {
            match (&self.languages, qids.is_empty()) {
                (Some(lookup), false) => lookup.languages(&qids).await.unwrap_or_else(|e| {
                    warn!("Error fetching Wikidata langs: {}", e);
                    HashMap::new()
                }),
                _ => HashMap::new(),
            }
        };
        let usage = async {
            match (&self.global_usage, files.is_empty()) {
                (Some(lookup), false) => lookup.usage_counts(&files).await.unwrap_or_else(|e| {
                    warn!("Error fetching global usage data: {}", e);
                    HashMap::new()
                }),
                _ => HashMap::new(),
            }
        };
        let (languages, global_usage) = tokio::join!(langs, usage);

        debug!(
            generation = generation.value(),
            qids = qids.len(),
            files = files.len(),
            languages = languages.len(),
            global_usage = global_usage.len(),
            "Batch enrichment complete"
        );

        BatchEnrichment {
            generation,
            languages,
            global_usage,
        }
    }
}

/// Valid QIDs of `items`, first occurrence order
pub fn unique_qids(items: &[GalleryItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|i| i.qid.as_deref())
        .filter(|q| is_valid_qid(q))
        .filter(|q| seen.insert(*q))
        .map(str::to_string)
        .collect()
}

/// Commons file names of `items`, first occurrence order
pub fn unique_file_names(items: &[GalleryItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|i| i.file_name.as_deref())
        .filter(|f| seen.insert(*f))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GalleryError;
    use crate::models::ImageRecord;
    use crate::sequence::RequestSequencer;

    struct FixedLangs;

    #[async_trait]
    impl LanguageLookup for FixedLangs {
        async fn languages(&self, qids: &[String]) -> GalleryResult<HashMap<String, Vec<String>>> {
            Ok(qids.iter().map(|q| (q.clone(), vec!["en".to_string()])).collect())
        }
    }

    struct BrokenUsage;

    #[async_trait]
    impl GlobalUsageLookup for BrokenUsage {
        async fn usage_counts(&self, _: &[String]) -> GalleryResult<HashMap<String, usize>> {
            Err(GalleryError::Network("connection reset".to_string()))
        }
    }

    fn item(qid: &str, url: &str) -> GalleryItem {
        let record = ImageRecord {
            taxon: Some(format!("http://www.wikidata.org/entity/{}", qid)),
            url: Some(url.to_string()),
            ..Default::default()
        };
        GalleryItem::from_record(format!("{}-{}", qid, url), &record)
    }

    #[test]
    fn test_unique_qids_validates_and_dedups() {
        let items = vec![
            item("Q1", "a.jpg"),
            item("Q1", "b.jpg"),
            item("L55", "c.jpg"),
            item("Q2", "a.jpg"),
        ];
        assert_eq!(unique_qids(&items), vec!["Q1", "Q2"]);
        assert_eq!(unique_file_names(&items), vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[tokio::test]
    async fn test_failed_lookup_yields_empty_map() {
        let enricher = Enricher::new(Some(Arc::new(FixedLangs)), Some(Arc::new(BrokenUsage)));
        let generation = RequestSequencer::new().next();

        let result = enricher
            .enrich(generation, &[item("Q1", "a.jpg"), item("Q2", "b.jpg")])
            .await;
        assert_eq!(result.generation, generation);
        assert_eq!(result.languages.len(), 2);
        assert!(result.global_usage.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_enricher() {
        let enricher = Enricher::disabled();
        assert!(!enricher.is_enabled());
        let result = enricher
            .enrich(RequestSequencer::new().next(), &[item("Q1", "a.jpg")])
            .await;
        assert!(result.languages.is_empty());
    }
}
