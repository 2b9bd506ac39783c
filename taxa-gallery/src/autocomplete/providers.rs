//! Suggestion providers
//!
//! - [`GbifSuggestions`]: one `species/suggest` request per rank, joined
//!   all-or-nothing and flattened in rank order
//! - [`WikidataSuggestions`]: entity search, then one claims lookup for the
//!   candidates; only taxa with a GBIF id become suggestions

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::debug;

use super::{Suggestion, SuggestionSource};
use crate::error::GalleryResult;
use crate::services::gbif_client::{GbifSuggestion, SUGGEST_RANKS};
use crate::services::{GbifClient, TaxonEntity, WikidataClient};

/// Name search restricted to one rank
#[async_trait]
pub trait RankSearch: Send + Sync {
    async fn suggest_rank(&self, query: &str, rank: &str) -> GalleryResult<Vec<GbifSuggestion>>;
}

#[async_trait]
impl RankSearch for GbifClient {
    async fn suggest_rank(&self, query: &str, rank: &str) -> GalleryResult<Vec<GbifSuggestion>> {
        self.suggest(query, rank).await
    }
}

pub struct GbifSuggestions {
    search: Arc<dyn RankSearch>,
}

impl GbifSuggestions {
    pub fn new(search: Arc<dyn RankSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl SuggestionSource for GbifSuggestions {
    fn name(&self) -> &'static str {
        "gbif"
    }

    async fn suggest(&self, query: &str) -> GalleryResult<Vec<Suggestion>> {
        let per_rank = try_join_all(
            SUGGEST_RANKS
                .iter()
                .map(|rank| self.search.suggest_rank(query, rank)),
        )
        .await?;

        let suggestions: Vec<Suggestion> = per_rank
            .into_iter()
            .zip(SUGGEST_RANKS.iter())
            .flat_map(|(hits, rank)| {
                hits.into_iter().map(move |hit| Suggestion {
                    key: hit.key.to_string(),
                    name: hit.scientific_name,
                    rank: Some(hit.rank.unwrap_or_else(|| rank.to_string())),
                })
            })
            .collect();

        debug!(query = %query, count = suggestions.len(), "GBIF suggestions");
        Ok(suggestions)
    }
}

pub struct WikidataSuggestions {
    client: Arc<WikidataClient>,
}

impl WikidataSuggestions {
    pub fn new(client: Arc<WikidataClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SuggestionSource for WikidataSuggestions {
    fn name(&self) -> &'static str {
        "wikidata"
    }

    async fn suggest(&self, query: &str) -> GalleryResult<Vec<Suggestion>> {
        let hits = self.client.search_entities(query).await?;
        let qids: Vec<String> = hits.into_iter().map(|h| h.id).collect();
        let entities = self.client.get_entities(&qids).await?;
        Ok(entity_suggestions(&entities))
    }
}

/// Suggestions for the entities that carry a GBIF taxon id
pub fn entity_suggestions(entities: &[TaxonEntity]) -> Vec<Suggestion> {
    entities
        .iter()
        .filter_map(|e| {
            Some(Suggestion {
                key: e.gbif_id.clone()?,
                name: e.display_name().to_string(),
                rank: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GalleryError;

    struct FakeRanks {
        failing_rank: Option<&'static str>,
    }

    #[async_trait]
    impl RankSearch for FakeRanks {
        async fn suggest_rank(&self, query: &str, rank: &str) -> GalleryResult<Vec<GbifSuggestion>> {
            if Some(rank) == self.failing_rank {
                return Err(GalleryError::Api(503, "busy".to_string()));
            }
            let key = match rank {
                "CLASS" => 212,
                "GENUS" => 2435194,
                _ => return Ok(Vec::new()),
            };
            Ok(vec![GbifSuggestion {
                key,
                scientific_name: format!("{} {}", query, rank.to_lowercase()),
                rank: None,
            }])
        }
    }

    #[tokio::test]
    async fn test_ranks_flattened_in_order() {
        let source = GbifSuggestions::new(Arc::new(FakeRanks { failing_rank: None }));
        let suggestions = source.suggest("Ave").await.unwrap();

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].key, "212");
        assert_eq!(suggestions[0].rank.as_deref(), Some("CLASS"));
        assert_eq!(suggestions[1].key, "2435194");
    }

    #[tokio::test]
    async fn test_one_failed_rank_fails_all() {
        let source = GbifSuggestions::new(Arc::new(FakeRanks {
            failing_rank: Some("ORDER"),
        }));
        assert!(matches!(
            source.suggest("Ave").await,
            Err(GalleryError::Api(503, _))
        ));
    }

    #[test]
    fn test_entity_suggestions_require_gbif_id() {
        let entities = vec![
            TaxonEntity {
                qid: "Q140".to_string(),
                gbif_id: Some("5219404".to_string()),
                taxon_name: Some("Panthera leo".to_string()),
                label: Some("lion".to_string()),
            },
            TaxonEntity {
                qid: "Q1".to_string(),
                gbif_id: None,
                taxon_name: None,
                label: Some("universe".to_string()),
            },
        ];
        let suggestions = entity_suggestions(&entities);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].key, "5219404");
        assert_eq!(suggestions[0].name, "Panthera leo");
    }
}
