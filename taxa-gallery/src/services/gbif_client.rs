//! GBIF API client
//!
//! Covers the four GBIF endpoints the gallery touches:
//! - `species/suggest` for autocomplete, one rank at a time
//! - `occurrence/search` faceted by species key for server-side filtering
//! - `species/{key}/distributions` and `species/{key}/parents` for building
//!   the static reference mapping
//!
//! API Documentation: https://techdocs.gbif.org/en/openapi/

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::http::ApiClient;
use crate::error::{GalleryError, GalleryResult};
use crate::filter::{FacetCount, OccurrenceFacets, OccurrenceQuery};

/// Requests per second allowed against GBIF
const RATE_LIMIT_PER_SEC: u32 = 20;

/// Ranks queried by autocomplete, in display order
pub const SUGGEST_RANKS: [&str; 6] = ["PHYLUM", "CLASS", "ORDER", "FAMILY", "GENUS", "SPECIES"];

/// One `species/suggest` hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GbifSuggestion {
    pub key: u64,
    pub scientific_name: String,
    #[serde(default)]
    pub rank: Option<String>,
}

/// Distribution summary of one taxon
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    /// Unique locality strings
    pub localities: Vec<String>,
    /// Unique country codes
    pub country_codes: Vec<String>,
}

/// GBIF REST client
pub struct GbifClient {
    api: ApiClient,
    base_url: String,
}

impl GbifClient {
    pub fn new(base_url: impl Into<String>) -> GalleryResult<Self> {
        Ok(Self {
            api: ApiClient::new("gbif", RATE_LIMIT_PER_SEC)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Accepted taxa of one rank whose name starts like `query`
    pub async fn suggest(&self, query: &str, rank: &str) -> GalleryResult<Vec<GbifSuggestion>> {
        let url = format!("{}/species/suggest", self.base_url);
        let params = [
            ("q", query.to_string()),
            ("rank", rank.to_string()),
            ("status", "ACCEPTED".to_string()),
        ];

        let body = self.api.get_json(&url, &params).await?;
        serde_json::from_value(body).map_err(|e| GalleryError::Parse(e.to_string()))
    }

    /// Localities and country codes recorded for a taxon
    pub async fn distributions(&self, taxon_key: &str) -> GalleryResult<Distribution> {
        let url = format!("{}/species/{}/distributions", self.base_url, taxon_key);
        let body = self.api.get_json(&url, &[("limit", "1000".to_string())]).await?;
        Ok(parse_distributions(&body))
    }

    /// Ancestor keys of a taxon
    pub async fn parents(&self, taxon_key: &str) -> GalleryResult<Vec<u64>> {
        let url = format!("{}/species/{}/parents", self.base_url, taxon_key);
        let body = self.api.get_json(&url, &[]).await?;
        parse_parents(&body)
    }
}

#[async_trait]
impl OccurrenceFacets for GbifClient {
    async fn species_facets(&self, query: &OccurrenceQuery) -> GalleryResult<Vec<FacetCount>> {
        let url = format!("{}/occurrence/search", self.base_url);
        let params = occurrence_query_params(query);
        debug!(?params, "Querying GBIF occurrence facets");

        let body = self.api.get_json(&url, &params).await?;
        let facets = parse_species_facets(&body)?;

        info!(
            taxon_key = ?query.taxon_key,
            continent = ?query.continent,
            species = facets.len(),
            "Retrieved species facets from GBIF"
        );
        Ok(facets)
    }
}

/// Query string for a species-faceted occurrence search
///
/// `limit=0` asks for facets only; continent is omitted when unset.
pub fn occurrence_query_params(query: &OccurrenceQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(6);
    if let Some(key) = query.taxon_key {
        params.push(("taxonKey", key.to_string()));
    }
    params.push(("limit", "0".to_string()));
    params.push(("facet", "speciesKey".to_string()));
    params.push(("facetMincount", query.facet_min_count.to_string()));
    params.push(("facetLimit", query.facet_limit.to_string()));
    if let Some(continent) = query.continent.as_deref().filter(|c| !c.is_empty()) {
        params.push(("continent", continent.to_string()));
    }
    params
}

/// Extract the first facet's buckets
///
/// A missing or empty `facets` array is [`GalleryError::NoFacets`]; a facet
/// with no buckets is [`GalleryError::NoSpecies`].
pub fn parse_species_facets(body: &Value) -> GalleryResult<Vec<FacetCount>> {
    let first = body
        .get("facets")
        .and_then(Value::as_array)
        .and_then(|f| f.first())
        .ok_or(GalleryError::NoFacets)?;

    let counts = first
        .get("counts")
        .and_then(Value::as_array)
        .filter(|c| !c.is_empty())
        .ok_or(GalleryError::NoSpecies)?;

    Ok(counts
        .iter()
        .filter_map(|bucket| {
            let name = match bucket.get("name")? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let count = bucket.get("count").and_then(Value::as_u64).unwrap_or(0);
            Some(FacetCount { name, count })
        })
        .collect())
}

/// Unique localities and country codes from a distributions page
pub fn parse_distributions(body: &Value) -> Distribution {
    let mut localities: Vec<String> = Vec::new();
    let mut country_codes: Vec<String> = Vec::new();

    let results = body
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for result in results {
        if let Some(locality) = result.get("locality").and_then(Value::as_str) {
            if !locality.is_empty() && !localities.iter().any(|l| l == locality) {
                localities.push(locality.to_string());
            }
        }
        if let Some(country) = result.get("country").and_then(Value::as_str) {
            if !country.is_empty() && !country_codes.iter().any(|c| c == country) {
                country_codes.push(country.to_string());
            }
        }
    }

    Distribution {
        localities,
        country_codes,
    }
}

/// Keys from a `species/{key}/parents` array
pub fn parse_parents(body: &Value) -> GalleryResult<Vec<u64>> {
    let parents = body
        .as_array()
        .ok_or_else(|| GalleryError::Parse("parents response is not an array".to_string()))?;
    Ok(parents
        .iter()
        .filter_map(|p| p.get("key").and_then(Value::as_u64))
        .collect())
}
