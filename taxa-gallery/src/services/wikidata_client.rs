//! Wikidata client
//!
//! Two uses:
//! - entity search for autocomplete (`wbsearchentities` then one
//!   `wbgetentities` batch for the candidates' claims)
//! - Wikipedia language availability per taxon via the SPARQL endpoint

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::http::ApiClient;
use crate::error::{GalleryError, GalleryResult};

const RATE_LIMIT_PER_SEC: u32 = 10;

/// Languages whose Wikipedia availability is tracked
pub const WIKI_LANGS: [&str; 4] = ["en", "pt", "fr", "es"];

/// GBIF taxon ID property
pub const PROP_GBIF_ID: &str = "P846";
/// Taxon name property
pub const PROP_TAXON_NAME: &str = "P225";

/// Max results asked from `wbsearchentities`
const SEARCH_LIMIT: u32 = 10;

const SPARQL_ACCEPT: &str = "application/sparql-results+json";

/// `wbsearchentities` hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityHit {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Taxon facts pulled out of an entity's claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonEntity {
    pub qid: String,
    pub gbif_id: Option<String>,
    pub taxon_name: Option<String>,
    pub label: Option<String>,
}

impl TaxonEntity {
    /// Name shown in suggestions: taxon name, then label, then QID
    pub fn display_name(&self) -> &str {
        self.taxon_name
            .as_deref()
            .or(self.label.as_deref())
            .unwrap_or(&self.qid)
    }
}

/// Wikidata API + SPARQL client
pub struct WikidataClient {
    api: ApiClient,
    api_url: String,
    sparql_url: String,
}

impl WikidataClient {
    pub fn new(api_url: impl Into<String>, sparql_url: impl Into<String>) -> GalleryResult<Self> {
        Ok(Self {
            api: ApiClient::new("wikidata", RATE_LIMIT_PER_SEC)?,
            api_url: api_url.into(),
            sparql_url: sparql_url.into(),
        })
    }

    /// Item search by English label
    pub async fn search_entities(&self, query: &str) -> GalleryResult<Vec<EntityHit>> {
        let params = [
            ("action", "wbsearchentities".to_string()),
            ("search", query.to_string()),
            ("language", "en".to_string()),
            ("type", "item".to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
            ("format", "json".to_string()),
        ];
        let body = self.api.get_json(&self.api_url, &params).await?;
        parse_search_hits(&body)
    }

    /// Claims and English labels for a batch of QIDs, in input order
    pub async fn get_entities(&self, qids: &[String]) -> GalleryResult<Vec<TaxonEntity>> {
        if qids.is_empty() {
            return Ok(Vec::new());
        }
        let params = [
            ("action", "wbgetentities".to_string()),
            ("ids", qids.join("|")),
            ("props", "claims|labels".to_string()),
            ("languages", "en".to_string()),
            ("format", "json".to_string()),
        ];
        let body = self.api.get_json(&self.api_url, &params).await?;
        Ok(parse_entities(&body, qids))
    }

    /// Wikipedia languages (en/fr/pt/es) with an article, per QID
    ///
    /// Invalid QIDs are dropped before querying. No valid QID means no
    /// request and an empty map.
    pub async fn language_availability(
        &self,
        qids: &[String],
    ) -> GalleryResult<HashMap<String, Vec<String>>> {
        let Some(query) = build_langs_query(qids) else {
            debug!("No valid QIDs in batch, skipping language lookup");
            return Ok(HashMap::new());
        };
        let body = self
            .api
            .get_json_accepting(&self.sparql_url, &[("query", query)], SPARQL_ACCEPT)
            .await?;
        Ok(parse_langs_results(&body))
    }
}

/// `Q` followed by one or more digits, nothing else
pub fn is_valid_qid(qid: &str) -> bool {
    qid.len() > 1
        && qid.starts_with('Q')
        && qid[1..].bytes().all(|b| b.is_ascii_digit())
}

/// SPARQL query grouping article languages per taxon
pub fn build_langs_query(qids: &[String]) -> Option<String> {
    let values: Vec<String> = qids
        .iter()
        .map(|q| q.trim())
        .filter(|q| is_valid_qid(q))
        .map(|q| format!("wd:{}", q))
        .collect();
    if values.is_empty() {
        return None;
    }

    let lang_list = ["en", "fr", "pt", "es"]
        .iter()
        .map(|l| format!("\"{}\"", l))
        .collect::<Vec<_>>()
        .join(", ");

    Some(format!(
        r#"PREFIX schema: <http://schema.org/>
PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX wikibase: <http://wikiba.se/ontology#>
SELECT ?taxon (GROUP_CONCAT(?lang; separator=",") AS ?langs)
WHERE {{
  VALUES ?taxon {{ {values} }}
  ?article schema:about ?taxon ;
           schema:inLanguage ?lang ;
           schema:isPartOf [ wikibase:wikiGroup "wikipedia" ].
  FILTER(?lang in ({lang_list}))
}}
GROUP BY ?taxon"#,
        values = values.join(" "),
        lang_list = lang_list
    ))
}

/// QID → languages from a SPARQL JSON result
pub fn parse_langs_results(body: &Value) -> HashMap<String, Vec<String>> {
    let Some(bindings) = body
        .pointer("/results/bindings")
        .and_then(Value::as_array)
    else {
        warn!("Language lookup returned no bindings");
        return HashMap::new();
    };

    bindings
        .iter()
        .filter_map(|b| {
            let taxon = b.pointer("/taxon/value").and_then(Value::as_str)?;
            let qid = taxon.rsplit('/').next()?.to_string();
            let langs = b
                .pointer("/langs/value")
                .and_then(Value::as_str)
                .map(crate::models::split_langs)
                .unwrap_or_default();
            Some((qid, langs))
        })
        .collect()
}

fn parse_search_hits(body: &Value) -> GalleryResult<Vec<EntityHit>> {
    let hits = body
        .get("search")
        .cloned()
        .ok_or_else(|| GalleryError::Parse("wbsearchentities: missing 'search'".to_string()))?;
    serde_json::from_value(hits).map_err(|e| GalleryError::Parse(e.to_string()))
}

/// Extract taxon facts for `qids` from a `wbgetentities` body
///
/// Entities missing from the response are skipped.
pub fn parse_entities(body: &Value, qids: &[String]) -> Vec<TaxonEntity> {
    let Some(entities) = body.get("entities").and_then(Value::as_object) else {
        warn!("wbgetentities returned no entities");
        return Vec::new();
    };

    qids.iter()
        .filter_map(|qid| {
            let entity = entities.get(qid)?;
            if entity.get("missing").is_some() {
                return None;
            }
            Some(TaxonEntity {
                qid: qid.clone(),
                gbif_id: first_claim_string(entity, PROP_GBIF_ID),
                taxon_name: first_claim_string(entity, PROP_TAXON_NAME),
                label: entity
                    .pointer("/labels/en/value")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect()
}

fn first_claim_string(entity: &Value, property: &str) -> Option<String> {
    let value = entity
        .get("claims")?
        .get(property)?
        .as_array()?
        .first()?
        .pointer("/mainsnak/datavalue/value")?;
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
