//! Displayable image records
//!
//! Records arrive either as SPARQL result bindings
//! (`{"url": {"type": "uri", "value": "..."}}`) or as flattened objects
//! (`{"url": "..."}`). Both shapes decode into the same [`ImageRecord`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Fallback label for records without a taxon name
pub const DEFAULT_TAXON_NAME: &str = "Image";

/// One displayable image with its taxon links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Commons entity URL of the file
    pub file: Option<String>,
    /// Wikidata entity URL of the depicted taxon
    pub taxon: Option<String>,
    /// Scientific name of the taxon
    pub taxon_name: Option<String>,
    /// Direct image URL
    pub url: Option<String>,
    /// GBIF species key
    pub gbif_id: Option<String>,
    /// Biodiversity Heritage Library page id
    pub bhl_page_id: Option<String>,
    /// iNaturalist taxon id
    pub inat_id: Option<String>,
    /// Wikipedia languages with an article, when the source provides them
    pub langs: Option<Vec<String>>,
}

impl ImageRecord {
    /// Decode one record from either wire shape
    ///
    /// Returns `None` for anything that is not a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            file: field_string(obj, "file"),
            taxon: field_string(obj, "taxon"),
            taxon_name: field_string(obj, "taxon_name"),
            url: field_string(obj, "url"),
            gbif_id: field_string(obj, "gbif_id"),
            bhl_page_id: field_string(obj, "bhl_page_id"),
            inat_id: field_string(obj, "inat_id"),
            langs: field_langs(obj),
        })
    }

    /// Species identifier used for filtering
    pub fn species_key(&self) -> Option<&str> {
        self.gbif_id.as_deref()
    }

    /// Taxon name, or the generic label
    pub fn display_name(&self) -> &str {
        self.taxon_name.as_deref().unwrap_or(DEFAULT_TAXON_NAME)
    }

    /// Wikidata QID (last path segment of the taxon URL)
    pub fn qid(&self) -> Option<&str> {
        self.taxon
            .as_deref()
            .and_then(last_segment)
            .filter(|s| !s.is_empty())
    }

    /// Commons file name derived from the image URL
    ///
    /// The last URL segment, percent-decoded, with underscores turned into
    /// spaces: the form used as a Commons page title.
    pub fn file_name(&self) -> Option<String> {
        let raw = self.url.as_deref().and_then(last_segment)?;
        if raw.is_empty() {
            return None;
        }
        let decoded = urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        Some(decoded.replace('_', " "))
    }
}

fn last_segment(s: &str) -> Option<&str> {
    s.rsplit('/').next()
}

fn field_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    scalar_string(obj.get(key)?)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(inner) => inner.get("value").and_then(scalar_string),
        _ => None,
    }
}

fn field_langs(obj: &Map<String, Value>) -> Option<Vec<String>> {
    match obj.get("langs")? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        other => scalar_string(other).map(|s| split_langs(&s)),
    }
}

/// Split a comma-separated language list
pub fn split_langs(s: &str) -> Vec<String> {
    s.split(',')
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Decode a SPARQL JSON results document (`results.bindings`)
///
/// An unexpected shape is logged and yields an empty list.
pub fn parse_sparql_results(body: &Value) -> Vec<ImageRecord> {
    match body.pointer("/results/bindings").and_then(Value::as_array) {
        Some(bindings) => bindings.iter().filter_map(ImageRecord::from_value).collect(),
        None => {
            warn!("Unexpected API response structure: missing results.bindings");
            Vec::new()
        }
    }
}

/// Decode a record list from any supported document shape
///
/// Accepts a bare array of records (flattened or binding-shaped) or a full
/// SPARQL results document.
pub fn parse_record_list(body: &Value) -> Vec<ImageRecord> {
    match body {
        Value::Array(items) => items.iter().filter_map(ImageRecord::from_value).collect(),
        Value::Object(_) => parse_sparql_results(body),
        _ => {
            warn!("Unexpected image list response: not an array or object");
            Vec::new()
        }
    }
}
