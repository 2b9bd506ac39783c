//! Filter state carried in the page URL
//!
//! Parameters: `taxonKey` (alias `taxon`), `continent`, `dataSource`.

use std::borrow::Cow;

use taxa_common::config::DataSource;
use tracing::warn;

pub const PARAM_TAXON_KEY: &str = "taxonKey";
pub const PARAM_TAXON_ALIAS: &str = "taxon";
pub const PARAM_CONTINENT: &str = "continent";
pub const PARAM_DATA_SOURCE: &str = "dataSource";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlFilters {
    pub taxon_key: Option<String>,
    pub continent: Option<String>,
    pub data_source: Option<DataSource>,
}

impl UrlFilters {
    /// Parse a query string, with or without the leading `?`
    ///
    /// Empty values count as absent. `taxonKey` wins over `taxon`.
    pub fn parse(query: &str) -> Self {
        let mut filters = UrlFilters::default();
        let mut alias: Option<String> = None;

        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_component(value);
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key {
                PARAM_TAXON_KEY => filters.taxon_key = Some(value.to_string()),
                PARAM_TAXON_ALIAS => alias = Some(value.to_string()),
                PARAM_CONTINENT => filters.continent = Some(value.to_string()),
                PARAM_DATA_SOURCE => match value.parse::<DataSource>() {
                    Ok(source) => filters.data_source = Some(source),
                    Err(e) => warn!(value = %value, "Ignoring dataSource parameter: {}", e),
                },
                _ => {}
            }
        }

        if filters.taxon_key.is_none() {
            filters.taxon_key = alias;
        }
        filters
    }

    /// Whether the URL asks for a filtered view on load
    pub fn has_filters(&self) -> bool {
        self.taxon_key.is_some() || self.continent.is_some()
    }

    /// Serialise, omitting empty parameters and a default data source
    ///
    /// Returns `""` when nothing needs to be carried, otherwise `?a=b&...`.
    pub fn to_query(&self, default_source: DataSource) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if let Some(key) = self.taxon_key.as_deref().filter(|k| !k.is_empty()) {
            parts.push(format!("{}={}", PARAM_TAXON_KEY, urlencoding::encode(key)));
        }
        if let Some(continent) = self.continent.as_deref().filter(|c| !c.is_empty()) {
            parts.push(format!("{}={}", PARAM_CONTINENT, urlencoding::encode(continent)));
        }
        if let Some(source) = self.data_source.filter(|s| *s != default_source) {
            parts.push(format!("{}={}", PARAM_DATA_SOURCE, source.as_str()));
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!("?{}", parts.join("&"))
        }
    }
}

/// Percent-decode a form-encoded value (`+` is a space)
fn decode_component(raw: &str) -> Cow<'_, str> {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Owned(spaced),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_query() {
        let f = UrlFilters::parse("?taxonKey=212&continent=SOUTH_AMERICA&dataSource=occurrence-api");
        assert_eq!(f.taxon_key.as_deref(), Some("212"));
        assert_eq!(f.continent.as_deref(), Some("SOUTH_AMERICA"));
        assert_eq!(f.data_source, Some(DataSource::OccurrenceApi));
        assert!(f.has_filters());
    }

    #[test]
    fn test_taxon_alias_and_precedence() {
        assert_eq!(UrlFilters::parse("taxon=44").taxon_key.as_deref(), Some("44"));
        assert_eq!(
            UrlFilters::parse("taxon=44&taxonKey=212").taxon_key.as_deref(),
            Some("212")
        );
    }

    #[test]
    fn test_empty_and_unknown_values() {
        let f = UrlFilters::parse("?taxonKey=&continent=&dataSource=ftp&utm=x");
        assert_eq!(f, UrlFilters::default());
        assert!(!f.has_filters());
        assert_eq!(UrlFilters::parse(""), UrlFilters::default());
    }

    #[test]
    fn test_decoding() {
        let f = UrlFilters::parse("continent=North+America&taxonKey=%32%31%32");
        assert_eq!(f.continent.as_deref(), Some("North America"));
        assert_eq!(f.taxon_key.as_deref(), Some("212"));
    }

    #[test]
    fn test_to_query_omits_defaults() {
        let f = UrlFilters {
            taxon_key: Some("212".to_string()),
            continent: None,
            data_source: Some(DataSource::Local),
        };
        assert_eq!(f.to_query(DataSource::Local), "?taxonKey=212");
        assert_eq!(
            f.to_query(DataSource::OccurrenceApi),
            "?taxonKey=212&dataSource=local"
        );
        assert_eq!(UrlFilters::default().to_query(DataSource::Local), "");
    }

    #[test]
    fn test_to_query_encodes() {
        let f = UrlFilters {
            taxon_key: None,
            continent: Some("North America".to_string()),
            data_source: None,
        };
        assert_eq!(f.to_query(DataSource::Local), "?continent=North%20America");
    }
}
