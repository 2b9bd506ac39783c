//! Image list sources
//!
//! The gallery's full image list comes from one of:
//! - the Wikimedia Commons QLever endpoint (embedded SPARQL query)
//! - an HTTP endpoint returning flattened JSON records
//! - a local JSON file with the same content

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use taxa_common::config::TomlConfig;
use tracing::info;

use super::http::ApiClient;
use crate::error::{GalleryError, GalleryResult};
use crate::models::{parse_record_list, parse_sparql_results, ImageRecord};

/// `image_feed` value selecting the QLever source
pub const QLEVER_FEED: &str = "qlever";

const RATE_LIMIT_PER_SEC: u32 = 2;

/// Files depicting a taxon with a BHL page, plus the taxon's GBIF id, name,
/// optional iNaturalist id and the Wikipedia languages with an article
pub const QLEVER_QUERY: &str = r#"PREFIX schema: <http://schema.org/>
PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX wdt: <http://www.wikidata.org/prop/direct/>
PREFIX wikibase: <http://wikiba.se/ontology#>
SELECT DISTINCT ?file ?taxon ?bhl_page_id ?url ?gbif_id ?taxon_name ?inat_id (GROUP_CONCAT(?lang; SEPARATOR=",") AS ?langs)
WHERE {
  ?file wdt:P180 ?taxon.
  ?file wdt:P687 ?bhl_page_id.
  ?file schema:contentUrl ?url.
  SERVICE <https://qlever.cs.uni-freiburg.de/api/wikidata> {
    ?taxon wdt:P846 ?gbif_id.
    ?taxon wdt:P225 ?taxon_name.
    OPTIONAL { ?taxon wdt:P3151 ?inat_id .}
    ?article schema:about ?taxon.
    ?article schema:inLanguage ?lang;
             schema:isPartOf [ wikibase:wikiGroup "wikipedia" ].
    FILTER(?lang in ('en', 'fr', 'pt', 'es')).
  }
}
GROUP BY ?file ?taxon ?bhl_page_id ?url ?gbif_id ?taxon_name ?inat_id"#;

/// Provider of the unfiltered image list
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Short description for logs
    fn describe(&self) -> String;

    async fn load_images(&self) -> GalleryResult<Vec<ImageRecord>>;
}

/// SPARQL query against QLever
pub struct QleverFeed {
    api: ApiClient,
    endpoint: String,
}

impl QleverFeed {
    pub fn new(endpoint: impl Into<String>) -> GalleryResult<Self> {
        Ok(Self {
            api: ApiClient::new("qlever", RATE_LIMIT_PER_SEC)?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ImageSource for QleverFeed {
    fn describe(&self) -> String {
        format!("qlever:{}", self.endpoint)
    }

    async fn load_images(&self) -> GalleryResult<Vec<ImageRecord>> {
        let body = self
            .api
            .get_json_accepting(
                &self.endpoint,
                &[("query", QLEVER_QUERY.to_string())],
                "application/sparql-results+json",
            )
            .await?;
        Ok(parse_sparql_results(&body))
    }
}

/// JSON endpoint returning record objects
pub struct JsonEndpointFeed {
    api: ApiClient,
    url: String,
}

impl JsonEndpointFeed {
    pub fn new(url: impl Into<String>) -> GalleryResult<Self> {
        Ok(Self {
            api: ApiClient::new("image-feed", RATE_LIMIT_PER_SEC)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ImageSource for JsonEndpointFeed {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn load_images(&self) -> GalleryResult<Vec<ImageRecord>> {
        let body = self.api.get_json(&self.url, &[]).await?;
        Ok(parse_record_list(&body))
    }
}

/// JSON file on disk
pub struct JsonFileFeed {
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ImageSource for JsonFileFeed {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load_images(&self) -> GalleryResult<Vec<ImageRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(taxa_common::Error::from)?;
        let body: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| GalleryError::Parse(format!("{}: {}", self.path.display(), e)))?;
        Ok(parse_record_list(&body))
    }
}

/// Build the source named by `image_feed`
pub fn from_config(config: &TomlConfig) -> GalleryResult<Arc<dyn ImageSource>> {
    let feed = config.image_feed();
    let source: Arc<dyn ImageSource> = if feed == QLEVER_FEED {
        Arc::new(QleverFeed::new(config.endpoints.qlever.clone())?)
    } else if feed.starts_with("http://") || feed.starts_with("https://") {
        Arc::new(JsonEndpointFeed::new(feed)?)
    } else {
        Arc::new(JsonFileFeed::new(feed))
    };
    info!(source = %source.describe(), "Image feed configured");
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_config_selects_source() {
        let config = TomlConfig::default();
        assert!(from_config(&config).unwrap().describe().starts_with("qlever:"));

        let config = TomlConfig {
            image_feed: Some("https://example.org/api/images".to_string()),
            ..Default::default()
        };
        assert_eq!(
            from_config(&config).unwrap().describe(),
            "https://example.org/api/images"
        );

        let config = TomlConfig {
            image_feed: Some("/tmp/images.json".to_string()),
            ..Default::default()
        };
        assert_eq!(from_config(&config).unwrap().describe(), "/tmp/images.json");
    }

    #[tokio::test]
    async fn test_json_file_feed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"url": "https://upload.wikimedia.org/a/Lion.jpg", "gbif_id": "5219404", "taxon_name": "Panthera leo"}},
                {{"url": "https://upload.wikimedia.org/a/Cat.jpg", "gbif_id": 2435099}}]"#
        )
        .unwrap();

        let feed = JsonFileFeed::new(file.path());
        let records = feed.load_images().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].gbif_id.as_deref(), Some("2435099"));
    }

    #[tokio::test]
    async fn test_json_file_feed_missing_file() {
        let feed = JsonFileFeed::new("/definitely/not/here.json");
        assert!(matches!(
            feed.load_images().await,
            Err(GalleryError::Common(taxa_common::Error::Io(_)))
        ));
    }

    #[test]
    fn test_qlever_query_selects_all_record_fields() {
        for var in ["?file", "?taxon", "?bhl_page_id", "?url", "?gbif_id", "?taxon_name", "?inat_id", "?langs"] {
            assert!(QLEVER_QUERY.contains(var), "missing {}", var);
        }
    }
}
