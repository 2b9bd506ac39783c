//! Remote API clients

pub mod commons_client;
pub mod gbif_client;
pub mod http;
pub mod image_feed;
pub mod wikidata_client;

pub use commons_client::CommonsClient;
pub use gbif_client::{GbifClient, GbifSuggestion};
pub use http::ApiClient;
pub use image_feed::{ImageSource, JsonEndpointFeed, JsonFileFeed, QleverFeed};
pub use wikidata_client::{TaxonEntity, WikidataClient};
