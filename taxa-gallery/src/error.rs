//! Error types for taxa-gallery

use thiserror::Error;

/// Generic notification for a failed filter request
pub const FILTER_FAILED: &str = "Error applying filter.";
/// Notification for an unusable taxon selection
pub const TAXON_FILTER_FAILED: &str = "Error applying taxon filter.";
/// Notification for a failed image list load
pub const IMAGES_FAILED: &str = "Error loading images.";

/// Errors raised by the gallery library
#[derive(Debug, Error)]
pub enum GalleryError {
    /// Transport-level failure (DNS, connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Remote service answered with a non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Occurrence search returned no facet block
    #[error("No facets found for the selected taxon.")]
    NoFacets,

    /// Occurrence facet was present but empty
    #[error("No species found meeting the criteria.")]
    NoSpecies,

    /// Taxon key is neither "ALL" nor an integer
    #[error("Invalid taxon key: {0}")]
    InvalidTaxonKey(String),

    /// taxa-common error
    #[error(transparent)]
    Common(#[from] taxa_common::Error),
}

impl GalleryError {
    /// Whether the message should be shown verbatim to the user
    ///
    /// Facet errors carry their own user-facing text; everything else is
    /// replaced by a generic notification chosen by the caller.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, GalleryError::NoFacets | GalleryError::NoSpecies)
    }

    /// Notification text for a failed filter action
    pub fn filter_message(&self) -> String {
        match self {
            e if e.is_user_facing() => e.to_string(),
            GalleryError::InvalidTaxonKey(_) => TAXON_FILTER_FAILED.to_string(),
            _ => FILTER_FAILED.to_string(),
        }
    }
}

impl From<reqwest::Error> for GalleryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GalleryError::Parse(e.to_string())
        } else {
            GalleryError::Network(e.to_string())
        }
    }
}

/// Result type for gallery operations
pub type GalleryResult<T> = Result<T, GalleryError>;
