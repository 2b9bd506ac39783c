//! Event types for the gallery event system
//!
//! Provides the shared event definitions and the EventBus used to notify
//! collaborators (progress logging, map/navigation panels) of gallery changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Gallery event types
///
/// Events are broadcast via EventBus and serialize with a `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GalleryEvent {
    /// Full (unfiltered) image list replaced
    ImagesLoaded {
        /// Number of records in the new list
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A filter produced a new result list
    FilterApplied {
        /// Taxon key as submitted ("ALL" or numeric)
        taxon_key: String,
        /// Continent filter, if any
        continent: Option<String>,
        /// Strategy used ("local" / "occurrence-api")
        data_source: String,
        /// Number of records that matched
        matched: usize,
        timestamp: DateTime<Utc>,
    },

    /// A filter attempt failed; the displayed gallery was left untouched
    FilterFailed {
        taxon_key: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// One page of items was appended to the gallery
    PageRendered {
        /// Zero-based page index that was rendered
        page: usize,
        /// Items appended by this render
        rendered: usize,
        /// Length of the full current result list
        total: usize,
        /// Whether another sentinel was armed
        has_more: bool,
        timestamp: DateTime<Utc>,
    },

    /// The user restored the unfiltered list
    GalleryReset {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Autocomplete suggestions replaced
    SuggestionsUpdated {
        query: String,
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A suggestion was committed into the taxon selector
    TaxonSelected {
        taxon_key: String,
        name: String,
        timestamp: DateTime<Utc>,
    },
}

impl GalleryEvent {
    /// Short event name, used for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            GalleryEvent::ImagesLoaded { .. } => "ImagesLoaded",
            GalleryEvent::FilterApplied { .. } => "FilterApplied",
            GalleryEvent::FilterFailed { .. } => "FilterFailed",
            GalleryEvent::PageRendered { .. } => "PageRendered",
            GalleryEvent::GalleryReset { .. } => "GalleryReset",
            GalleryEvent::SuggestionsUpdated { .. } => "SuggestionsUpdated",
            GalleryEvent::TaxonSelected { .. } => "TaxonSelected",
        }
    }
}

/// Broadcast bus for gallery events
///
/// Uses tokio::broadcast internally: publishing never blocks, slow
/// subscribers see a `Lagged` error instead of stalling the gallery.
///
/// # Examples
///
/// ```
/// use taxa_common::events::{EventBus, GalleryEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(GalleryEvent::ImagesLoaded {
///     count: 42,
///     timestamp: chrono::Utc::now(),
/// });
///
/// let event = rx.try_recv().unwrap();
/// assert_eq!(event.event_type(), "ImagesLoaded");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GalleryEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: GalleryEvent,
    ) -> Result<usize, broadcast::error::SendError<GalleryEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: GalleryEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
