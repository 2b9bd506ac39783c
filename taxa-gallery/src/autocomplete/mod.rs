//! Taxon autocomplete
//!
//! Input shorter than the minimum length clears the suggestion list without
//! a request. Longer input issues a query tagged with a fresh generation;
//! when the response arrives it is rendered only if no newer input (or a
//! selection) happened in between.

pub mod providers;
pub mod selector;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GalleryResult;
use crate::sequence::{Generation, RequestSequencer};
use crate::view::SuggestionView;

pub use providers::{GbifSuggestions, RankSearch, WikidataSuggestions};
pub use selector::{TaxonOption, TaxonSelector};

/// One clickable suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// GBIF taxon key
    pub key: String,
    pub name: String,
    pub rank: Option<String>,
}

/// Remote search producing suggestions for a query
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn suggest(&self, query: &str) -> GalleryResult<Vec<Suggestion>>;
}

/// A query that passed the length check and awaits its response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub generation: Generation,
    pub query: String,
}

/// Completed query
#[derive(Debug)]
pub struct SuggestionResponse {
    pub generation: Generation,
    pub query: String,
    pub result: GalleryResult<Vec<Suggestion>>,
}

/// Run a pending query against `source`
///
/// Free of controller borrows, so it can be spawned as its own task.
pub async fn fetch_suggestions(
    source: Arc<dyn SuggestionSource>,
    pending: PendingQuery,
) -> SuggestionResponse {
    let result = source.suggest(&pending.query).await;
    SuggestionResponse {
        generation: pending.generation,
        query: pending.query,
        result,
    }
}

pub struct AutocompleteController {
    source: Arc<dyn SuggestionSource>,
    min_query_len: usize,
    sequencer: RequestSequencer,
    input: String,
    suggestions: Vec<Suggestion>,
    selector: TaxonSelector,
}

impl AutocompleteController {
    pub fn new(source: Arc<dyn SuggestionSource>, min_query_len: usize) -> Self {
        Self {
            source,
            min_query_len,
            sequencer: RequestSequencer::new(),
            input: String::new(),
            suggestions: Vec::new(),
            selector: TaxonSelector::new(),
        }
    }

    pub fn source(&self) -> Arc<dyn SuggestionSource> {
        Arc::clone(&self.source)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn selector(&self) -> &TaxonSelector {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut TaxonSelector {
        &mut self.selector
    }

    /// Handle an input change
    ///
    /// Returns the query to run, or `None` when the input is too short (the
    /// suggestion list is cleared and any in-flight query is superseded).
    pub fn on_input<V: SuggestionView + ?Sized>(
        &mut self,
        view: &mut V,
        text: &str,
    ) -> Option<PendingQuery> {
        self.input = text.to_string();
        let generation = self.sequencer.next();

        let query = text.trim();
        if query.chars().count() < self.min_query_len {
            self.suggestions.clear();
            view.clear_suggestions();
            return None;
        }

        Some(PendingQuery {
            generation,
            query: query.to_string(),
        })
    }

    /// Render a completed query if it is still the latest
    ///
    /// Returns whether the suggestion list changed. A failed query leaves
    /// the current list in place.
    pub fn apply<V: SuggestionView + ?Sized>(
        &mut self,
        view: &mut V,
        response: SuggestionResponse,
    ) -> bool {
        if !self.sequencer.is_current(response.generation) {
            debug!(query = %response.query, "Discarding stale suggestions");
            return false;
        }
        match response.result {
            Ok(suggestions) => {
                view.render_suggestions(&suggestions);
                self.suggestions = suggestions;
                true
            }
            Err(e) => {
                warn!(query = %response.query, "Error fetching suggestions: {}", e);
                false
            }
        }
    }

    /// `on_input`, fetch and `apply` in one step
    pub async fn input_changed<V: SuggestionView + ?Sized>(&mut self, view: &mut V, text: &str) -> bool {
        let Some(pending) = self.on_input(view, text) else {
            return false;
        };
        let response = fetch_suggestions(self.source(), pending).await;
        self.apply(view, response)
    }

    /// Commit a suggestion into the taxon selector
    ///
    /// Clears the input and the suggestion list, and supersedes any
    /// in-flight query.
    pub fn select<V: SuggestionView + ?Sized>(&mut self, view: &mut V, suggestion: &Suggestion) {
        self.selector.add_or_select(&suggestion.key, &suggestion.name);
        view.render_selector(&self.selector);

        self.sequencer.next();
        self.input.clear();
        self.suggestions.clear();
        view.clear_input();
        view.clear_suggestions();
        view.set_validation_error(false);
    }

    /// Select the `index`-th rendered suggestion
    pub fn select_index<V: SuggestionView + ?Sized>(
        &mut self,
        view: &mut V,
        index: usize,
    ) -> Option<Suggestion> {
        let suggestion = self.suggestions.get(index)?.clone();
        self.select(view, &suggestion);
        Some(suggestion)
    }

    /// Whether the form may be submitted
    ///
    /// Typed-but-uncommitted text blocks submission and shows the
    /// validation indicator.
    pub fn validate_submission<V: SuggestionView + ?Sized>(&mut self, view: &mut V) -> bool {
        let blocked = !self.input.trim().is_empty();
        view.set_validation_error(blocked);
        !blocked
    }
}
