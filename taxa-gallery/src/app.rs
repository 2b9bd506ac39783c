//! Gallery session wiring
//!
//! [`GalleryApp`] owns the view, the gallery and autocomplete controllers
//! and the configured filter strategies. User actions arrive as method
//! calls; remote work is tagged with a generation so a superseded filter
//! or enrichment result never overwrites newer state.
//!
//! Filter submission is split in three steps so callers can run the remote
//! part as a separate task:
//! 1. [`GalleryApp::begin_filter`]: validate, show the loading indicator,
//!    record the URL, issue a generation
//! 2. [`PendingFilter::run`]: the async strategy call
//! 3. [`GalleryApp::complete_filter`]: apply or drop the response

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use taxa_common::config::{AutocompleteProvider, DataSource, TomlConfig};
use taxa_common::events::{EventBus, GalleryEvent};
use tracing::{error, info, warn};

use crate::autocomplete::{
    fetch_suggestions, AutocompleteController, GbifSuggestions, Suggestion, SuggestionSource,
    WikidataSuggestions,
};
use crate::enrichment::{Enricher, GlobalUsageLookup, LanguageLookup};
use crate::error::{GalleryError, GalleryResult, FILTER_FAILED, IMAGES_FAILED};
use crate::filter::{FilterEngine, FilterRequest, ALL_TAXA};
use crate::gallery::{PaginatedGalleryController, RenderOutcome};
use crate::models::ImageRecord;
use crate::sequence::{Generation, RequestSequencer};
use crate::services::{image_feed, CommonsClient, GbifClient, ImageSource, WikidataClient};
use crate::taxonomy::TaxonomyIndex;
use crate::url_state::UrlFilters;
use crate::view::{GalleryView, SuggestionView};

/// Result of a filter submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Uncommitted search text; nothing was requested
    Blocked,
    /// New results are displayed
    Applied { matched: usize },
    /// The user was notified; the gallery is unchanged
    Failed { message: String },
    /// A newer action superseded this one; the response was dropped
    Stale,
}

/// A filter request whose remote part has not run yet
pub struct PendingFilter {
    generation: Generation,
    request: FilterRequest,
    engine: FilterEngine,
    images: Vec<ImageRecord>,
}

impl PendingFilter {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn request(&self) -> &FilterRequest {
        &self.request
    }

    /// Run the strategy against the unfiltered list
    pub async fn run(self) -> FilterResponse {
        let result = self.engine.filter(&self.request, &self.images).await;
        FilterResponse {
            generation: self.generation,
            data_source: self.engine.data_source(),
            request: self.request,
            result,
        }
    }
}

#[derive(Debug)]
pub struct FilterResponse {
    pub generation: Generation,
    pub request: FilterRequest,
    pub data_source: DataSource,
    pub result: GalleryResult<Vec<ImageRecord>>,
}

pub struct GalleryApp<V: GalleryView + SuggestionView> {
    view: V,
    gallery: PaginatedGalleryController,
    autocomplete: AutocompleteController,
    engines: Vec<FilterEngine>,
    images: Arc<dyn ImageSource>,
    enricher: Enricher,
    events: EventBus,
    filters: RequestSequencer,
    default_source: DataSource,
    data_source: DataSource,
    continent: String,
}

impl<V: GalleryView + SuggestionView> GalleryApp<V> {
    /// `engines` holds one engine per selectable data source; the first one
    /// matching `default_source` is used when none is requested.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        view: V,
        gallery: PaginatedGalleryController,
        autocomplete: AutocompleteController,
        engines: Vec<FilterEngine>,
        images: Arc<dyn ImageSource>,
        enricher: Enricher,
        events: EventBus,
        default_source: DataSource,
    ) -> Self {
        Self {
            view,
            gallery,
            autocomplete,
            engines,
            images,
            enricher,
            events,
            filters: RequestSequencer::new(),
            default_source,
            data_source: default_source,
            continent: String::new(),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    pub fn gallery(&self) -> &PaginatedGalleryController {
        &self.gallery
    }

    pub fn autocomplete(&self) -> &AutocompleteController {
        &self.autocomplete
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn data_source(&self) -> DataSource {
        self.data_source
    }

    fn engine(&self, source: DataSource) -> Option<&FilterEngine> {
        self.engines.iter().find(|e| e.data_source() == source)
    }

    /// Initial page load
    ///
    /// Fetches the full image list. If the URL query carries a taxon or
    /// continent, the selectors are set and a filtered view is shown;
    /// otherwise the full list is rendered.
    pub async fn load(&mut self, url_query: &str) -> GalleryResult<()> {
        let filters = UrlFilters::parse(url_query);
        if let Some(source) = filters.data_source {
            self.data_source = source;
        }

        self.view.set_loading(true);
        let images = match self.images.load_images().await {
            Ok(images) => images,
            Err(e) => {
                error!(source = %self.images.describe(), "Error loading images: {}", e);
                self.view.notify_error(IMAGES_FAILED);
                self.view.set_loading(false);
                return Err(e);
            }
        };
        info!(count = images.len(), source = %self.images.describe(), "Images loaded");
        self.events.emit_lossy(GalleryEvent::ImagesLoaded {
            count: images.len(),
            timestamp: Utc::now(),
        });

        if !filters.has_filters() {
            let outcome = self.gallery.load(&mut self.view, images);
            self.view.set_loading(false);
            self.after_render(outcome).await;
            return Ok(());
        }

        self.gallery.stage(images);
        let taxon_key = filters.taxon_key.clone().unwrap_or_else(|| ALL_TAXA.to_string());
        if taxon_key != ALL_TAXA {
            self.autocomplete.selector_mut().add_or_select(&taxon_key, &taxon_key);
            self.view.render_selector(self.autocomplete.selector());
        }
        let continent = filters.continent.clone().unwrap_or_default();
        let source = self.data_source;

        if let SubmitOutcome::Failed { .. } = self.apply_filter(&taxon_key, &continent, source).await {
            // nothing displayed yet: fall back to the full list
            let outcome = self.gallery.reset_to_original(&mut self.view);
            self.after_render(outcome).await;
        }
        Ok(())
    }

    /// Form submission with the current selector values
    pub async fn submit(
        &mut self,
        taxon_key: &str,
        continent: &str,
        data_source: DataSource,
    ) -> SubmitOutcome {
        if !self.autocomplete.validate_submission(&mut self.view) {
            warn!("Submission blocked: search text not committed to a taxon");
            return SubmitOutcome::Blocked;
        }
        self.apply_filter(taxon_key, continent, data_source).await
    }

    async fn apply_filter(
        &mut self,
        taxon_key: &str,
        continent: &str,
        data_source: DataSource,
    ) -> SubmitOutcome {
        match self.begin_filter(taxon_key, continent, data_source) {
            Ok(pending) => {
                let response = pending.run().await;
                self.complete_filter(response).await
            }
            Err(outcome) => outcome,
        }
    }

    /// Start a filter: validate, record URL and selector state, show loading
    ///
    /// Any filter still in flight is superseded.
    pub fn begin_filter(
        &mut self,
        taxon_key: &str,
        continent: &str,
        data_source: DataSource,
    ) -> Result<PendingFilter, SubmitOutcome> {
        let request = match FilterRequest::from_params(taxon_key, continent) {
            Ok(request) => request,
            Err(e) => return Err(self.fail_filter(taxon_key, &e)),
        };
        let Some(engine) = self.engine(data_source).cloned() else {
            warn!(data_source = %data_source, "No filter strategy configured for data source");
            self.view.notify_error(FILTER_FAILED);
            return Err(SubmitOutcome::Failed {
                message: FILTER_FAILED.to_string(),
            });
        };

        self.data_source = data_source;
        self.continent = request.continent().to_string();
        let taxon = request.taxon.to_string();
        self.view
            .set_filter_controls(&taxon, request.continent(), data_source.as_str());
        self.push_url(&request);
        self.view.set_loading(true);

        Ok(PendingFilter {
            generation: self.filters.next(),
            request,
            engine,
            images: self.gallery.state().original().to_vec(),
        })
    }

    /// Apply a filter response if it is still the latest
    pub async fn complete_filter(&mut self, response: FilterResponse) -> SubmitOutcome {
        if !self.filters.is_current(response.generation) {
            info!(
                generation = response.generation.value(),
                taxon_key = %response.request.taxon,
                "Dropping superseded filter response"
            );
            return SubmitOutcome::Stale;
        }
        self.view.set_loading(false);

        match response.result {
            Ok(images) => {
                let matched = images.len();
                self.events.emit_lossy(GalleryEvent::FilterApplied {
                    taxon_key: response.request.taxon.to_string(),
                    continent: response.request.continent.clone(),
                    data_source: response.data_source.to_string(),
                    matched,
                    timestamp: Utc::now(),
                });
                let outcome = self.gallery.show_results(&mut self.view, images);
                self.after_render(outcome).await;
                SubmitOutcome::Applied { matched }
            }
            Err(e) => self.fail_filter(&response.request.taxon.to_string(), &e),
        }
    }

    fn fail_filter(&mut self, taxon_key: &str, e: &GalleryError) -> SubmitOutcome {
        error!(taxon_key = %taxon_key, "Error applying filter: {}", e);
        let message = e.filter_message();
        self.view.notify_error(&message);
        self.view.set_loading(false);
        self.events.emit_lossy(GalleryEvent::FilterFailed {
            taxon_key: taxon_key.to_string(),
            message: message.clone(),
            timestamp: Utc::now(),
        });
        SubmitOutcome::Failed { message }
    }

    /// Restore the unfiltered list and clear the filters
    pub async fn reset(&mut self) {
        // supersede any filter in flight
        self.filters.next();
        self.view.set_loading(false);

        self.continent.clear();
        self.autocomplete.selector_mut().select(ALL_TAXA);
        self.view.render_selector(self.autocomplete.selector());
        self.view
            .set_filter_controls(ALL_TAXA, "", self.data_source.as_str());
        let query = UrlFilters {
            taxon_key: None,
            continent: None,
            data_source: Some(self.data_source),
        }
        .to_query(self.default_source);
        self.view.push_url_query(&query);

        let outcome = self.gallery.reset_to_original(&mut self.view);
        self.events.emit_lossy(GalleryEvent::GalleryReset {
            count: outcome.total,
            timestamp: Utc::now(),
        });
        self.after_render(outcome).await;
    }

    /// Infinite-scroll trigger
    pub async fn on_sentinel_visible(&mut self, sentinel_id: &str) -> Option<usize> {
        let outcome = self.gallery.on_sentinel_visible(&mut self.view, sentinel_id)?;
        let rendered = outcome.items.len();
        self.after_render(outcome).await;
        Some(rendered)
    }

    /// Lazy image trigger
    pub fn on_image_visible(&mut self, item_id: &str) -> bool {
        self.gallery.on_image_visible(&mut self.view, item_id)
    }

    /// Keep triggering the armed sentinel until `pages` pages are shown or
    /// the results run out; returns the number of pages added
    pub async fn scroll_pages(&mut self, pages: usize) -> usize {
        let mut added = 0;
        while added < pages {
            let Some(sentinel) = self.gallery.sentinel().map(str::to_string) else {
                break;
            };
            if self.on_sentinel_visible(&sentinel).await.is_none() {
                break;
            }
            added += 1;
        }
        added
    }

    /// Bring every rendered image into view
    pub fn reveal_all_images(&mut self) -> usize {
        let ids: Vec<String> = self.gallery.rendered().iter().map(|i| i.id.clone()).collect();
        ids.iter().filter(|id| self.on_image_visible(id)).count()
    }

    /// Search box input
    pub async fn input_changed(&mut self, text: &str) -> bool {
        let Some(pending) = self.autocomplete.on_input(&mut self.view, text) else {
            return false;
        };
        let query = pending.query.clone();
        let response = fetch_suggestions(self.autocomplete.source(), pending).await;
        let changed = self.autocomplete.apply(&mut self.view, response);
        if changed {
            self.events.emit_lossy(GalleryEvent::SuggestionsUpdated {
                query,
                count: self.autocomplete.suggestions().len(),
                timestamp: Utc::now(),
            });
        }
        changed
    }

    /// Click on the `index`-th suggestion: select it and refresh the gallery
    pub async fn select_suggestion(&mut self, index: usize) -> Option<SubmitOutcome> {
        let Suggestion { key, name, .. } = self.autocomplete.select_index(&mut self.view, index)?;
        self.events.emit_lossy(GalleryEvent::TaxonSelected {
            taxon_key: key.clone(),
            name,
            timestamp: Utc::now(),
        });

        let continent = self.continent.clone();
        Some(self.apply_filter(&key, &continent, self.data_source).await)
    }

    fn push_url(&mut self, request: &FilterRequest) {
        let taxon_key = request.taxon.key().map(|k| k.to_string());
        let query = UrlFilters {
            taxon_key,
            continent: request.continent.clone(),
            data_source: Some(self.data_source),
        }
        .to_query(self.default_source);
        self.view.push_url_query(&query);
    }

    async fn after_render(&mut self, outcome: RenderOutcome) {
        self.events.emit_lossy(GalleryEvent::PageRendered {
            page: outcome.page,
            rendered: outcome.items.len(),
            total: outcome.total,
            has_more: outcome.has_more,
            timestamp: Utc::now(),
        });

        if !self.enricher.is_enabled() || outcome.items.is_empty() {
            return;
        }
        let batch = self.enricher.enrich(outcome.generation, &outcome.items).await;
        self.gallery
            .apply_languages(&mut self.view, batch.generation, &batch.languages);
        self.gallery
            .apply_global_usage(&mut self.view, batch.generation, &batch.global_usage);
    }
}

/// Wire a session from configuration
///
/// Both filter strategies are built so the data source can be switched per
/// request; `config.data_source` is the default.
pub fn build_app<V: GalleryView + SuggestionView>(
    view: V,
    config: &TomlConfig,
    data_folder: &Path,
    events: EventBus,
) -> GalleryResult<GalleryApp<V>> {
    let endpoints = &config.endpoints;
    let gbif = Arc::new(GbifClient::new(endpoints.gbif_api.clone())?);
    let wikidata = Arc::new(WikidataClient::new(
        endpoints.wikidata_api.clone(),
        endpoints.wikidata_sparql.clone(),
    )?);
    let commons = Arc::new(CommonsClient::new(endpoints.commons_api.clone())?);

    let index = Arc::new(TaxonomyIndex::load_from_folder(data_folder));
    let engines = vec![FilterEngine::local(index), FilterEngine::occurrence(gbif.clone())];

    let suggestions: Arc<dyn SuggestionSource> = match config.autocomplete.provider {
        AutocompleteProvider::Gbif => Arc::new(GbifSuggestions::new(gbif)),
        AutocompleteProvider::Wikidata => Arc::new(WikidataSuggestions::new(wikidata.clone())),
    };
    info!(
        provider = suggestions.name(),
        data_source = %config.data_source,
        page_size = config.page_size(),
        "Gallery session configured"
    );

    Ok(GalleryApp::new(
        view,
        PaginatedGalleryController::new(config.page_size()),
        AutocompleteController::new(suggestions, config.autocomplete.min_query_len),
        engines,
        image_feed::from_config(config)?,
        Enricher::new(
            Some(wikidata as Arc<dyn LanguageLookup>),
            Some(commons as Arc<dyn GlobalUsageLookup>),
        ),
        events,
        config.data_source,
    ))
}
