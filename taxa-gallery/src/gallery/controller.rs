//! Paginated gallery rendering with infinite scroll
//!
//! The controller owns the [`GalleryState`]. Each `render` appends the page
//! under the cursor and, when records remain, arms a fresh sentinel. A
//! sentinel becoming visible renders the next page of the same result list.
//!
//! Every reset starts a new gallery generation. Item ids embed it, and
//! enrichment results tagged with an older generation are dropped.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::item::{GalleryItem, GlobalUsage, WikiLanguages};
use super::lazy_images::LazyImageRegistry;
use super::pagination::page_bounds;
use super::state::GalleryState;
use crate::models::ImageRecord;
use crate::sequence::{Generation, RequestSequencer};
use crate::view::GalleryView;

/// What one `render` call did
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// Page index that was rendered
    pub page: usize,
    /// Items appended, in order
    pub items: Vec<GalleryItem>,
    /// Length of the full current result list
    pub total: usize,
    /// Whether a sentinel was armed
    pub has_more: bool,
    /// Gallery generation the items belong to
    pub generation: Generation,
}

pub struct PaginatedGalleryController {
    state: GalleryState,
    page_size: usize,
    lazy: LazyImageRegistry,
    rendered: Vec<GalleryItem>,
    sentinel: Option<String>,
    sentinels_armed: u64,
    generations: RequestSequencer,
    generation: Generation,
}

impl PaginatedGalleryController {
    pub fn new(page_size: usize) -> Self {
        let generations = RequestSequencer::new();
        let generation = generations.current();
        Self {
            state: GalleryState::new(),
            page_size: page_size.max(1),
            lazy: LazyImageRegistry::new(),
            rendered: Vec::new(),
            sentinel: None,
            sentinels_armed: 0,
            generations,
            generation,
        }
    }

    pub fn state(&self) -> &GalleryState {
        &self.state
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Items rendered since the last reset
    pub fn rendered(&self) -> &[GalleryItem] {
        &self.rendered
    }

    pub fn sentinel(&self) -> Option<&str> {
        self.sentinel.as_deref()
    }

    pub fn pending_images(&self) -> usize {
        self.lazy.len()
    }

    /// Install a freshly loaded full list and render its first page
    pub fn load<V: GalleryView + ?Sized>(
        &mut self,
        view: &mut V,
        images: Vec<ImageRecord>,
    ) -> RenderOutcome {
        self.state.load(images);
        self.render(view, true)
    }

    /// Install a full list without rendering (a filtered view follows)
    pub fn stage(&mut self, images: Vec<ImageRecord>) {
        self.state.load(images);
    }

    /// Show a filtered result list from page 0
    pub fn show_results<V: GalleryView + ?Sized>(
        &mut self,
        view: &mut V,
        images: Vec<ImageRecord>,
    ) -> RenderOutcome {
        self.state.replace_results(images);
        self.render(view, true)
    }

    /// Restore the unfiltered list and render from page 0
    pub fn reset_to_original<V: GalleryView + ?Sized>(&mut self, view: &mut V) -> RenderOutcome {
        self.state.restore_original();
        self.render(view, true)
    }

    /// Render the page under the cursor of the current result list
    ///
    /// With `reset`, the gallery is cleared and the cursor rewound first.
    pub fn render<V: GalleryView + ?Sized>(&mut self, view: &mut V, reset: bool) -> RenderOutcome {
        let total = self.state.images().len();
        view.set_image_count(total);

        if reset {
            view.clear_items();
            self.state.rewind();
            self.lazy.clear();
            self.rendered.clear();
            self.sentinel = None;
            self.generation = self.generations.next();
        }

        let bounds = page_bounds(total, self.state.page(), self.page_size);
        let mut items = Vec::with_capacity(bounds.range.len());
        for index in bounds.range.clone() {
            let record = &self.state.images()[index];
            let id = format!("item-{}-{}", self.generation.value(), index);
            let item = GalleryItem::from_record(id, record);

            view.append_item(&item);
            self.lazy.register(item.id.clone(), item.image_url.clone());
            items.push(item);
        }
        self.rendered.extend(items.iter().cloned());
        self.state.advance();

        if bounds.has_more {
            self.sentinels_armed += 1;
            let id = format!("sentinel-{}", self.sentinels_armed);
            view.arm_sentinel(&id);
            self.sentinel = Some(id);
        } else {
            self.sentinel = None;
            view.disarm_sentinel();
        }

        debug!(
            page = bounds.page,
            rendered = items.len(),
            total = total,
            has_more = bounds.has_more,
            "Gallery page rendered"
        );

        RenderOutcome {
            page: bounds.page,
            items,
            total,
            has_more: bounds.has_more,
            generation: self.generation,
        }
    }

    /// Sentinel visibility signal
    ///
    /// Only the currently armed sentinel triggers a render; a displaced one
    /// is ignored.
    pub fn on_sentinel_visible<V: GalleryView + ?Sized>(
        &mut self,
        view: &mut V,
        sentinel_id: &str,
    ) -> Option<RenderOutcome> {
        if self.sentinel.as_deref() != Some(sentinel_id) {
            trace!(sentinel = %sentinel_id, "Ignoring stale sentinel");
            return None;
        }
        self.sentinel = None;
        Some(self.render(view, false))
    }

    /// Image placeholder visibility signal; true if a swap happened
    pub fn on_image_visible<V: GalleryView + ?Sized>(&mut self, view: &mut V, item_id: &str) -> bool {
        match self.lazy.take(item_id) {
            Some(url) => {
                view.load_image(item_id, &url);
                true
            }
            None => false,
        }
    }

    /// Apply language availability from an enrichment lookup
    ///
    /// Returns the number of items updated; zero if `generation` is stale.
    pub fn apply_languages<V: GalleryView + ?Sized>(
        &mut self,
        view: &mut V,
        generation: Generation,
        langs: &HashMap<String, Vec<String>>,
    ) -> usize {
        if generation != self.generation {
            debug!(generation = generation.value(), "Dropping stale language data");
            return 0;
        }
        let mut updated = 0;
        for item in &mut self.rendered {
            let Some(found) = item.qid.as_deref().and_then(|q| langs.get(q)) else {
                continue;
            };
            item.wiki_languages = WikiLanguages::Known(found.clone());
            view.update_item(item);
            updated += 1;
        }
        updated
    }

    /// Apply global usage counts from an enrichment lookup
    pub fn apply_global_usage<V: GalleryView + ?Sized>(
        &mut self,
        view: &mut V,
        generation: Generation,
        usage: &HashMap<String, usize>,
    ) -> usize {
        if generation != self.generation {
            debug!(generation = generation.value(), "Dropping stale global usage data");
            return 0;
        }
        let mut updated = 0;
        for item in &mut self.rendered {
            let Some(&count) = item.file_name.as_deref().and_then(|f| usage.get(f)) else {
                continue;
            };
            item.global_usage = GlobalUsage::Count(count);
            view.update_item(item);
            updated += 1;
        }
        updated
    }
}
