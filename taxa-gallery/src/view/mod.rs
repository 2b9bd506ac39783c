//! View abstraction over the embedding page
//!
//! Each method is one DOM mutation the widget performs. Controllers talk
//! only to these traits; [`HtmlView`] is the in-memory implementation used
//! for headless sessions, HTML export and tests.

pub mod html_view;

pub use html_view::HtmlView;

use crate::autocomplete::{Suggestion, TaxonSelector};
use crate::gallery::GalleryItem;

/// Gallery container, counter, loading indicator and notifications
pub trait GalleryView {
    /// Remove every rendered item (and the sentinel)
    fn clear_items(&mut self);

    /// Append one item showing the placeholder image
    fn append_item(&mut self, item: &GalleryItem);

    /// Swap the real image source into a rendered item
    fn load_image(&mut self, item_id: &str, src: &str);

    /// Re-render an item's Wikipedia links and global usage line
    fn update_item(&mut self, item: &GalleryItem);

    /// Place the sentinel after the last item, replacing any previous one
    fn arm_sentinel(&mut self, sentinel_id: &str);

    /// Remove the sentinel, if any
    fn disarm_sentinel(&mut self);

    /// Show the image counter with the full result length
    fn set_image_count(&mut self, count: usize);

    fn set_loading(&mut self, visible: bool);

    /// User-visible error notification
    fn notify_error(&mut self, message: &str);

    /// Mirror the filter selectors
    fn set_filter_controls(&mut self, taxon_key: &str, continent: &str, data_source: &str);

    /// Replace the browser URL's query string (history push)
    fn push_url_query(&mut self, query: &str);
}

/// Search input, suggestion list, taxon selector and validation indicator
pub trait SuggestionView {
    fn render_suggestions(&mut self, suggestions: &[Suggestion]);

    fn clear_suggestions(&mut self);

    fn clear_input(&mut self);

    /// Redraw the taxon `<select>`
    fn render_selector(&mut self, selector: &TaxonSelector);

    /// Show or hide the "pick a suggestion" validation indicator
    fn set_validation_error(&mut self, visible: bool);
}
