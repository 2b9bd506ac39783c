//! In-memory view that records the widget's DOM state
//!
//! Keeps the rendered items in order, the sentinel position and the
//! auxiliary controls, and can serialise the whole thing as HTML.

use std::collections::HashMap;
use std::fmt::Write as _;

use super::{GalleryView, SuggestionView};
use crate::autocomplete::{Suggestion, TaxonSelector};
use crate::gallery::item::{escape_html, GalleryItem, PLACEHOLDER_SRC};

/// An item as currently displayed
#[derive(Debug, Clone)]
pub struct RenderedItem {
    pub item: GalleryItem,
    /// Current `src` attribute: placeholder until loaded
    pub src: String,
}

impl RenderedItem {
    pub fn is_loaded(&self) -> bool {
        self.src != PLACEHOLDER_SRC
    }
}

#[derive(Debug, Default)]
pub struct HtmlView {
    items: Vec<RenderedItem>,
    positions: HashMap<String, usize>,
    sentinel: Option<String>,
    image_count: Option<usize>,
    loading: bool,
    errors: Vec<String>,
    taxon_key: String,
    continent: String,
    data_source: String,
    url_history: Vec<String>,
    input: String,
    suggestions: Vec<Suggestion>,
    selector: TaxonSelector,
    validation_error: bool,
}

impl HtmlView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[RenderedItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&RenderedItem> {
        self.positions.get(id).map(|&i| &self.items[i])
    }

    /// Image URLs of the rendered items, in display order
    pub fn rendered_urls(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.item.image_url.as_str()).collect()
    }

    pub fn sentinel(&self) -> Option<&str> {
        self.sentinel.as_deref()
    }

    pub fn image_count(&self) -> Option<usize> {
        self.image_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn filter_controls(&self) -> (&str, &str, &str) {
        (&self.taxon_key, &self.continent, &self.data_source)
    }

    /// Last query string pushed to the URL
    pub fn url_query(&self) -> Option<&str> {
        self.url_history.last().map(String::as_str)
    }

    pub fn url_history(&self) -> &[String] {
        &self.url_history
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Simulate typing into the search box
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn selector(&self) -> &TaxonSelector {
        &self.selector
    }

    pub fn has_validation_error(&self) -> bool {
        self.validation_error
    }

    /// Markup of the gallery container and counter
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        if let Some(count) = self.image_count {
            let _ = writeln!(
                html,
                r#"<p id="imageCounter">Images: <span id="imageCount">{}</span></p>"#,
                count
            );
        }
        html.push_str(&self.selector.to_html());
        html.push('\n');
        html.push_str("<div id=\"gallery\">\n");
        for rendered in &self.items {
            html.push_str(&rendered.item.to_html(&rendered.src));
            html.push('\n');
        }
        if let Some(sentinel) = &self.sentinel {
            let _ = writeln!(html, r#"<div id="{}" class="sentinel"></div>"#, escape_html(sentinel));
        }
        html.push_str("</div>\n");
        html
    }
}

impl GalleryView for HtmlView {
    fn clear_items(&mut self) {
        self.items.clear();
        self.positions.clear();
        self.sentinel = None;
    }

    fn append_item(&mut self, item: &GalleryItem) {
        self.positions.insert(item.id.clone(), self.items.len());
        self.items.push(RenderedItem {
            item: item.clone(),
            src: PLACEHOLDER_SRC.to_string(),
        });
    }

    fn load_image(&mut self, item_id: &str, src: &str) {
        if let Some(&i) = self.positions.get(item_id) {
            self.items[i].src = src.to_string();
        }
    }

    fn update_item(&mut self, item: &GalleryItem) {
        if let Some(&i) = self.positions.get(&item.id) {
            self.items[i].item = item.clone();
        }
    }

    fn arm_sentinel(&mut self, sentinel_id: &str) {
        self.sentinel = Some(sentinel_id.to_string());
    }

    fn disarm_sentinel(&mut self) {
        self.sentinel = None;
    }

    fn set_image_count(&mut self, count: usize) {
        self.image_count = Some(count);
    }

    fn set_loading(&mut self, visible: bool) {
        self.loading = visible;
    }

    fn notify_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn set_filter_controls(&mut self, taxon_key: &str, continent: &str, data_source: &str) {
        self.taxon_key = taxon_key.to_string();
        self.continent = continent.to_string();
        self.data_source = data_source.to_string();
    }

    fn push_url_query(&mut self, query: &str) {
        self.url_history.push(query.to_string());
    }
}

impl SuggestionView for HtmlView {
    fn render_suggestions(&mut self, suggestions: &[Suggestion]) {
        self.suggestions = suggestions.to_vec();
    }

    fn clear_suggestions(&mut self) {
        self.suggestions.clear();
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn render_selector(&mut self, selector: &TaxonSelector) {
        self.selector = selector.clone();
    }

    fn set_validation_error(&mut self, visible: bool) {
        self.validation_error = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageRecord;

    fn item(id: &str, url: &str) -> GalleryItem {
        let record = ImageRecord {
            url: Some(url.to_string()),
            ..Default::default()
        };
        GalleryItem::from_record(id.to_string(), &record)
    }

    #[test]
    fn test_append_and_load() {
        let mut view = HtmlView::new();
        view.append_item(&item("a", "https://x/a.jpg"));
        view.append_item(&item("b", "https://x/b.jpg"));
        assert!(!view.item("a").unwrap().is_loaded());

        view.load_image("a", "https://x/a.jpg");
        assert!(view.item("a").unwrap().is_loaded());
        assert!(!view.item("b").unwrap().is_loaded());

        // unknown ids are ignored
        view.load_image("zzz", "https://x/z.jpg");
        assert_eq!(view.items().len(), 2);
    }

    #[test]
    fn test_clear_removes_sentinel() {
        let mut view = HtmlView::new();
        view.append_item(&item("a", "u"));
        view.arm_sentinel("sentinel-1");
        view.clear_items();
        assert!(view.items().is_empty());
        assert!(view.sentinel().is_none());
        assert!(view.item("a").is_none());
    }

    #[test]
    fn test_to_html_contains_items_and_sentinel() {
        let mut view = HtmlView::new();
        view.set_image_count(45);
        view.append_item(&item("item-1-0", "https://x/a.jpg"));
        view.arm_sentinel("sentinel-1");

        let html = view.to_html();
        assert!(html.contains(r#"<span id="imageCount">45</span>"#));
        assert!(html.contains(r#"id="item-1-0""#));
        assert!(html.contains(r#"<div id="sentinel-1" class="sentinel"></div>"#));
    }
}
