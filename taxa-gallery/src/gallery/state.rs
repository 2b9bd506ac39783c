//! Gallery result state

use crate::models::ImageRecord;

/// Current result list, the unfiltered original, and the page cursor
///
/// The cursor is reset to 0 whenever the result list is replaced and
/// advances by one per rendered page. It never goes backwards otherwise.
#[derive(Debug, Clone, Default)]
pub struct GalleryState {
    images: Vec<ImageRecord>,
    original: Vec<ImageRecord>,
    page: usize,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly loaded, unfiltered list as both original and current
    pub fn load(&mut self, images: Vec<ImageRecord>) {
        self.original = images.clone();
        self.images = images;
        self.page = 0;
    }

    /// Replace the current result list (filter output)
    pub fn replace_results(&mut self, images: Vec<ImageRecord>) {
        self.images = images;
        self.page = 0;
    }

    /// Make the original list current again
    pub fn restore_original(&mut self) {
        self.images = self.original.clone();
        self.page = 0;
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn original(&self) -> &[ImageRecord] {
        &self.original
    }

    /// Next page to render
    pub fn page(&self) -> usize {
        self.page
    }

    pub(crate) fn rewind(&mut self) {
        self.page = 0;
    }

    pub(crate) fn advance(&mut self) {
        self.page += 1;
    }
}
