//! Load-once lazy image registry
//!
//! Each rendered item registers its deferred image URL. The first
//! visibility signal for an item hands out the URL and unregisters it, so
//! later signals for the same item do nothing.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct LazyImageRegistry {
    pending: HashMap<String, String>,
}

impl LazyImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, item_id: impl Into<String>, url: impl Into<String>) {
        self.pending.insert(item_id.into(), url.into());
    }

    /// Unregister `item_id` and return its URL if there is one to load
    ///
    /// An item registered with an empty URL is unregistered without a swap.
    pub fn take(&mut self, item_id: &str) -> Option<String> {
        self.pending.remove(item_id).filter(|url| !url.is_empty())
    }

    pub fn is_pending(&self, item_id: &str) -> bool {
        self.pending.contains_key(item_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_is_load_once() {
        let mut lazy = LazyImageRegistry::new();
        lazy.register("a", "https://x/a.jpg");

        assert_eq!(lazy.take("a").as_deref(), Some("https://x/a.jpg"));
        assert_eq!(lazy.take("a"), None);
        assert!(lazy.is_empty());
    }

    #[test]
    fn test_empty_url_unregisters_without_swap() {
        let mut lazy = LazyImageRegistry::new();
        lazy.register("a", "");
        assert!(lazy.is_pending("a"));
        assert_eq!(lazy.take("a"), None);
        assert!(!lazy.is_pending("a"));
    }
}
