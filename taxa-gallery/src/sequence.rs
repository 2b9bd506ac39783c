//! Generation tags for superseded async work
//!
//! Every request that may be overtaken by a newer one (filter submissions,
//! autocomplete queries, per-page enrichment) takes a [`Generation`] before
//! it starts. When it completes, the result is applied only if no newer
//! generation has been issued since.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tag carried by one in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Monotonic generation counter, shareable across tasks
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    latest: Arc<AtomicU64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new generation, superseding all earlier ones
    pub fn next(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Most recently issued generation
    pub fn current(&self) -> Generation {
        Generation(self.latest.load(Ordering::SeqCst))
    }

    /// Whether `generation` is still the latest
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generations_increase() {
        let seq = RequestSequencer::new();
        let a = seq.next();
        let b = seq.next();
        assert!(b > a);
        assert!(!seq.is_current(a));
        assert!(seq.is_current(b));
    }

    #[test]
    fn test_clones_share_counter() {
        let seq = RequestSequencer::new();
        let other = seq.clone();
        let a = seq.next();
        let _ = other.next();
        assert!(!seq.is_current(a));
    }
}
