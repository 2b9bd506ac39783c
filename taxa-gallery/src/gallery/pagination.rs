//! Page arithmetic for the gallery
//!
//! Pages are zero-based and never clamped: asking for a page past the end
//! yields an empty slice, which is how the controller detects exhaustion.

use std::ops::Range;

/// Bounds of one page within a result list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBounds {
    /// Zero-based page number
    pub page: usize,
    /// Index range into the result list (may be empty)
    pub range: Range<usize>,
    /// Whether records remain after this page
    pub has_more: bool,
}

/// Compute the slice `[page*page_size, (page+1)*page_size)` of `total` records
///
/// # Examples
/// ```
/// use taxa_gallery::gallery::pagination::page_bounds;
///
/// // 45 records, 20 per page: 20 + 20 + 5
/// let p = page_bounds(45, 2, 20);
/// assert_eq!(p.range, 40..45);
/// assert!(!p.has_more);
///
/// // Past the end: empty
/// let p = page_bounds(45, 7, 20);
/// assert!(p.range.is_empty());
/// ```
pub fn page_bounds(total: usize, page: usize, page_size: usize) -> PageBounds {
    let page_size = page_size.max(1);
    let start = page.saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);

    PageBounds {
        page,
        range: start..end,
        has_more: end < total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let p = page_bounds(45, 0, 20);
        assert_eq!(p.range, 0..20);
        assert!(p.has_more);
    }

    #[test]
    fn test_last_partial_page() {
        let p = page_bounds(45, 2, 20);
        assert_eq!(p.range, 40..45);
        assert!(!p.has_more);
    }

    #[test]
    fn test_exact_page_boundary() {
        let p = page_bounds(40, 1, 20);
        assert_eq!(p.range, 20..40);
        assert!(!p.has_more);
    }

    #[test]
    fn test_out_of_bounds_is_empty() {
        let p = page_bounds(45, 3, 20);
        assert!(p.range.is_empty());
        assert!(!p.has_more);
    }

    #[test]
    fn test_empty_list() {
        let p = page_bounds(0, 0, 20);
        assert!(p.range.is_empty());
        assert!(!p.has_more);
    }

    #[test]
    fn test_zero_page_size_is_one() {
        let p = page_bounds(3, 1, 0);
        assert_eq!(p.range, 1..2);
    }
}
