//! Taxon `<select>` model

use std::fmt::Write as _;

use crate::filter::ALL_TAXA;
use crate::gallery::item::escape_html;

pub const ALL_TAXA_LABEL: &str = "All taxa";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonOption {
    pub value: String,
    pub label: String,
}

/// Options of the taxon selector and the selected value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonSelector {
    options: Vec<TaxonOption>,
    selected: String,
}

impl Default for TaxonSelector {
    fn default() -> Self {
        Self {
            options: vec![TaxonOption {
                value: ALL_TAXA.to_string(),
                label: ALL_TAXA_LABEL.to_string(),
            }],
            selected: ALL_TAXA.to_string(),
        }
    }
}

impl TaxonSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `value`, appending an option for it first if needed
    ///
    /// Returns true when a new option was appended.
    pub fn add_or_select(&mut self, value: &str, label: &str) -> bool {
        let added = if self.options.iter().any(|o| o.value == value) {
            false
        } else {
            self.options.push(TaxonOption {
                value: value.to_string(),
                label: label.to_string(),
            });
            true
        };
        self.selected = value.to_string();
        added
    }

    /// Select an existing option; false if there is none with `value`
    pub fn select(&mut self, value: &str) -> bool {
        if self.options.iter().any(|o| o.value == value) {
            self.selected = value.to_string();
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn options(&self) -> &[TaxonOption] {
        &self.options
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<select id="taxonSelect">"#);
        for option in &self.options {
            let selected = if option.value == self.selected { " selected" } else { "" };
            let _ = write!(
                html,
                r#"<option value="{}"{}>{}</option>"#,
                escape_html(&option.value),
                selected,
                escape_html(&option.label)
            );
        }
        html.push_str("</select>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_then_reselect() {
        let mut selector = TaxonSelector::new();
        assert_eq!(selector.selected(), "ALL");

        assert!(selector.add_or_select("212", "Aves"));
        assert_eq!(selector.selected(), "212");
        assert!(selector.add_or_select("359", "Mammalia"));

        assert!(!selector.add_or_select("212", "Aves (again)"));
        assert_eq!(selector.selected(), "212");
        assert_eq!(selector.options().len(), 3);
        assert_eq!(selector.options()[1].label, "Aves");
    }

    #[test]
    fn test_select_unknown_value() {
        let mut selector = TaxonSelector::new();
        assert!(!selector.select("42"));
        assert_eq!(selector.selected(), "ALL");
    }

    #[test]
    fn test_html_marks_selected() {
        let mut selector = TaxonSelector::new();
        selector.add_or_select("212", "Aves");
        let html = selector.to_html();
        assert!(html.contains(r#"<option value="212" selected>Aves</option>"#));
        assert!(html.contains(r#"<option value="ALL">All taxa</option>"#));
    }
}
