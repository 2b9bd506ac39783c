//! In-memory taxonomy index
//!
//! Built from `gbif_mapping.json`: for every taxon key, its ancestor keys,
//! the country codes it was recorded in and free-text localities. Answers
//! "does taxon X occur on continent C", where a taxon occurs on a continent
//! if it or any known descendant has matching distribution data.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use taxa_common::Result;

use super::continents::ContinentRules;

/// File names inside the reference data folder
pub const MAPPING_FILE: &str = "gbif_mapping.json";
pub const COUNTRY_CODES_FILE: &str = "continent_to_country_codes.json";
pub const KEYWORDS_FILE: &str = "continent_keywords.json";

/// One node of the classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxon {
    /// Ancestor keys (GBIF emits every rank above the taxon)
    #[serde(default, deserialize_with = "lenient_ids")]
    pub parents: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub country_codes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub localities: Vec<String>,
}

impl Taxon {
    pub fn has_parent(&self, key: &str) -> bool {
        self.parents.iter().any(|p| p == key)
    }
}

/// Accepts numbers or strings, drops anything else, tolerates `null`
fn lenient_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
        .collect())
}

fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

/// Taxonomy plus continent rules
#[derive(Debug, Clone, Default)]
pub struct TaxonomyIndex {
    taxa: HashMap<String, Taxon>,
    /// parent key → keys of taxa listing it among their parents
    children: HashMap<String, Vec<String>>,
    rules: ContinentRules,
}

impl TaxonomyIndex {
    pub fn new(taxa: HashMap<String, Taxon>, rules: ContinentRules) -> Self {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for (id, taxon) in &taxa {
            for parent in &taxon.parents {
                children.entry(parent.clone()).or_default().push(id.clone());
            }
        }
        for list in children.values_mut() {
            list.sort();
            list.dedup();
        }

        Self {
            taxa,
            children,
            rules,
        }
    }

    /// Index with no taxa and no rules: every lookup answers "not found"
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode the taxon map, skipping malformed entries
    pub fn parse_mapping(json: &str) -> Result<HashMap<String, Taxon>> {
        let raw: HashMap<String, Value> = serde_json::from_str(json)?;
        let mut taxa = HashMap::with_capacity(raw.len());
        for (id, value) in raw {
            match serde_json::from_value::<Taxon>(value) {
                Ok(taxon) => {
                    taxa.insert(id, taxon);
                }
                Err(e) => warn!(taxon = %id, "Skipping malformed taxon entry: {}", e),
            }
        }
        Ok(taxa)
    }

    /// Load all three reference files from `folder`
    ///
    /// Each file degrades independently: an unreadable or malformed file is
    /// logged and treated as empty, so lookups answer "no match".
    pub fn load_from_folder(folder: &Path) -> Self {
        let mapping_path = folder.join(MAPPING_FILE);
        let taxa = match std::fs::read_to_string(&mapping_path)
            .map_err(taxa_common::Error::from)
            .and_then(|s| Self::parse_mapping(&s))
        {
            Ok(taxa) => taxa,
            Err(e) => {
                warn!("Error loading {}: {}", mapping_path.display(), e);
                HashMap::new()
            }
        };

        let rules = match ContinentRules::load(
            &folder.join(COUNTRY_CODES_FILE),
            &folder.join(KEYWORDS_FILE),
        ) {
            Ok(rules) => rules,
            Err(e) => {
                warn!("Error loading continent rules from {}: {}", folder.display(), e);
                ContinentRules::default()
            }
        };

        info!(
            taxa = taxa.len(),
            continents = rules.continents().len(),
            "Taxonomy index loaded"
        );
        Self::new(taxa, rules)
    }

    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.taxa.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Taxon> {
        self.taxa.get(id)
    }

    pub fn rules(&self) -> &ContinentRules {
        &self.rules
    }

    /// Every taxon key in the index
    pub fn all_ids(&self) -> impl Iterator<Item = &str> {
        self.taxa.keys().map(String::as_str)
    }

    /// Keys of the taxa whose parent list contains `key`
    pub fn descendants_of(&self, key: &str) -> &[String] {
        self.children.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `species_id` occurs on `continent`
    ///
    /// - An empty continent is a no-op filter: always true.
    /// - An id missing from the index is never on any continent.
    /// - Otherwise true if the taxon itself, or any taxon reachable through
    ///   child links, has a country code or locality matching the continent.
    ///
    /// Traversal keeps a visited set, so cyclic parent data terminates; a
    /// node seen twice contributes nothing new.
    pub fn is_in_continent(&self, species_id: &str, continent: &str) -> bool {
        if continent.is_empty() {
            return true;
        }
        if !self.contains(species_id) {
            return false;
        }
        let Some(rule) = self.rules.get(continent) else {
            debug!(continent = %continent, "No rules registered for continent");
            return false;
        };

        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![species_id];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(taxon) = self.taxa.get(id) else {
                continue;
            };
            if rule.matches(taxon) {
                return true;
            }
            for child in self.descendants_of(id) {
                if !visited.contains(child.as_str()) {
                    stack.push(child.as_str());
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::continents::ContinentRule;

    fn taxon(parents: &[&str], codes: &[&str], localities: &[&str]) -> Taxon {
        Taxon {
            parents: parents.iter().map(|s| s.to_string()).collect(),
            country_codes: codes.iter().map(|s| s.to_string()).collect(),
            localities: localities.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn rules() -> ContinentRules {
        let mut rules = ContinentRules::default();
        rules.insert(
            "Europe",
            ContinentRule::new(
                vec!["FR".to_string(), "DE".to_string()],
                vec!["Europe".to_string()],
            ),
        );
        rules.insert(
            "Africa",
            ContinentRule::new(vec!["KE".to_string()], vec!["Sahara".to_string()]),
        );
        rules
    }

    fn index() -> TaxonomyIndex {
        let mut taxa = HashMap::new();
        // 100 = family, 10 = genus under it, 1/2 = species under the genus
        taxa.insert("100".to_string(), taxon(&[], &[], &[]));
        taxa.insert("10".to_string(), taxon(&["100"], &[], &[]));
        taxa.insert("1".to_string(), taxon(&["100", "10"], &["FR"], &[]));
        taxa.insert("2".to_string(), taxon(&["100", "10"], &[], &["southern Sahara"]));
        taxa.insert("3".to_string(), taxon(&[], &["US"], &["Florida"]));
        TaxonomyIndex::new(taxa, rules())
    }

    #[test]
    fn test_empty_continent_always_true() {
        let index = index();
        assert!(index.is_in_continent("1", ""));
        assert!(index.is_in_continent("999", ""));
    }

    #[test]
    fn test_missing_species_is_false() {
        assert!(!index().is_in_continent("999", "Europe"));
    }

    #[test]
    fn test_direct_country_code_match() {
        assert!(index().is_in_continent("1", "Europe"));
    }

    #[test]
    fn test_country_code_wins_over_other_continent_locality() {
        let mut taxa = HashMap::new();
        taxa.insert("4".to_string(), taxon(&[], &["KE"], &["Europe lowlands"]));
        taxa.insert("5".to_string(), taxon(&[], &["KE"], &[]));
        let index = TaxonomyIndex::new(taxa, rules());

        assert!(index.is_in_continent("4", "Africa"));
        // the same species also matches the continent its locality names
        assert!(index.is_in_continent("4", "Europe"));
        assert!(index.is_in_continent("5", "Africa"));
        assert!(!index.is_in_continent("5", "Europe"));
    }

    #[test]
    fn test_locality_keyword_match() {
        assert!(index().is_in_continent("2", "Africa"));
        assert!(!index().is_in_continent("2", "Europe"));
    }

    #[test]
    fn test_parent_inherits_from_descendants() {
        let index = index();
        assert!(index.is_in_continent("10", "Europe"));
        assert!(index.is_in_continent("100", "Africa"));
        assert!(!index.is_in_continent("3", "Europe"));
    }

    #[test]
    fn test_unknown_continent_is_false() {
        assert!(!index().is_in_continent("1", "Atlantis"));
    }

    #[test]
    fn test_cycle_terminates() {
        let mut taxa = HashMap::new();
        taxa.insert("a".to_string(), taxon(&["b"], &[], &[]));
        taxa.insert("b".to_string(), taxon(&["a"], &[], &[]));
        taxa.insert("self".to_string(), taxon(&["self"], &[], &[]));
        let index = TaxonomyIndex::new(taxa, rules());

        assert!(!index.is_in_continent("a", "Europe"));
        assert!(!index.is_in_continent("self", "Europe"));
    }

    #[test]
    fn test_cycle_with_match_still_found() {
        let mut taxa = HashMap::new();
        taxa.insert("a".to_string(), taxon(&["b"], &[], &[]));
        taxa.insert("b".to_string(), taxon(&["a"], &["DE"], &[]));
        let index = TaxonomyIndex::new(taxa, rules());

        assert!(index.is_in_continent("a", "Europe"));
    }

    #[test]
    fn test_parse_mapping_is_lenient() {
        let json = r#"{
            "1": {"parents": [100, "10", null], "country_codes": ["FR"], "localities": null},
            "2": {},
            "3": "garbage"
        }"#;
        let taxa = TaxonomyIndex::parse_mapping(json).unwrap();

        assert_eq!(taxa.len(), 2);
        assert_eq!(taxa["1"].parents, vec!["100".to_string(), "10".to_string()]);
        assert!(taxa["1"].localities.is_empty());
        assert_eq!(taxa["2"], Taxon::default());
    }

    #[test]
    fn test_descendants_of() {
        let index = index();
        assert_eq!(index.descendants_of("10"), &["1".to_string(), "2".to_string()]);
        assert!(index.descendants_of("1").is_empty());
    }
}
