//! Continent membership rules
//!
//! Each continent owns a set of ISO country codes and a list of locality
//! keywords. A taxon matches when one of its country codes is registered for
//! the continent, or when one of its locality strings contains a keyword
//! (case-insensitive substring match).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use taxa_common::Result;

use super::index::Taxon;

/// Country codes and locality keywords for one continent
#[derive(Debug, Clone, Default)]
pub struct ContinentRule {
    country_codes: HashSet<String>,
    /// Stored lowercased
    keywords: Vec<String>,
}

impl ContinentRule {
    pub fn new<C, K>(country_codes: C, keywords: K) -> Self
    where
        C: IntoIterator<Item = String>,
        K: IntoIterator<Item = String>,
    {
        Self {
            country_codes: country_codes.into_iter().collect(),
            keywords: keywords
                .into_iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Whether the taxon's own distribution data places it on this continent
    pub fn matches(&self, taxon: &Taxon) -> bool {
        if taxon
            .country_codes
            .iter()
            .any(|code| self.country_codes.contains(code))
        {
            return true;
        }

        taxon.localities.iter().any(|locality| {
            let locality = locality.to_lowercase();
            self.keywords.iter().any(|k| locality.contains(k.as_str()))
        })
    }

    pub fn country_codes(&self) -> &HashSet<String> {
        &self.country_codes
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// All continent rules, keyed by continent name
///
/// Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct ContinentRules {
    rules: HashMap<String, ContinentRule>,
}

impl ContinentRules {
    /// Build from the two reference maps
    ///
    /// A continent present in only one map gets an empty set for the other.
    pub fn from_maps(
        country_codes: HashMap<String, Vec<String>>,
        keywords: HashMap<String, Vec<String>>,
    ) -> Self {
        let mut codes = country_codes;
        let mut words = keywords;

        let names: HashSet<String> = codes.keys().chain(words.keys()).cloned().collect();
        let rules = names
            .into_iter()
            .map(|name| {
                let rule = ContinentRule::new(
                    codes.remove(&name).unwrap_or_default(),
                    words.remove(&name).unwrap_or_default(),
                );
                (name, rule)
            })
            .collect();

        Self { rules }
    }

    /// Load `continent_to_country_codes.json` and `continent_keywords.json`
    pub fn load(country_codes_path: &Path, keywords_path: &Path) -> Result<Self> {
        let codes: HashMap<String, Vec<String>> =
            serde_json::from_str(&std::fs::read_to_string(country_codes_path)?)?;
        let keywords: HashMap<String, Vec<String>> =
            serde_json::from_str(&std::fs::read_to_string(keywords_path)?)?;
        Ok(Self::from_maps(codes, keywords))
    }

    pub fn insert(&mut self, continent: impl Into<String>, rule: ContinentRule) {
        self.rules.insert(continent.into(), rule);
    }

    pub fn get(&self, continent: &str) -> Option<&ContinentRule> {
        self.rules.get(continent)
    }

    /// Continent names, sorted
    pub fn continents(&self) -> Vec<&str> {
        let sorted: BTreeMap<&str, ()> = self.rules.keys().map(|k| (k.as_str(), ())).collect();
        sorted.into_keys().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxon(codes: &[&str], localities: &[&str]) -> Taxon {
        Taxon {
            parents: Vec::new(),
            country_codes: codes.iter().map(|s| s.to_string()).collect(),
            localities: localities.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_country_code_match() {
        let rule = ContinentRule::new(vec!["BR".to_string(), "AR".to_string()], vec![]);
        assert!(rule.matches(&taxon(&["US", "BR"], &[])));
        assert!(!rule.matches(&taxon(&["US"], &[])));
    }

    #[test]
    fn test_keyword_match_is_case_insensitive_substring() {
        let rule = ContinentRule::new(vec![], vec!["Amazon".to_string()]);
        assert!(rule.matches(&taxon(&[], &["lower AMAZONIA basin"])));
        assert!(!rule.matches(&taxon(&[], &["Andes"])));
    }

    #[test]
    fn test_from_maps_merges_both_sources() {
        let mut codes = HashMap::new();
        codes.insert("Europe".to_string(), vec!["FR".to_string()]);
        let mut keywords = HashMap::new();
        keywords.insert("Europe".to_string(), vec!["alps".to_string()]);
        keywords.insert("Oceania".to_string(), vec!["pacific".to_string()]);

        let rules = ContinentRules::from_maps(codes, keywords);
        assert_eq!(rules.continents(), vec!["Europe", "Oceania"]);

        let europe = rules.get("Europe").unwrap();
        assert!(europe.country_codes().contains("FR"));
        assert_eq!(europe.keywords(), &["alps".to_string()]);
        assert!(rules.get("Oceania").unwrap().country_codes().is_empty());
    }
}
