//! TaxonomyIndex and local filtering over on-disk reference data

use std::sync::Arc;

use taxa_gallery::filter::{FilterEngine, FilterRequest};
use taxa_gallery::models::ImageRecord;
use taxa_gallery::taxonomy::{TaxonomyIndex, COUNTRY_CODES_FILE, KEYWORDS_FILE, MAPPING_FILE};
use tempfile::TempDir;

const MAPPING: &str = r#"{
    "212":     {"parents": [1, 44], "country_codes": [], "localities": []},
    "9326020": {"parents": [1, 44, 212], "country_codes": ["BR"], "localities": []},
    "2480528": {"parents": [1, 44, 212], "country_codes": [], "localities": ["Southern Kenya savanna"]},
    "5219404": {"parents": [1, 44, 359], "country_codes": ["KE", "TZ"], "localities": []},
    "359":     {"parents": [1, 44], "country_codes": [], "localities": []},
    "8077224": {"parents": [1, 44, 359], "country_codes": ["KE"], "localities": ["Alps"]}
}"#;

const COUNTRY_CODES: &str = r#"{
    "SOUTH_AMERICA": ["BR", "AR"],
    "AFRICA": ["KE", "TZ"],
    "EUROPE": ["FR"]
}"#;

const KEYWORDS: &str = r#"{
    "AFRICA": ["kenya", "sahara"],
    "EUROPE": ["alps"]
}"#;

fn data_folder() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(MAPPING_FILE), MAPPING).unwrap();
    std::fs::write(dir.path().join(COUNTRY_CODES_FILE), COUNTRY_CODES).unwrap();
    std::fs::write(dir.path().join(KEYWORDS_FILE), KEYWORDS).unwrap();
    dir
}

fn images() -> Vec<ImageRecord> {
    ["5219404", "9326020", "unknown", "2480528", "9326020"]
        .iter()
        .enumerate()
        .map(|(i, id)| ImageRecord {
            url: Some(format!("https://img/{}.jpg", i)),
            gbif_id: Some(id.to_string()),
            ..Default::default()
        })
        .collect()
}

fn urls(records: &[ImageRecord]) -> Vec<&str> {
    records.iter().filter_map(|r| r.url.as_deref()).collect()
}

#[test]
fn test_load_from_folder() {
    let dir = data_folder();
    let index = TaxonomyIndex::load_from_folder(dir.path());
    assert_eq!(index.len(), 6);
    assert_eq!(index.rules().continents(), vec!["AFRICA", "EUROPE", "SOUTH_AMERICA"]);
}

#[test]
fn test_is_in_continent_properties() {
    let dir = data_folder();
    let index = TaxonomyIndex::load_from_folder(dir.path());

    // empty continent: always true, even for unknown ids
    assert!(index.is_in_continent("212", ""));
    assert!(index.is_in_continent("not-there", ""));

    // unknown id with a continent: false
    assert!(!index.is_in_continent("not-there", "AFRICA"));

    // direct code match
    assert!(index.is_in_continent("9326020", "SOUTH_AMERICA"));

    // locality keyword match
    assert!(index.is_in_continent("2480528", "AFRICA"));

    // country code holds regardless of what the locality text names
    assert!(index.is_in_continent("8077224", "AFRICA"));
    assert!(!index.is_in_continent("8077224", "SOUTH_AMERICA"));

    // parent with no data of its own, justified by a child
    assert!(index.is_in_continent("212", "SOUTH_AMERICA"));
    assert!(index.is_in_continent("212", "AFRICA"));
    assert!(!index.is_in_continent("212", "EUROPE"));
}

#[test]
fn test_missing_reference_files_degrade_to_no_match() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(MAPPING_FILE), "{ not json").unwrap();

    let index = TaxonomyIndex::load_from_folder(dir.path());
    assert!(index.is_empty());
    assert!(index.rules().is_empty());
    assert!(!index.is_in_continent("212", "AFRICA"));
}

#[tokio::test]
async fn test_local_filter_all_is_identity() {
    let dir = data_folder();
    let engine = FilterEngine::local(Arc::new(TaxonomyIndex::load_from_folder(dir.path())));
    let all = images();

    let request = FilterRequest::from_params("ALL", "").unwrap();
    let filtered = engine.filter(&request, &all).await.unwrap();
    assert_eq!(filtered, all);
}

#[tokio::test]
async fn test_local_filter_taxon_and_continent() {
    let dir = data_folder();
    let engine = FilterEngine::local(Arc::new(TaxonomyIndex::load_from_folder(dir.path())));
    let all = images();

    let birds = FilterRequest::from_params("212", "").unwrap();
    let filtered = engine.filter(&birds, &all).await.unwrap();
    assert_eq!(urls(&filtered), vec!["https://img/1.jpg", "https://img/3.jpg", "https://img/4.jpg"]);

    let african_birds = FilterRequest::from_params("212", "AFRICA").unwrap();
    let filtered = engine.filter(&african_birds, &all).await.unwrap();
    assert_eq!(urls(&filtered), vec!["https://img/3.jpg"]);

    let african_anything = FilterRequest::from_params("ALL", "AFRICA").unwrap();
    let filtered = engine.filter(&african_anything, &all).await.unwrap();
    assert_eq!(urls(&filtered), vec!["https://img/0.jpg", "https://img/3.jpg"]);
}
