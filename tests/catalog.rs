use assert_matches::assert_matches;

use glucose_ml_catalog::catalog::{
    Access, CatalogEntry, CatalogFilter, data_type_letter, parse_study_days, population_code,
    sample_size_min,
};
use glucose_ml_catalog::error::CatalogError;
use glucose_ml_catalog::records::CardRecord;

fn card(title: &str, metadata: &str, types: &[&str], sources: &[&str]) -> CardRecord {
    CardRecord {
        title: title.to_string(),
        metadata: metadata.to_string(),
        description: String::new(),
        types: types.iter().map(|kind| kind.to_string()).collect(),
        sources: sources.iter().map(|letter| letter.to_string()).collect(),
    }
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn entry_facets_come_from_card_metadata() {
    let entry = CatalogEntry::from(&card(
        "Shanghai T1DM",
        "112 participants • 14 days • Controlled access",
        &["Type 1 diabetes", "T2D"],
        &[" g", "i"],
    ));

    assert_eq!(entry.id, "shanghai-t1dm");
    assert_eq!(entry.participants, Some(112.0));
    assert_eq!(entry.study_days, Some(14.0));
    assert_eq!(entry.access, Some(Access::Controlled));
    assert_eq!(entry.populations, vec!["T1D", "T2D"]);
    assert_eq!(entry.sources, vec!["G", "I"]);
}

#[test]
fn filter_requires_every_facet() {
    let entry = CatalogEntry::from(&card(
        "CGMacros",
        "48 participants · 22 days · Public access",
        &["T2D", "PreD", "ND"],
        &["G", "I", "S", "A"],
    ));

    let matching = CatalogFilter::from_labels(
        &labels(&["CGM", "Meals"]),
        &labels(&["Prediabetes"]),
        Some("14+ days"),
        Some("20+"),
        Some("Public access"),
    )
    .unwrap();
    assert!(matching.matches(&entry));

    let too_long = CatalogFilter::from_labels(&[], &[], Some("1 month"), None, None).unwrap();
    assert!(!too_long.matches(&entry));

    let controlled = CatalogFilter::from_labels(&[], &[], None, None, Some("Controlled")).unwrap();
    assert!(!controlled.matches(&entry));

    let type1 = CatalogFilter::from_labels(&[], &labels(&["T1D"]), None, None, None).unwrap();
    assert!(!type1.matches(&entry));
}

#[test]
fn empty_filter_matches_cards_without_facets() {
    let entry = CatalogEntry::from(&card("Bare", "", &[], &[]));
    let filter = CatalogFilter::default();
    assert!(filter.is_empty());
    assert!(filter.matches(&entry));

    let sized = CatalogFilter::from_labels(&[], &[], None, Some("20+"), None).unwrap();
    assert!(!sized.matches(&entry));
}

#[test]
fn unknown_labels_are_rejected() {
    assert_matches!(data_type_letter("Genome"), Err(CatalogError::InvalidFilter(_)));
    assert_matches!(population_code("Gestational"), Err(CatalogError::InvalidFilter(_)));
    assert_matches!(sample_size_min("lots"), Err(CatalogError::InvalidFilter(_)));
    assert_matches!("open".parse::<Access>(), Err(CatalogError::InvalidFilter(_)));

    let err = CatalogFilter::from_labels(&labels(&["CGM", "Genome"]), &[], None, None, None)
        .unwrap_err();
    assert_matches!(err, CatalogError::InvalidFilter(ref label) if label == "Genome");
}

#[test]
fn filter_bar_labels_map_to_codes() {
    assert_eq!(data_type_letter("Insulin delivery").unwrap(), "I");
    assert_eq!(data_type_letter("Activity tracker").unwrap(), "A");
    assert_eq!(data_type_letter("Lab measurements").unwrap(), "C");
    assert_eq!(population_code("Non-diabetic").unwrap(), "ND");
    assert_eq!(sample_size_min("1,000+").unwrap(), 1000.0);
    assert_eq!(parse_study_days("30 days of CGM"), Some(30.0));
    assert_eq!(parse_study_days("1 day"), Some(1.0));
}
