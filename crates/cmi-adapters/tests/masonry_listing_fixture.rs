//! Fixture-backed parse test for a captured masonry search page.
//!
//! Selector sets live in config and rot as sites change markup; this pins the
//! current set against a saved copy of the page it was written for.

use std::path::Path;

use cmi_adapters::scrape::{parse_listing_page, SelectorSet};
use cmi_core::normalize::normalize_record;

fn fixture_html() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/masonry_listing.html");
    std::fs::read_to_string(path).expect("read fixture")
}

fn selectors() -> SelectorSet {
    SelectorSet {
        card: "div.result-card".to_string(),
        name: "h3.biz-name".to_string(),
        phone: Some("span.phone".to_string()),
        address: Some("address".to_string()),
        website: Some("a.site-link".to_string()),
        rating: Some("span.stars".to_string()),
        review_count: Some("span.review-count".to_string()),
    }
}

#[test]
fn captured_page_yields_three_records_and_one_malformed_card() {
    let batch = parse_listing_page(&fixture_html(), &selectors()).unwrap();
    assert_eq!(batch.records.len(), 3);
    assert_eq!(batch.malformed, 1);

    let names: Vec<&str> = batch
        .records
        .iter()
        .map(|r| r.business_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Desert Masonry Pros", "Valley Stoneworks", "Mesa Block & Brick"]
    );
}

#[test]
fn scraped_records_normalize_into_canonical_shape() {
    let batch = parse_listing_page(&fixture_html(), &selectors()).unwrap();
    let record = normalize_record(&batch.records[1], "Yelp");

    assert_eq!(record.business_name, "Valley Stoneworks");
    assert_eq!(record.phone.as_deref(), Some("(480) 555-2211"));
    assert_eq!(record.address.as_deref(), Some("2435 E Broadway Rd"));
    assert_eq!(record.city.as_deref(), Some("Phoenix"));
    assert_eq!(record.state.as_deref(), Some("AZ"));
    assert_eq!(record.zip_code.as_deref(), Some("85040"));
    assert_eq!(record.rating, Some(4.0));
    assert_eq!(record.review_count, Some(58));
    assert_eq!(record.source, "Yelp");
    assert!(!record.specialties.is_empty());
}

#[test]
fn seven_digit_phone_passes_through_unformatted() {
    let batch = parse_listing_page(&fixture_html(), &selectors()).unwrap();
    let record = normalize_record(&batch.records[2], "Yelp");
    assert_eq!(record.phone.as_deref(), Some("555-0199"));
}
