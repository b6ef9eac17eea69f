//! Page-scrape adapter driven by per-source selector configuration.
//!
//! Selector sets are configuration, not code: adding or repairing a source is
//! a `sources.yaml` edit plus a fixture test, never a code change. Listing
//! markup goes stale in practice, so the parse path is kept testable offline
//! against captured HTML.

use async_trait::async_trait;
use cmi_core::RawContractor;
use cmi_store::HttpFetcher;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::{AdapterBatch, AdapterError, SourceAdapter};

/// CSS selectors for one listing page: a repeating card container plus
/// sub-selectors resolved within each card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    pub card: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub review_count: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PageScrapeAdapter {
    label: String,
    url: String,
    selectors: SelectorSet,
}

impl PageScrapeAdapter {
    pub fn new(
        label: impl Into<String>,
        url: impl Into<String>,
        selectors: SelectorSet,
    ) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            selectors,
        }
    }
}

#[async_trait]
impl SourceAdapter for PageScrapeAdapter {
    fn source_label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, http: &HttpFetcher) -> Result<AdapterBatch, AdapterError> {
        let html = http.fetch_text(&self.label, &self.url).await?;
        parse_listing_page(&html, &self.selectors)
    }
}

fn parse_selector(raw: &str) -> Result<Selector, AdapterError> {
    Selector::parse(raw).map_err(|e| AdapterError::Message(format!("bad selector {raw:?}: {e}")))
}

fn text_or_none(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn select_first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|n| text_or_none(n.text().collect::<String>()))
}

fn select_first_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|n| n.value().attr(attr))
        .and_then(|s| text_or_none(s.to_string()))
}

fn first_number(text: &str) -> Option<f64> {
    let mut current = String::new();
    let mut seen_dot = false;
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
            continue;
        }
        if ch == '.' && !seen_dot && !current.is_empty() {
            current.push(ch);
            seen_dot = true;
            continue;
        }
        if !current.is_empty() {
            break;
        }
    }
    current.parse().ok()
}

/// Parse a fetched listing page into raw records, one per matched card.
/// Cards whose name selector yields no text count as malformed; sub-fields
/// are best-effort and simply stay `None` when absent.
pub fn parse_listing_page(
    html: &str,
    selectors: &SelectorSet,
) -> Result<AdapterBatch, AdapterError> {
    let document = Html::parse_document(html);
    let card_sel = parse_selector(&selectors.card)?;
    let name_sel = parse_selector(&selectors.name)?;
    let phone_sel = selectors.phone.as_deref().map(parse_selector).transpose()?;
    let address_sel = selectors
        .address
        .as_deref()
        .map(parse_selector)
        .transpose()?;
    let website_sel = selectors
        .website
        .as_deref()
        .map(parse_selector)
        .transpose()?;
    let rating_sel = selectors
        .rating
        .as_deref()
        .map(parse_selector)
        .transpose()?;
    let review_count_sel = selectors
        .review_count
        .as_deref()
        .map(parse_selector)
        .transpose()?;

    let mut records = Vec::new();
    let mut malformed = 0usize;

    for card in document.select(&card_sel) {
        let Some(business_name) = select_first_text(card, &name_sel) else {
            malformed += 1;
            continue;
        };

        let website = website_sel
            .as_ref()
            .and_then(|sel| select_first_attr(card, sel, "href"));
        let rating = rating_sel
            .as_ref()
            .and_then(|sel| select_first_text(card, sel))
            .as_deref()
            .and_then(first_number);
        let review_count = review_count_sel
            .as_ref()
            .and_then(|sel| select_first_text(card, sel))
            .as_deref()
            .and_then(first_number)
            .map(|n| n as i64);

        records.push(RawContractor {
            business_name,
            phone: phone_sel.as_ref().and_then(|sel| select_first_text(card, sel)),
            address: address_sel
                .as_ref()
                .and_then(|sel| select_first_text(card, sel)),
            website,
            rating,
            review_count,
            ..RawContractor::default()
        });
    }

    Ok(AdapterBatch { records, malformed })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masonry_selectors() -> SelectorSet {
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

    const LISTING_HTML: &str = r#"
        <html><body>
          <div class="result-card">
            <h3 class="biz-name">Desert Masonry Pros</h3>
            <span class="phone">(602) 555-7788</span>
            <address>88 W Van Buren St, Phoenix, AZ 85003</address>
            <a class="site-link" href="https://desertmasonrypros.com">site</a>
            <span class="stars">4.5 star rating</span>
            <span class="review-count">132 reviews</span>
          </div>
          <div class="result-card">
            <h3 class="biz-name">Valley Stoneworks</h3>
            <span class="phone">480.555.2211</span>
          </div>
          <div class="result-card">
            <span class="phone">(480) 555-9999</span>
          </div>
        </body></html>
    "#;

    #[test]
    fn cards_parse_into_raw_records() {
        let batch = parse_listing_page(LISTING_HTML, &masonry_selectors()).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.malformed, 1);

        let first = &batch.records[0];
        assert_eq!(first.business_name, "Desert Masonry Pros");
        assert_eq!(first.phone.as_deref(), Some("(602) 555-7788"));
        assert_eq!(
            first.address.as_deref(),
            Some("88 W Van Buren St, Phoenix, AZ 85003")
        );
        assert_eq!(
            first.website.as_deref(),
            Some("https://desertmasonrypros.com")
        );
        assert_eq!(first.rating, Some(4.5));
        assert_eq!(first.review_count, Some(132));

        let second = &batch.records[1];
        assert_eq!(second.business_name, "Valley Stoneworks");
        assert_eq!(second.address, None);
        assert_eq!(second.rating, None);
    }

    #[test]
    fn optional_selectors_can_be_omitted() {
        let selectors = SelectorSet {
            card: "div.result-card".to_string(),
            name: "h3.biz-name".to_string(),
            phone: None,
            address: None,
            website: None,
            rating: None,
            review_count: None,
        };
        let batch = parse_listing_page(LISTING_HTML, &selectors).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert!(batch.records.iter().all(|r| r.phone.is_none()));
    }

    #[test]
    fn invalid_selector_is_a_config_error() {
        let mut selectors = masonry_selectors();
        selectors.card = ":::nope".to_string();
        let err = parse_listing_page(LISTING_HTML, &selectors).unwrap_err();
        assert!(matches!(err, AdapterError::Message(_)));
    }

    #[test]
    fn first_number_reads_leading_floats() {
        assert_eq!(first_number("4.5 star rating"), Some(4.5));
        assert_eq!(first_number("132 reviews"), Some(132.0));
        assert_eq!(first_number("no digits"), None);
    }
}
