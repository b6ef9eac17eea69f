//! Offline selector discovery.
//!
//! Helps a human author a [`crate::SelectorSet`] for a new source: rank
//! `tag.class` selectors by how often they repeat in a captured page, since a
//! listing's card container is usually the most-repeated classed element with
//! text in it. Advisory output only; this never persists anything and is not
//! part of a batch run.

use std::collections::BTreeMap;

use scraper::{Html, Selector};
use serde::Serialize;

const MIN_REPEATS: usize = 3;
const MAX_CANDIDATES: usize = 20;
const SAMPLE_TEXT_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorCandidate {
    pub selector: String,
    pub matches: usize,
    pub sample_text: String,
}

/// Rank repeating `tag.class` selectors in a page. Candidates with fewer than
/// three matches or no visible text are dropped; ties break alphabetically so
/// output is stable for a given page.
pub fn suggest_card_selectors(html: &str) -> Vec<SelectorCandidate> {
    let document = Html::parse_document(html);
    let classed = Selector::parse("[class]").expect("static selector");

    let mut counts: BTreeMap<String, (usize, String)> = BTreeMap::new();
    for element in document.select(&classed) {
        let tag = element.value().name();
        for class in element.value().classes() {
            let key = format!("{tag}.{class}");
            let entry = counts.entry(key).or_insert_with(|| (0, String::new()));
            entry.0 += 1;
            if entry.1.is_empty() {
                let text: String = element.text().collect::<String>();
                let trimmed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                entry.1 = trimmed.chars().take(SAMPLE_TEXT_LEN).collect();
            }
        }
    }

    let mut candidates: Vec<SelectorCandidate> = counts
        .into_iter()
        .filter(|(_, (matches, sample))| *matches >= MIN_REPEATS && !sample.is_empty())
        .map(|(selector, (matches, sample_text))| SelectorCandidate {
            selector,
            matches,
            sample_text,
        })
        .collect();
    candidates.sort_by(|a, b| b.matches.cmp(&a.matches).then(a.selector.cmp(&b.selector)));
    candidates.truncate(MAX_CANDIDATES);
    candidates
}
