//! Pure field normalizers: phone, address, specialties, synthetic emails.
//!
//! These are best-effort heuristics, not strict parsers. Unparsable input
//! passes through trimmed (phone) or lands whole in the fallback field
//! (address); callers must treat `None` outputs as expected, not exceptional.

use chrono::{DateTime, Utc};

use crate::{ContractorRecord, RawContractor};

/// Specialty lists keyed by license classification code.
///
/// Codes follow the Arizona ROC scheme the CSV feed uses. Unknown codes fall
/// back to [`DEFAULT_SPECIALTIES`], never to an empty list.
const CLASSIFICATION_SPECIALTIES: &[(&str, &[&str])] = &[
    ("A", &["General Engineering", "Commercial Construction"]),
    ("B", &["General Contracting", "Home Building"]),
    ("B-1", &["General Contracting", "Commercial Construction"]),
    ("B-2", &["General Contracting", "Residential Remodeling"]),
    ("KB-1", &["General Contracting", "Commercial Construction", "Home Building"]),
    ("KB-2", &["General Contracting", "Home Building", "Residential Remodeling"]),
    ("CR-11", &["Electrical"]),
    ("CR-37", &["Plumbing"]),
    ("CR-39", &["HVAC", "Air Conditioning"]),
    ("CR-42", &["Roofing"]),
    ("CR-48", &["Ceramic Tile", "Flooring"]),
    ("CR-61", &["Carpentry", "Remodeling"]),
];

pub const DEFAULT_SPECIALTIES: &[&str] = &["General Contracting"];

/// Domain suffix appended to synthesized contact emails.
pub const SYNTHETIC_EMAIL_DOMAIN: &str = "import.contractormarket.com";

/// Count of ASCII digits in a raw phone string.
pub fn phone_digit_count(raw: &str) -> usize {
    raw.chars().filter(char::is_ascii_digit).count()
}

/// Normalize a phone number to `(XXX) XXX-XXXX` display format.
///
/// Strips all non-digit characters; exactly 10 digits get reformatted. Any
/// other digit count passes the trimmed original through unchanged. Empty
/// input becomes `None`. Never errors.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        Some(format!(
            "({}) {}-{}",
            &digits[..3],
            &digits[3..6],
            &digits[6..]
        ))
    } else {
        Some(trimmed.to_string())
    }
}

/// Result of the comma-split address heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAddress {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Split a one-line US address into street/city/state/zip.
///
/// Splits on commas; when the last segment looks like `ST 12345` (or a zip+4)
/// it becomes state/zip, the preceding segment becomes city, and whatever is
/// left rejoins as the street address. Anything else degrades to the whole
/// input as `address` with the other fields `None`. Non-US and ambiguous
/// formats take the fallback path by design.
pub fn parse_address(raw: &str) -> ParsedAddress {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedAddress::default();
    }

    let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    if parts.len() >= 2 {
        if let Some((state, zip_code)) = split_state_zip(parts[parts.len() - 1]) {
            let city = parts[parts.len() - 2];
            let street = parts[..parts.len() - 2].join(", ");
            return ParsedAddress {
                address: non_empty(&street),
                city: non_empty(city),
                state: Some(state),
                zip_code: Some(zip_code),
            };
        }
    }

    ParsedAddress {
        address: Some(trimmed.to_string()),
        ..ParsedAddress::default()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn split_state_zip(segment: &str) -> Option<(String, String)> {
    let mut words = segment.split_whitespace();
    let state = words.next()?;
    let zip = words.next()?;
    if words.next().is_some() {
        return None;
    }
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !is_zip(zip) {
        return None;
    }
    Some((state.to_ascii_uppercase(), zip.to_string()))
}

fn is_zip(zip: &str) -> bool {
    let bytes = zip.as_bytes();
    match bytes.len() {
        5 => bytes.iter().all(u8::is_ascii_digit),
        10 => {
            bytes[..5].iter().all(u8::is_ascii_digit)
                && bytes[5] == b'-'
                && bytes[6..].iter().all(u8::is_ascii_digit)
        }
        _ => false,
    }
}

/// Look up the specialty list for a license classification code.
pub fn specialties_for_classification(code: &str) -> Vec<String> {
    let wanted = code.trim().to_ascii_uppercase();
    let found = CLASSIFICATION_SPECIALTIES
        .iter()
        .find(|(key, _)| *key == wanted)
        .map(|(_, list)| *list)
        .unwrap_or(DEFAULT_SPECIALTIES);
    found.iter().map(ToString::to_string).collect()
}

/// Build a globally unique placeholder email for a business with no contact
/// address on file. The millisecond timestamp disambiguates similarly-named
/// businesses across repeated runs.
pub fn synthetic_email(business_name: &str, now: DateTime<Utc>) -> String {
    let mut local: String = business_name
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    local.truncate(20);
    if local.is_empty() {
        local.push_str("contractor");
    }
    format!("{}{}@{}", local, now.timestamp_millis(), SYNTHETIC_EMAIL_DOMAIN)
}

/// Turn a raw adapter record into the canonical contractor shape.
///
/// Explicit city/state/zip columns win over the address heuristic, and an
/// explicit specialty list wins over the classification lookup. Email stays
/// `None` here; the upsert layer synthesizes one at insert time so re-imports
/// never churn an existing account address.
pub fn normalize_record(raw: &RawContractor, source: &str) -> ContractorRecord {
    let parsed = raw
        .address
        .as_deref()
        .map(parse_address)
        .unwrap_or_default();

    let specialties = if !raw.specialties.is_empty() {
        raw.specialties.clone()
    } else {
        specialties_for_classification(raw.classification_code.as_deref().unwrap_or(""))
    };

    ContractorRecord {
        business_name: raw.business_name.trim().to_string(),
        license_number: raw.license_number.as_deref().and_then(non_empty),
        license_status: raw.license_status.as_deref().and_then(non_empty),
        phone: raw.phone.as_deref().and_then(normalize_phone),
        email: raw
            .email
            .as_deref()
            .and_then(non_empty)
            .map(|e| e.to_ascii_lowercase()),
        address: parsed.address,
        city: raw.city.as_deref().and_then(non_empty).or(parsed.city),
        state: raw.state.as_deref().and_then(non_empty).or(parsed.state),
        zip_code: raw
            .zip_code
            .as_deref()
            .and_then(non_empty)
            .or(parsed.zip_code),
        specialties,
        rating: raw.rating,
        review_count: raw.review_count,
        website: raw.website.as_deref().and_then(non_empty),
        source: source.to_string(),
    }
}
