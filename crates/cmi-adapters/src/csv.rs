//! CSV feed adapter for published license-roster exports.
//!
//! The feed is a plain comma-separated export with a fixed column order:
//! business name, license no., classification code, classification name,
//! status, city, state, zip, phone, more-info. Splitting is naive (no
//! quoted-field handling) per the documented best-effort contract; a field
//! containing a literal comma will shift columns for that row only.

use async_trait::async_trait;
use cmi_core::RawContractor;
use cmi_store::HttpFetcher;

use crate::{AdapterBatch, AdapterError, SourceAdapter};

/// Minimum columns a data row needs before it is worth shaping; the phone
/// column sits at index 8.
pub const CSV_MIN_COLUMNS: usize = 9;

#[derive(Debug, Clone)]
pub struct CsvFeedAdapter {
    label: String,
    url: String,
}

impl CsvFeedAdapter {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl SourceAdapter for CsvFeedAdapter {
    fn source_label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, http: &HttpFetcher) -> Result<AdapterBatch, AdapterError> {
        let body = http.fetch_text(&self.label, &self.url).await?;
        Ok(parse_csv_feed(&body))
    }
}

fn opt(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse the feed body. The header row is skipped; blank lines are ignored;
/// rows with too few columns or an empty leading field are dropped and
/// surfaced only through the `malformed` count.
pub fn parse_csv_feed(body: &str) -> AdapterBatch {
    let mut records = Vec::new();
    let mut malformed = 0usize;

    for (idx, line) in body.lines().enumerate() {
        if idx == 0 || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < CSV_MIN_COLUMNS || fields[0].is_empty() {
            malformed += 1;
            continue;
        }
        records.push(RawContractor {
            business_name: fields[0].to_string(),
            license_number: opt(fields[1]),
            classification_code: opt(fields[2]),
            classification_name: opt(fields[3]),
            license_status: opt(fields[4]),
            city: opt(fields[5]),
            state: opt(fields[6]),
            zip_code: opt(fields[7]),
            phone: opt(fields[8]),
            ..RawContractor::default()
        });
    }

    AdapterBatch { records, malformed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmi_core::normalize::normalize_record;

    const HEADER: &str =
        "Business Name,License No,Classification Type,Classification,Status,City,State,Zip,Phone,More Info";

    #[test]
    fn roster_row_parses_and_normalizes() {
        let body = format!(
            "{HEADER}\nAcme Stone LLC,ROC123456,B,General,Active,Phoenix,AZ,85001,6025551234,info"
        );
        let batch = parse_csv_feed(&body);
        assert_eq!(batch.malformed, 0);
        assert_eq!(batch.records.len(), 1);

        let raw = &batch.records[0];
        assert_eq!(raw.business_name, "Acme Stone LLC");
        assert_eq!(raw.license_number.as_deref(), Some("ROC123456"));
        assert_eq!(raw.license_status.as_deref(), Some("Active"));

        let record = normalize_record(raw, "Arizona ROC Database");
        assert_eq!(record.business_name, "Acme Stone LLC");
        assert_eq!(record.phone.as_deref(), Some("(602) 555-1234"));
        assert_eq!(record.city.as_deref(), Some("Phoenix"));
        assert_eq!(record.state.as_deref(), Some("AZ"));
        assert_eq!(record.zip_code.as_deref(), Some("85001"));
        assert_eq!(
            record.specialties,
            vec!["General Contracting", "Home Building"]
        );
    }

    #[test]
    fn header_row_is_not_a_record() {
        let batch = parse_csv_feed(HEADER);
        assert!(batch.records.is_empty());
        assert_eq!(batch.malformed, 0);
    }

    #[test]
    fn short_rows_and_empty_names_count_as_malformed() {
        let body = format!(
            "{HEADER}\n\
             Acme Stone LLC,ROC123456,B,General,Active,Phoenix,AZ,85001,6025551234,info\n\
             Too Short Row,ROC1,B\n\
             ,ROC2,B,General,Active,Mesa,AZ,85201,4805550000,info\n\
             \n\
             Desert Builders,ROC3,B-2,General,Active,Tempe,AZ,85281,4805551111,info"
        );
        let batch = parse_csv_feed(&body);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.malformed, 2);
    }

    #[test]
    fn missing_optional_fields_become_none() {
        let body = format!("{HEADER}\nBare Bones Co,,,,Active,,,,,");
        let batch = parse_csv_feed(&body);
        assert_eq!(batch.records.len(), 1);
        let raw = &batch.records[0];
        assert_eq!(raw.license_number, None);
        assert_eq!(raw.classification_code, None);
        assert_eq!(raw.phone, None);
        assert_eq!(raw.license_status.as_deref(), Some("Active"));
    }
}
