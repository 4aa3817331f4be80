use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// SEC form types this tool knows by name. Anything else is carried
/// through verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilingType {
    Form10K,
    Form10Q,
    Form8K,
    Form20F,
    FormS1,
    FormDEF14A,
    Other(String),
}

impl TryFrom<String> for FilingType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        FilingType::from_str(&s)
    }
}

impl From<FilingType> for String {
    fn from(t: FilingType) -> String {
        t.to_string()
    }
}

impl fmt::Display for FilingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilingType::Form10K => write!(f, "10-K"),
            FilingType::Form10Q => write!(f, "10-Q"),
            FilingType::Form8K => write!(f, "8-K"),
            FilingType::Form20F => write!(f, "20-F"),
            FilingType::FormS1 => write!(f, "S-1"),
            FilingType::FormDEF14A => write!(f, "DEF 14A"),
            FilingType::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for FilingType {
    type Err = String;

    fn from_str(s: &str) -> Result<FilingType, String> {
        match s.to_uppercase().as_str() {
            "10-K" => Ok(FilingType::Form10K),
            "10-Q" => Ok(FilingType::Form10Q),
            "8-K" => Ok(FilingType::Form8K),
            "20-F" => Ok(FilingType::Form20F),
            "S-1" => Ok(FilingType::FormS1),
            "DEF 14A" => Ok(FilingType::FormDEF14A),
            _ => Ok(FilingType::Other(s.to_string())),
        }
    }
}

/// One filing row, flattened out of the columnar submissions JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filing {
    pub accession_number: String,
    pub filing_type: FilingType,
    pub filing_date: Option<NaiveDate>,
    pub report_date: Option<NaiveDate>,
    pub primary_document: String,
}

/// Columnar filing batch as EDGAR serves it: parallel arrays indexed
/// by filing. Dates are kept as strings here since EDGAR emits empty
/// strings for missing report dates.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FilingBatch {
    #[serde(rename = "accessionNumber", default)]
    pub accession_number: Vec<String>,
    #[serde(rename = "filingDate", default)]
    pub filing_date: Vec<String>,
    #[serde(rename = "reportDate", default)]
    pub report_date: Vec<String>,
    #[serde(rename = "form", default)]
    pub form: Vec<String>,
    #[serde(rename = "primaryDocument", default)]
    pub primary_document: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilingFile {
    pub name: String,
    #[serde(rename = "filingCount")]
    pub filing_count: i64,
    #[serde(rename = "filingFrom")]
    pub filing_from: String,
    #[serde(rename = "filingTo")]
    pub filing_to: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilingsData {
    pub recent: FilingBatch,
    #[serde(default)]
    pub files: Vec<FilingFile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompanySubmissions {
    pub cik: String,
    pub name: String,
    #[serde(default)]
    pub tickers: Vec<String>,
    pub filings: FilingsData,
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn column<'a>(col: &'a [String], i: usize) -> &'a str {
    col.get(i).map(String::as_str).unwrap_or("")
}

/// Flatten a columnar batch into `out`, honoring an optional cutoff date.
///
/// Returns true if the oldest filing date seen anywhere in the batch is
/// still within the cutoff, meaning older paginated batches may still
/// hold relevant filings. Ordering within a batch is not guaranteed, so
/// the whole batch is always scanned; only the oldest date seen is used
/// as the pagination signal. With no cutoff, everything is appended and
/// true is returned.
pub fn extract_filings(
    batch: &FilingBatch,
    out: &mut Vec<Filing>,
    cutoff_date: Option<NaiveDate>,
) -> bool {
    let mut oldest_seen: Option<NaiveDate> = None;

    for (i, accn) in batch.accession_number.iter().enumerate() {
        let filing_date = parse_date(column(&batch.filing_date, i));

        if let Some(cutoff) = cutoff_date {
            // An unparseable date is treated as current, so the row is kept.
            let date = filing_date.unwrap_or_else(|| chrono::Local::now().date_naive());
            if oldest_seen.map_or(true, |d| date < d) {
                oldest_seen = Some(date);
            }
            if date < cutoff {
                continue;
            }
        }

        let form = column(&batch.form, i);
        out.push(Filing {
            accession_number: accn.clone(),
            filing_type: form.parse().unwrap_or_else(|_: String| {
                FilingType::Other(form.to_string())
            }),
            filing_date,
            report_date: parse_date(column(&batch.report_date, i)),
            primary_document: column(&batch.primary_document, i).to_string(),
        });
    }

    match (cutoff_date, oldest_seen) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(cutoff), Some(oldest)) => oldest >= cutoff,
    }
}

/// Report category parsed out of a FilingSummary long name,
/// e.g. "0000003 - Statement - CONSOLIDATED BALANCE SHEETS".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportCategory {
    Document,
    Statement,
    Disclosure,
    Other(String),
}

impl ReportCategory {
    pub fn parse(long_name: &str) -> Self {
        let segment = long_name
            .split(" - ")
            .nth(1)
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        match segment.as_str() {
            "document" => ReportCategory::Document,
            "statement" => ReportCategory::Statement,
            "disclosure" => ReportCategory::Disclosure,
            _ => ReportCategory::Other(segment),
        }
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportCategory::Document => write!(f, "document"),
            ReportCategory::Statement => write!(f, "statement"),
            ReportCategory::Disclosure => write!(f, "disclosure"),
            ReportCategory::Other(s) => write!(f, "{}", s),
        }
    }
}

/// One exportable report inside a filing, taken from FilingSummary.xml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub name_short: String,
    pub name_long: String,
    pub url: String,
    pub category: ReportCategory,
}

/// A filing together with its report index, ready for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingReports {
    pub metadata: Filing,
    pub reports: Vec<Report>,
}

/// Distinct filing types present, sorted, for the listing filter row.
pub fn filing_types(filings: &[FilingReports]) -> Vec<String> {
    let mut types: Vec<String> = filings
        .iter()
        .map(|f| f.metadata.filing_type.to_string())
        .collect();
    types.sort();
    types.dedup();
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(rows: &[(&str, &str, &str)]) -> FilingBatch {
        FilingBatch {
            accession_number: rows.iter().map(|r| r.0.to_string()).collect(),
            filing_date: rows.iter().map(|r| r.1.to_string()).collect(),
            report_date: rows.iter().map(|_| String::new()).collect(),
            form: rows.iter().map(|r| r.2.to_string()).collect(),
            primary_document: rows.iter().map(|_| String::new()).collect(),
        }
    }

    #[test]
    fn extract_without_cutoff_keeps_everything() {
        let b = batch(&[
            ("0001-24-000001", "2024-05-01", "10-Q"),
            ("0001-20-000002", "2020-02-01", "10-K"),
        ]);
        let mut out = Vec::new();
        assert!(extract_filings(&b, &mut out, None));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].filing_type, FilingType::Form10Q);
        assert_eq!(out[1].filing_type, FilingType::Form10K);
    }

    #[test]
    fn cutoff_skips_old_rows_but_scans_whole_batch() {
        // Old row in the middle must not stop extraction of the newer
        // row after it.
        let b = batch(&[
            ("a", "2024-05-01", "10-Q"),
            ("b", "2019-01-01", "10-K"),
            ("c", "2024-02-01", "10-Q"),
        ]);
        let cutoff = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let mut out = Vec::new();
        let within = extract_filings(&b, &mut out, Some(cutoff));
        assert_eq!(out.len(), 2);
        // Oldest date in the batch is beyond the cutoff: stop paginating.
        assert!(!within);
    }

    #[test]
    fn cutoff_signal_true_when_batch_fully_recent() {
        let b = batch(&[("a", "2024-05-01", "10-Q")]);
        let cutoff = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let mut out = Vec::new();
        assert!(extract_filings(&b, &mut out, Some(cutoff)));
        assert_eq!(out.len(), 1);
    }

    const SUBMISSIONS_JSON: &str = r#"{
      "cik": "320193",
      "name": "Acme Inc.",
      "tickers": ["ACME"],
      "filings": {
        "recent": {
          "accessionNumber": ["0001-24-000001", "0001-23-000002"],
          "filingDate": ["2024-05-01", "2023-02-01"],
          "reportDate": ["2024-03-31", ""],
          "form": ["10-Q", "10-K"],
          "primaryDocument": ["acme-10q.htm", "acme-10k.htm"]
        },
        "files": [
          {
            "name": "CIK0000320193-submissions-001.json",
            "filingCount": 120,
            "filingFrom": "2001-01-10",
            "filingTo": "2012-12-01"
          }
        ]
      }
    }"#;

    #[test]
    fn submissions_json_deserializes_with_edgar_field_names() {
        let subs: CompanySubmissions = serde_json::from_str(SUBMISSIONS_JSON).unwrap();
        assert_eq!(subs.cik, "320193");
        assert_eq!(subs.tickers, vec!["ACME".to_string()]);
        assert_eq!(subs.filings.files.len(), 1);
        assert_eq!(subs.filings.files[0].filing_count, 120);
        assert_eq!(subs.filings.files[0].filing_from, "2001-01-10");

        let mut out = Vec::new();
        assert!(extract_filings(&subs.filings.recent, &mut out, None));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].accession_number, "0001-24-000001");
        assert_eq!(out[0].primary_document, "acme-10q.htm");
        assert_eq!(out[0].report_date, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(out[1].filing_type, FilingType::Form10K);
        // Empty reportDate strings come through as None.
        assert_eq!(out[1].report_date, None);
    }

    #[test]
    fn report_category_from_long_name() {
        assert_eq!(
            ReportCategory::parse("0000003 - Statement - CONSOLIDATED BALANCE SHEETS"),
            ReportCategory::Statement
        );
        assert_eq!(
            ReportCategory::parse("0000001 - Document - Cover Page"),
            ReportCategory::Document
        );
        assert_eq!(
            ReportCategory::parse("no separators here"),
            ReportCategory::Other(String::new())
        );
    }

    #[test]
    fn filing_type_round_trips_unknown_forms() {
        let t: FilingType = "424B5".parse().unwrap();
        assert_eq!(t, FilingType::Other("424B5".to_string()));
        assert_eq!(t.to_string(), "424B5");
    }
}
