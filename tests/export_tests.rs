use edgar_export::edgar::filing::ReportCategory;
use edgar_export::edgar::EdgarClient;
use edgar_export::export::{
    export_report, output_filename, write_workbook, ExportError, ExportRequest,
};
use std::fs;
use tempfile::tempdir;

const BALANCE_SHEET_HTML: &str = r#"<html><body>
<table>
  <tr><th>CONSOLIDATED BALANCE SHEETS</th><th colspan="2">Dec. 31, 2024</th></tr>
  <tr><td>Cash and cash equivalents</td><td>$</td><td>1,234</td></tr>
  <tr><td>Total assets</td><td>$</td><td>9,999</td></tr>
</table>
</body></html>"#;

const XBRL_JUNK_HTML: &str = r#"<html><body>
<table>
  <tr><td>Name:</td><td>us-gaap_CashAndCashEquivalents</td></tr>
  <tr><td>Namespace Prefix:</td><td>us-gaap_</td></tr>
  <tr><td>Data Type:</td><td>xbrli:monetaryItemType</td></tr>
  <tr><td>Balance Type:</td><td>debit</td></tr>
  <tr><td>Period Type:</td><td>instant</td></tr>
</table>
<table>
  <tr><th>Item</th><th>2024</th></tr>
  <tr><td>Revenue</td><td>500</td></tr>
</table>
</body></html>"#;

fn request() -> ExportRequest {
    ExportRequest {
        url: "https://example.com/filing123.htm".to_string(),
        report_name: "Balance Sheet".to_string(),
        filing_date: "2024-01-01".to_string(),
        filing_type: "10-K".to_string(),
        ticker: "ACME".to_string(),
    }
}

#[test]
fn statement_export_writes_a_spreadsheet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(output_filename(&request()));

    let sheets = write_workbook(BALANCE_SHEET_HTML, &path, &ReportCategory::Statement).unwrap();

    assert_eq!(sheets, 1);
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "ACME_Balance_Sheet_2024-01-01_10-K.xlsx"
    );
    let metadata = fs::metadata(&path).unwrap();
    assert!(metadata.len() > 0);
}

#[test]
fn xbrl_reference_tables_are_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.xlsx");

    let sheets = write_workbook(XBRL_JUNK_HTML, &path, &ReportCategory::Statement).unwrap();

    // Only the real revenue table survives the junk filter.
    assert_eq!(sheets, 1);
    assert!(path.exists());
}

#[test]
fn statement_without_tables_is_an_extraction_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.xlsx");

    let err = write_workbook("<html><p>prose only</p></html>", &path, &ReportCategory::Statement)
        .unwrap_err();

    assert!(matches!(err, ExportError::Extraction(_)));
    assert!(!path.exists());
}

#[test]
fn disclosure_without_tables_still_gets_text_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.xlsx");

    let sheets = write_workbook(
        "<html><h2>Commitments</h2><p>Nothing material.</p></html>",
        &path,
        &ReportCategory::Disclosure,
    )
    .unwrap();

    assert_eq!(sheets, 0);
    assert!(path.exists());
}

#[tokio::test]
async fn export_rejects_invalid_url_before_any_fetch() {
    let dir = tempdir().unwrap();
    let client = EdgarClient::new("test@example.com").unwrap();

    let mut req = request();
    req.url = "not a url".to_string();

    let err = export_report(&client, &req, dir.path(), &ReportCategory::Statement)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::RemoteFetch(_)));
    assert!(dir.path().read_dir().unwrap().next().is_none());
}

#[test]
fn distinct_requests_write_distinct_files() {
    let dir = tempdir().unwrap();

    let mut income = request();
    income.report_name = "Income Statement".to_string();

    let balance_path = dir.path().join(output_filename(&request()));
    let income_path = dir.path().join(output_filename(&income));
    assert_ne!(balance_path, income_path);

    write_workbook(BALANCE_SHEET_HTML, &balance_path, &ReportCategory::Statement).unwrap();
    write_workbook(XBRL_JUNK_HTML, &income_path, &ReportCategory::Statement).unwrap();

    assert!(balance_path.exists());
    assert!(income_path.exists());
}
