pub mod table;

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::edgar::filing::ReportCategory;
use crate::edgar::EdgarClient;
use self::table::{extract_tables, extract_text_blocks, is_xbrl_table, Table};

/// Everything needed to export one report table: the report document's
/// URL plus the labels the output filename is derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub url: String,
    pub report_name: String,
    pub filing_date: String,
    pub filing_type: String,
    pub ticker: String,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Could not fetch report: {0}")]
    RemoteFetch(String),
    #[error("No exportable tables in report: {0}")]
    Extraction(String),
    #[error("Could not write spreadsheet: {0}")]
    Conversion(String),
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub filename: String,
    pub path: PathBuf,
}

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

fn safe_component(s: &str) -> String {
    let s = s.trim().replace(' ', "_").replace('/', "-");
    UNSAFE_CHARS.replace_all(&s, "").into_owned()
}

/// Stable output filename, derivable from the request fields alone:
/// `{TICKER}_{report name}_{filing date}_{filing type}.xlsx` with
/// spaces as underscores and slashes as dashes.
pub fn output_filename(request: &ExportRequest) -> String {
    format!(
        "{}_{}_{}_{}.xlsx",
        safe_component(&request.ticker.to_uppercase()),
        safe_component(&request.report_name),
        safe_component(&request.filing_date),
        safe_component(&request.filing_type),
    )
}

// Sheet names may not contain []:*?/\ and are capped at 31 chars.
static SHEET_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[\]:*?/\\]").unwrap());

fn sheet_name(name: &str) -> String {
    let cleaned = SHEET_UNSAFE.replace_all(name, "_");
    cleaned.chars().take(31).collect()
}

/// Convert a report's HTML into an xlsx workbook on disk: one sheet per
/// data table, plus a Text_Content sheet for non-statement reports.
/// Returns the number of table sheets written.
pub fn write_workbook(
    html: &str,
    path: &Path,
    category: &ReportCategory,
) -> Result<usize, ExportError> {
    let mut tables: Vec<(String, Table)> = extract_tables(html);

    let before = tables.len();
    tables.retain(|(_, t)| !is_xbrl_table(t));
    log::debug!(
        "Removed {} XBRL table(s), {} table(s) remaining",
        before - tables.len(),
        tables.len()
    );

    let include_text = *category != ReportCategory::Statement;
    if tables.is_empty() && !include_text {
        return Err(ExportError::Extraction(
            "document contains no data tables".to_string(),
        ));
    }

    let mut workbook = Workbook::new();
    let conversion = |e: rust_xlsxwriter::XlsxError| ExportError::Conversion(e.to_string());

    for (name, table) in &tables {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(name)).map_err(conversion)?;
        for (r, row) in table.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                worksheet
                    .write_string(r as u32, c as u16, cell)
                    .map_err(conversion)?;
            }
        }
    }

    if include_text {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Text_Content").map_err(conversion)?;
        worksheet.write_string(0, 0, "Tag").map_err(conversion)?;
        worksheet.write_string(0, 1, "Text").map_err(conversion)?;
        for (r, (tag, text)) in extract_text_blocks(html).iter().enumerate() {
            let row = (r + 1) as u32;
            worksheet.write_string(row, 0, tag).map_err(conversion)?;
            worksheet.write_string(row, 1, text).map_err(conversion)?;
        }
    }

    workbook.save(path).map_err(conversion)?;
    Ok(tables.len())
}

/// Fetch the report document and export it as a spreadsheet under
/// `export_dir`. Each invocation is independent: distinct requests
/// write distinct files and share nothing but the rate-limited client.
pub async fn export_report(
    client: &EdgarClient,
    request: &ExportRequest,
    export_dir: &Path,
    category: &ReportCategory,
) -> Result<ExportOutcome, ExportError> {
    log::info!(
        "Exporting url={} for ticker={} report={:?}",
        request.url,
        request.ticker,
        request.report_name
    );

    let url = url::Url::parse(&request.url)
        .map_err(|e| ExportError::RemoteFetch(format!("invalid URL {}: {}", request.url, e)))?;

    let html = client
        .get_text(url.as_str())
        .await
        .map_err(|e| ExportError::RemoteFetch(e.to_string()))?;

    std::fs::create_dir_all(export_dir)
        .map_err(|e| ExportError::Conversion(e.to_string()))?;

    let filename = output_filename(request);
    let path = export_dir.join(&filename);
    let sheets = write_workbook(&html, &path, category)?;

    log::info!("Export complete: {} sheet(s) written to {:?}", sheets, path);
    Ok(ExportOutcome { filename, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ExportRequest {
        ExportRequest {
            url: "https://example.com/filing123.htm".to_string(),
            report_name: "Balance Sheet".to_string(),
            filing_date: "2024-01-01".to_string(),
            filing_type: "10-K".to_string(),
            ticker: "acme".to_string(),
        }
    }

    #[test]
    fn filename_is_stable_and_derivable() {
        assert_eq!(output_filename(&request()), "ACME_Balance_Sheet_2024-01-01_10-K.xlsx");
    }

    #[test]
    fn filename_strips_path_and_shell_characters() {
        let mut req = request();
        req.report_name = "Income/Loss <Q1>".to_string();
        let name = output_filename(&req);
        assert_eq!(name, "ACME_Income-Loss_Q1_2024-01-01_10-K.xlsx");
        assert!(!name.contains('/'));
    }

    #[test]
    fn sheet_names_are_sanitized_and_capped() {
        assert_eq!(sheet_name("Table_1"), "Table_1");
        assert_eq!(sheet_name("a/b[c]"), "a_b_c_");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
    }
}
