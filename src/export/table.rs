use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// A rectangular table: rows of cell text, padded to equal width.
pub type Table = Vec<Vec<String>>;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_text(el: ElementRef) -> String {
    let raw: String = el.text().collect();
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

fn cell_span(cell: ElementRef) -> usize {
    cell.value()
        .attr("colspan")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, 64)
}

/// Extract every `<table>` into a rectangular grid of cell text.
///
/// Table names follow the document position (`Table_1`, `Table_2`, ...),
/// counting tables that turn out to be empty, so names stay stable when
/// junk tables are interleaved with real ones. Colspans repeat the cell
/// value across the span, and short rows are padded on the right.
pub fn extract_tables(html: &str) -> Vec<(String, Table)> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    let mut extracted = Vec::new();

    for (idx, table_el) in document.select(&table_selector).enumerate() {
        let mut rows: Table = Vec::new();
        for row_el in table_el.select(&row_selector) {
            let mut row = Vec::new();
            for cell_el in row_el.select(&cell_selector) {
                let text = collapse_text(cell_el);
                for _ in 0..cell_span(cell_el) {
                    row.push(text.clone());
                }
            }
            if !row.is_empty() {
                rows.push(row);
            }
        }

        if rows.is_empty() || rows.iter().all(|r| r.iter().all(String::is_empty)) {
            log::debug!("Skipping empty table at index {}", idx + 1);
            continue;
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }

        extracted.push((format!("Table_{}", idx + 1), rows));
    }

    log::debug!("Extracted {} table(s) from report", extracted.len());
    extracted
}

const XBRL_FIRST_COLUMN: [&str; 5] = [
    "Name:",
    "Namespace Prefix:",
    "Data Type:",
    "Balance Type:",
    "Period Type:",
];

/// EDGAR R-files interleave element-reference tables between the real
/// statements; their first column is always the same five labels.
pub fn is_xbrl_table(table: &Table) -> bool {
    table.len() == XBRL_FIRST_COLUMN.len()
        && table
            .iter()
            .zip(XBRL_FIRST_COLUMN.iter())
            .all(|(row, expected)| row.first().map(String::as_str) == Some(expected))
}

/// Extract (tag, text) pairs from the document's heading and body
/// elements, for the Text_Content sheet of non-statement reports.
pub fn extract_text_blocks(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h1, h2, h3, h4, p, div").unwrap();

    let mut blocks = Vec::new();
    for el in document.select(&selector) {
        let text = collapse_text(el);
        if !text.is_empty() {
            blocks.push((el.value().name().to_string(), text));
        }
    }

    log::debug!("Extracted {} text block(s) from report", blocks.len());
    blocks
}
