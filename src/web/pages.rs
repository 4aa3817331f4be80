use html_escape::{encode_double_quoted_attribute as attr, encode_text};

use crate::edgar::filing::{FilingReports, ReportCategory};
use crate::edgar::Stock;

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2em; }
table.filings { border-collapse: collapse; }
table.filings th, table.filings td { border: 1px solid #ccc; padding: 0.5em; vertical-align: top; }
ul.reports { list-style: none; margin: 0; padding: 0; }
button.report { display: block; width: 100%; text-align: left; margin: 2px 0; cursor: pointer; }
button.report.exported, td.exported { background: #e6ffe6; }
.filters label { margin-right: 1em; }
.category { margin-top: 0.5em; font-weight: bold; }
.error { color: #a00; }
"#;

// Browser-side controllers, rendered inline with the listing page.
//
// The column map is built once from data attributes, keyed by filing
// type, so filter toggles never rely on positional header/cell
// coupling. Each report button runs its own idle -> exporting ->
// exported | error machine and touches only its own element and cell;
// clicking an already-exported button is a no-op.
const SCRIPT: &str = r#"
document.addEventListener('DOMContentLoaded', function () {
  var columns = {};
  document.querySelectorAll('[data-column-type]').forEach(function (el) {
    var key = el.dataset.columnType;
    (columns[key] = columns[key] || []).push(el);
  });

  document.querySelectorAll('input.type-filter').forEach(function (box) {
    box.addEventListener('change', function () {
      (columns[box.value] || []).forEach(function (el) {
        el.style.display = box.checked ? '' : 'none';
      });
    });
  });

  document.querySelectorAll('button.report').forEach(function (button) {
    button.addEventListener('click', async function () {
      if (button.dataset.state === 'exported') {
        return;
      }
      var original = button.dataset.reportName;
      button.dataset.state = 'exporting';
      button.textContent = 'Exporting…';
      try {
        var resp = await fetch('/export', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({
            url: button.dataset.url,
            report_name: original,
            filing_date: button.dataset.filingDate,
            filing_type: button.dataset.filingType,
            ticker: button.dataset.ticker
          })
        });
        if (!resp.ok) {
          throw new Error('Export request failed: HTTP ' + resp.status);
        }
        var result = await resp.json();
        if (result.status !== 'ok') {
          throw new Error(result.message || 'Export failed');
        }
        var link = document.createElement('a');
        link.href = result.download_url + '?filename=' + encodeURIComponent(result.filename);
        link.download = result.filename;
        link.click();
        button.dataset.state = 'exported';
        button.classList.add('exported');
        var cell = button.closest('td');
        if (cell) {
          cell.classList.add('exported');
        }
        button.textContent = '✓ ' + original;
      } catch (err) {
        button.dataset.state = 'idle';
        button.textContent = 'Error - ' + original;
        alert(err.message || 'Export failed');
      }
    });
  });
});
"#;

fn page(title: &str, body: &str, with_script: bool) -> String {
    let script = if with_script {
        format!("<script>{}</script>", SCRIPT)
    } else {
        String::new()
    };
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{}</style></head><body>{}{}</body></html>",
        encode_text(title),
        STYLE,
        body,
        script
    )
}

pub fn home_page() -> String {
    let body = r#"<h1>SEC Filing Export</h1>
<form onsubmit="location.href='/filings/'+encodeURIComponent(this.ticker.value);return false;">
  <label>Ticker: <input name="ticker" placeholder="AAPL" required></label>
  <button type="submit">Show filings</button>
</form>"#;
    page("SEC Filing Export", body, false)
}

pub fn error_page(ticker: &str, error: &str) -> String {
    let body = format!(
        "<h1>Could not load filings for {}</h1><p class=\"error\">{}</p>\
         <p><a href=\"/\">Back</a></p>",
        encode_text(ticker),
        encode_text(error)
    );
    page("Error", &body, false)
}

fn report_button(filing: &FilingReports, report_url: &str, report_name: &str, ticker: &str) -> String {
    let filing_date = filing
        .metadata
        .filing_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    format!(
        "<li><button class=\"report\" data-state=\"idle\" data-url=\"{}\" \
         data-report-name=\"{}\" data-filing-date=\"{}\" data-filing-type=\"{}\" \
         data-ticker=\"{}\">{}</button></li>",
        attr(report_url),
        attr(report_name),
        attr(&filing_date),
        attr(&filing.metadata.filing_type.to_string()),
        attr(ticker),
        encode_text(report_name)
    )
}

fn filing_cell(filing: &FilingReports, ticker: &str) -> String {
    let mut out = String::new();
    for category in [
        ReportCategory::Statement,
        ReportCategory::Document,
        ReportCategory::Disclosure,
    ] {
        let mut items = String::new();
        for report in filing.reports.iter().filter(|r| r.category == category) {
            items.push_str(&report_button(filing, &report.url, &report.name_short, ticker));
        }
        if !items.is_empty() {
            out.push_str(&format!(
                "<div class=\"category\">{}</div><ul class=\"reports\">{}</ul>",
                encode_text(&category.to_string()),
                items
            ));
        }
    }
    out
}

/// Listing page: one column per filing, report buttons grouped by
/// category inside the column's cell, filing-type filters on top.
pub fn filings_page(stock: &Stock) -> String {
    let mut filters = String::new();
    for filing_type in stock.filing_types() {
        filters.push_str(&format!(
            "<label><input type=\"checkbox\" class=\"type-filter\" value=\"{}\" checked> {}</label>",
            attr(&filing_type),
            encode_text(&filing_type)
        ));
    }

    let mut headers = String::new();
    let mut cells = String::new();
    for filing in &stock.filings {
        let filing_type = filing.metadata.filing_type.to_string();
        let filing_date = filing
            .metadata
            .filing_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        headers.push_str(&format!(
            "<th data-column-type=\"{}\">{}<br>{}</th>",
            attr(&filing_type),
            encode_text(&filing_type),
            encode_text(&filing_date)
        ));
        cells.push_str(&format!(
            "<td data-column-type=\"{}\">{}</td>",
            attr(&filing_type),
            filing_cell(filing, &stock.ticker)
        ));
    }

    let body = format!(
        "<h1>Filings for {ticker}</h1>\
         <div class=\"filters\">{filters}</div>\
         <table class=\"filings\"><thead><tr>{headers}</tr></thead>\
         <tbody><tr>{cells}</tr></tbody></table>\
         <p><a href=\"/\">Back</a></p>",
        ticker = encode_text(&stock.ticker),
        filters = filters,
        headers = headers,
        cells = cells,
    );
    page(&format!("Filings for {}", stock.ticker), &body, true)
}
