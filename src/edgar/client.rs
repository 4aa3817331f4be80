use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::RwLock;

use super::filing::{extract_filings, CompanySubmissions, Filing, FilingBatch, Report, ReportCategory};
use super::rate_limiter::RateLimiter;

pub const EDGAR_DATA_URL: &str = "https://data.sec.gov";
pub const EDGAR_ARCHIVES_URL: &str = "https://www.sec.gov/Archives/edgar/data";
const TICKER_URL: &str = "https://www.sec.gov/files/company_tickers.json";

// Ticker -> zero-padded CIK, fetched once per process.
static TICKER_TO_CIK: Lazy<RwLock<Option<Arc<HashMap<String, String>>>>> =
    Lazy::new(|| RwLock::new(None));

/// HTTP access to SEC EDGAR: CIK resolution, company submissions and
/// per-filing report indexes. One instance is shared across requests;
/// all outbound calls go through the rate limiter.
pub struct EdgarClient {
    http: Client,
    limiter: RateLimiter,
    cache_dir: Option<PathBuf>,
}

impl EdgarClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            limiter: RateLimiter::default(),
            cache_dir: None,
        })
    }

    /// Cache submissions JSON under `dir` so repeat listings don't
    /// re-download multi-megabyte files.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let _permit = self.limiter.acquire().await?;
        log::debug!("GET {}", url);
        self.http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))
    }

    /// Fetch a document body through the rate limiter, erroring on a
    /// non-success status.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.get(url).await?;
        if !resp.status().is_success() {
            return Err(anyhow!(
                "HTTP request to {} failed with status: {}",
                url,
                resp.status()
            ));
        }
        Ok(resp.text().await?)
    }

    /// Resolve a ticker to its zero-padded 10-digit CIK using the SEC's
    /// company ticker file, loaded once and cached in process.
    pub async fn cik_for_ticker(&self, ticker: &str) -> Result<String> {
        let ticker = ticker.trim().to_uppercase();

        if let Some(map) = TICKER_TO_CIK.read().await.as_ref() {
            return map
                .get(&ticker)
                .cloned()
                .ok_or_else(|| anyhow!("No CIK found for ticker: {}", ticker));
        }

        let mut write_guard = TICKER_TO_CIK.write().await;
        if write_guard.is_none() {
            let body = self.get_text(TICKER_URL).await?;
            *write_guard = Some(Arc::new(parse_ticker_map(&body)?));
        }

        write_guard
            .as_ref()
            .and_then(|map| map.get(&ticker).cloned())
            .ok_or_else(|| anyhow!("No CIK found for ticker: {}", ticker))
    }

    async fn submissions_page(&self, url: &str, cache_name: &str) -> Result<String> {
        if let Some(dir) = &self.cache_dir {
            let path = dir.join(cache_name);
            if path.exists() {
                log::debug!("Using cached submissions file {:?}", path);
                return Ok(fs::read_to_string(&path)?);
            }
            let body = self.get_text(url).await?;
            fs::create_dir_all(dir)?;
            fs::write(&path, &body)?;
            return Ok(body);
        }
        self.get_text(url).await
    }

    /// Fetch all filings for a CIK, following the paginated extra files.
    ///
    /// With a `cutoff_date`, pagination stops once an entire batch is
    /// older than the cutoff; batches are newest-first across pages, so
    /// later pages are guaranteed older still.
    pub async fn get_filings(
        &self,
        cik: &str,
        cutoff_date: Option<NaiveDate>,
    ) -> Result<Vec<Filing>> {
        let padded_cik = format!("{:0>10}", cik);
        let url = format!("{}/submissions/CIK{}.json", EDGAR_DATA_URL, padded_cik);

        log::info!("Fetching submissions for CIK={}", padded_cik);
        let body = self
            .submissions_page(&url, &format!("CIK{}_0.json", padded_cik))
            .await?;
        let submissions: CompanySubmissions = serde_json::from_str(&body)
            .map_err(|e| anyhow!("Failed to parse submissions JSON: {}", e))?;

        let mut filings = Vec::new();
        let within_cutoff =
            extract_filings(&submissions.filings.recent, &mut filings, cutoff_date);
        log::debug!(
            "Extracted {} recent filings for CIK={}",
            filings.len(),
            padded_cik
        );

        if cutoff_date.is_some() && !within_cutoff {
            log::debug!(
                "All recent filings older than cutoff for CIK={}; skipping {} extra file(s)",
                padded_cik,
                submissions.filings.files.len()
            );
            return Ok(filings);
        }

        for (i, file) in submissions.filings.files.iter().enumerate() {
            let page_url = format!("{}/submissions/{}", EDGAR_DATA_URL, file.name);
            let body = match self
                .submissions_page(&page_url, &format!("CIK{}_{}.json", padded_cik, i + 1))
                .await
            {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("Skipping extra filing file {:?}: {}", file.name, e);
                    continue;
                }
            };
            let batch: FilingBatch = serde_json::from_str(&body)
                .map_err(|e| anyhow!("Failed to parse page filings JSON: {}", e))?;
            let within = extract_filings(&batch, &mut filings, cutoff_date);
            if cutoff_date.is_some() && !within {
                log::debug!(
                    "Batch from {:?} entirely beyond cutoff; stopping pagination for CIK={}",
                    file.name,
                    padded_cik
                );
                break;
            }
        }

        log::info!(
            "Total filings fetched for CIK={}: {}",
            padded_cik,
            filings.len()
        );
        Ok(filings)
    }

    /// Fetch and parse a filing's report index from FilingSummary.xml.
    ///
    /// Returns `Ok(None)` when the filing has no summary (404), which is
    /// common for older filings that were never indexed for viewing.
    pub async fn filing_reports(&self, cik: &str, accn: &str) -> Result<Option<Vec<Report>>> {
        let cik_trimmed: u64 = cik
            .parse()
            .map_err(|_| anyhow!("Invalid CIK: {}", cik))?;
        let base_url = format!(
            "{}/{}/{}",
            EDGAR_ARCHIVES_URL,
            cik_trimmed,
            accn.replace('-', "")
        );
        let summary_url = format!("{}/FilingSummary.xml", base_url);
        log::debug!("Fetching FilingSummary for accn={} from {}", accn, summary_url);

        let resp = self.get(&summary_url).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(anyhow!(
                "FilingSummary request for accn={} failed with status: {}",
                accn,
                resp.status()
            ));
        }

        let xml = resp.text().await?;
        let reports = parse_filing_summary(&xml, &base_url)?;
        Ok(Some(reports))
    }
}

fn parse_ticker_map(body: &str) -> Result<HashMap<String, String>> {
    let json: HashMap<String, Value> = serde_json::from_str(body)?;
    log::debug!("Found {} ticker entries", json.len());

    let mut map = HashMap::with_capacity(json.len());
    for v in json.values() {
        let ticker = v["ticker"]
            .as_str()
            .ok_or_else(|| anyhow!("Ticker entry missing 'ticker' field"))?
            .trim()
            .to_uppercase();
        let cik = v["cik_str"]
            .as_u64()
            .ok_or_else(|| anyhow!("Ticker entry missing 'cik_str' field"))?;
        map.insert(ticker, format!("{:010}", cik));
    }
    Ok(map)
}

fn child_text<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name().eq_ignore_ascii_case(name))
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parse the `<MyReports>` index out of a FilingSummary.xml document.
///
/// The last `<Report>` entry is EDGAR's synthetic "All Reports" row and
/// is skipped. Entries without an Html or Xml filename are dropped.
pub fn parse_filing_summary(xml: &str, base_url: &str) -> Result<Vec<Report>> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| anyhow!("Failed to parse FilingSummary XML: {}", e))?;

    let my_reports = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name().eq_ignore_ascii_case("MyReports"));

    let my_reports = match my_reports {
        Some(node) => node,
        None => {
            log::warn!("No <MyReports> element found in FilingSummary");
            return Ok(Vec::new());
        }
    };

    let entries: Vec<_> = my_reports
        .children()
        .filter(|c| c.is_element() && c.tag_name().name().eq_ignore_ascii_case("Report"))
        .collect();

    let take = entries.len().saturating_sub(1);
    let mut reports = Vec::with_capacity(take);

    for entry in entries.into_iter().take(take) {
        let name_short = match child_text(entry, "ShortName") {
            Some(s) => s.to_string(),
            None => {
                log::warn!("Skipping report entry without ShortName");
                continue;
            }
        };
        let name_long = child_text(entry, "LongName")
            .unwrap_or(&name_short)
            .to_string();
        let filename = child_text(entry, "HtmlFileName")
            .or_else(|| child_text(entry, "XmlFileName"));
        let filename = match filename {
            Some(f) => f,
            None => {
                log::warn!("Skipping report {:?}: no Html or Xml filename", name_short);
                continue;
            }
        };

        let category = ReportCategory::parse(&name_long);
        reports.push(Report {
            name_short,
            name_long,
            url: format!("{}/{}", base_url, filename),
            category,
        });
    }

    log::debug!("Parsed {} report entries from FilingSummary", reports.len());
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<FilingSummary>
  <MyReports>
    <Report instance="acme-20240101.htm">
      <IsDefault>true</IsDefault>
      <HtmlFileName>R1.htm</HtmlFileName>
      <LongName>0000001 - Document - Cover Page</LongName>
      <ShortName>Cover Page</ShortName>
    </Report>
    <Report instance="acme-20240101.htm">
      <HtmlFileName>R2.htm</HtmlFileName>
      <LongName>0000002 - Statement - CONSOLIDATED BALANCE SHEETS</LongName>
      <ShortName>Balance Sheet</ShortName>
    </Report>
    <Report instance="acme-20240101.htm">
      <XmlFileName>R3.xml</XmlFileName>
      <LongName>0000003 - Disclosure - Commitments</LongName>
      <ShortName>Commitments</ShortName>
    </Report>
    <Report>
      <LongName>All Reports</LongName>
      <ShortName>All Reports</ShortName>
    </Report>
  </MyReports>
</FilingSummary>"#;

    #[test]
    fn parses_reports_and_skips_trailing_entry() {
        let base = "https://www.sec.gov/Archives/edgar/data/1234/000123";
        let reports = parse_filing_summary(SUMMARY, base).unwrap();
        assert_eq!(reports.len(), 3);

        assert_eq!(reports[0].name_short, "Cover Page");
        assert_eq!(reports[0].category, ReportCategory::Document);
        assert_eq!(reports[0].url, format!("{}/R1.htm", base));

        assert_eq!(reports[1].category, ReportCategory::Statement);

        // XmlFileName fallback when HtmlFileName is absent.
        assert_eq!(reports[2].url, format!("{}/R3.xml", base));
        assert_eq!(reports[2].category, ReportCategory::Disclosure);
    }

    #[test]
    fn missing_myreports_yields_empty_index() {
        let reports =
            parse_filing_summary("<FilingSummary></FilingSummary>", "https://x").unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn ticker_map_pads_ciks() {
        let body = r#"{"0":{"cik_str":320193,"ticker":"AAPL","title":"Apple Inc."}}"#;
        let map = parse_ticker_map(body).unwrap();
        assert_eq!(map.get("AAPL").map(String::as_str), Some("0000320193"));
    }
}
