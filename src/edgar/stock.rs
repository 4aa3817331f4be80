use anyhow::Result;

use super::client::EdgarClient;
use super::filing::{filing_types, FilingReports, FilingType};

/// Filings and report indexes for a single ticker.
pub struct Stock {
    pub ticker: String,
    pub cik: String,
    pub filings: Vec<FilingReports>,
}

impl Stock {
    pub fn default_forms() -> Vec<FilingType> {
        vec![FilingType::Form10K, FilingType::Form10Q]
    }

    /// Resolve the ticker's CIK, fetch its filings, keep those whose
    /// form is tracked and attach each one's report index. Filings
    /// without a usable report index are skipped, not fatal.
    pub async fn load(
        client: &EdgarClient,
        ticker: &str,
        tracked_forms: &[FilingType],
    ) -> Result<Self> {
        let ticker = ticker.trim().to_uppercase();
        log::info!("Loading stock data for ticker={}", ticker);

        let cik = client.cik_for_ticker(&ticker).await?;
        let all_filings = client.get_filings(&cik, None).await?;
        log::debug!(
            "Filtering {} total filings by forms={:?} for ticker={}",
            all_filings.len(),
            tracked_forms,
            ticker
        );

        let mut filings = Vec::new();
        let total = all_filings.len();

        for filing in all_filings {
            if !tracked_forms.contains(&filing.filing_type) {
                continue;
            }
            match client.filing_reports(&cik, &filing.accession_number).await {
                Ok(Some(reports)) => {
                    log::debug!(
                        "Added filing accn={} form={} for ticker={}",
                        filing.accession_number,
                        filing.filing_type,
                        ticker
                    );
                    filings.push(FilingReports {
                        metadata: filing,
                        reports,
                    });
                }
                Ok(None) => {
                    // Many filings aren't indexed scrapably; a missing
                    // FilingSummary is routine.
                    log::info!(
                        "Skipping filing accn={} form={} for ticker={}: no report index",
                        filing.accession_number,
                        filing.filing_type,
                        ticker
                    );
                }
                Err(e) => {
                    log::warn!(
                        "Skipping filing accn={} form={} for ticker={}: {}",
                        filing.accession_number,
                        filing.filing_type,
                        ticker,
                        e
                    );
                }
            }
        }

        log::info!(
            "Stock loaded for ticker={}: CIK={}, {}/{} filings selected",
            ticker,
            cik,
            filings.len(),
            total
        );
        Ok(Self {
            ticker,
            cik,
            filings,
        })
    }

    /// Distinct filing types present, for the listing filter row.
    pub fn filing_types(&self) -> Vec<String> {
        filing_types(&self.filings)
    }
}
