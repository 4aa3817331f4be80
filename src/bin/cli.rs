use std::path::PathBuf;

use anyhow::Result;
use edgar_export::core::config::DEFAULT_USER_AGENT;
use edgar_export::edgar::filing::ReportCategory;
use edgar_export::edgar::EdgarClient;
use edgar_export::export::{export_report, ExportRequest};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "edgar-export", about = "Export one SEC report table to xlsx")]
struct Opt {
    /// URL of the report document (an EDGAR R-file)
    #[structopt(long)]
    url: String,

    /// Ticker the report belongs to
    #[structopt(long)]
    ticker: String,

    /// Report name, e.g. "Balance Sheet"
    #[structopt(long)]
    report_name: String,

    /// Filing date, e.g. 2024-01-01
    #[structopt(long)]
    filing_date: String,

    /// Filing type, e.g. 10-K
    #[structopt(long)]
    filing_type: String,

    /// Report category: document, statement or disclosure.
    /// Non-statement exports get an extra Text_Content sheet.
    #[structopt(long, default_value = "statement")]
    category: String,

    /// Directory to write the spreadsheet into
    #[structopt(long, parse(from_os_str), default_value = "exports")]
    out_dir: PathBuf,

    /// User-Agent for outbound SEC requests (name + contact email)
    #[structopt(long)]
    user_agent: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let opt = Opt::from_args();

    let user_agent = opt
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
    let client = EdgarClient::new(&user_agent)?;
    let request = ExportRequest {
        url: opt.url,
        report_name: opt.report_name,
        filing_date: opt.filing_date,
        filing_type: opt.filing_type,
        ticker: opt.ticker,
    };
    let category = category_from_str(&opt.category);

    match export_report(&client, &request, &opt.out_dir, &category).await {
        Ok(outcome) => {
            println!("{}", outcome.path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("Export failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn category_from_str(s: &str) -> ReportCategory {
    match s.to_lowercase().as_str() {
        "document" => ReportCategory::Document,
        "statement" => ReportCategory::Statement,
        "disclosure" => ReportCategory::Disclosure,
        other => ReportCategory::Other(other.to_string()),
    }
}
