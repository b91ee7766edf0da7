//! Demo of listing a company's filings.
//!
//! This example demonstrates how to:
//! - Resolve a ticker to its CIK
//! - List the company's 10-K filings
//! - Fetch the latest one through the cache
//!
//! Requires `DOCKET_COMPANY_NAME` and `DOCKET_ADMIN_EMAIL` to be set.
//!
//! Run with: cargo run --example filings_demo

use docket_data::Config;
use docket_data::edgar::{CikIndex, Company, FilingQuery};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(None)?;
    let downloader = config.downloader(Arc::new(config.rate_limiter()?))?;

    println!("Fetching ticker index from SEC...");
    let index = CikIndex::new(Arc::clone(&downloader));

    let ticker = "AAPL";
    let Some(company) = index.by_ticker(ticker).await? else {
        println!("Ticker {ticker} not found");
        return Ok(());
    };
    println!("\n{} ({}):", company.name, company.ticker);
    println!("  CIK: {}", company.cik);

    let filer = Company::new(company.cik, downloader);
    let annual = filer.filings(&FilingQuery::new().form("10-K")).await?;

    println!("\n10-K filings ({} total):", annual.len());
    for filing in annual.iter().take(5) {
        println!("  {} - {}", filing.report_date, filing.accession_number);
    }

    if let Some(latest) = annual.first() {
        let document = filer.primary_document(latest).await?;
        println!("\nLatest 10-K: {}", document.url);
        println!("  {} bytes, last modified {}", document.content.len(), document.last_modified);
    }

    Ok(())
}
