//! SEC EDGAR collaborators built on the fetch layer.
//!
//! - [`CikIndex`]: ticker to CIK resolution
//! - [`Company`]: filing listing and primary document download
//!
//! # Example
//!
//! ```no_run
//! use docket_data::Config;
//! use docket_data::edgar::{CikIndex, Company, FilingQuery, Quarter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let downloader = config.downloader(Arc::new(config.rate_limiter()?))?;
//!
//!     let index = CikIndex::new(Arc::clone(&downloader));
//!     let cik = index.cik_by_ticker("AAPL").await?.ok_or("unknown ticker")?;
//!
//!     let company = Company::new(cik, downloader);
//!     let query = FilingQuery::new().form("10-Q").period(2024, Some(Quarter::Q1));
//!     for document in company.primary_documents(&query).await? {
//!         println!("{} ({} bytes)", document.url, document.content.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cik;
pub mod company;
pub mod dates;
pub mod filings;

pub use cik::{CikIndex, CompanyTicker, TickerTable, pad_cik};
pub use company::{Company, DOCUMENT_CONCURRENCY, FilingQuery};
pub use dates::{DateRange, Quarter};
pub use filings::{
    Filing, FilingFile, FilingHistory, RecentFilings, Submissions, filings_from_submissions,
};

/// Main SEC site, home of the archives.
pub const SEC_URL: &str = "https://www.sec.gov";

/// Structured data API host.
pub const DATA_SEC_URL: &str = "https://data.sec.gov";

/// Ticker, CIK and exchange listing.
pub const COMPANY_TICKERS_EXCHANGE_URL: &str =
    "https://www.sec.gov/files/company_tickers_exchange.json";
