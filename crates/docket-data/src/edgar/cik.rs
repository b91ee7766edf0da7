//! Ticker to CIK resolution.
//!
//! CIK (Central Index Key) is the identifier the SEC assigns to every
//! EDGAR filer. The mapping comes from `company_tickers_exchange.json`,
//! which is column-described rows:
//!
//! ```json
//! {"fields": ["cik", "name", "ticker", "exchange"],
//!  "data": [[320193, "Apple Inc.", "AAPL", "Nasdaq"]]}
//! ```

use super::COMPANY_TICKERS_EXCHANGE_URL;
use crate::error::{DataError, Result};
use crate::fetch::Downloader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Pad CIK to 10 digits as required by SEC.
///
/// # Example
/// ```
/// # use docket_data::edgar::pad_cik;
/// assert_eq!(pad_cik("320193"), "0000320193");
/// assert_eq!(pad_cik(320193), "0000320193");
/// ```
pub fn pad_cik(cik: impl std::fmt::Display) -> String {
    format!("{cik:0>10}")
}

/// One listed company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyTicker {
    /// Central Index Key
    pub cik: u64,
    /// Registrant name
    pub name: String,
    /// Ticker symbol
    pub ticker: String,
    /// Listing exchange, if any
    pub exchange: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TickersExchangeJson {
    data: Vec<(u64, String, String, Option<String>)>,
}

/// Parsed ticker table with lookups by CIK and by ticker.
#[derive(Debug, Clone, Default)]
pub struct TickerTable {
    list: Vec<CompanyTicker>,
    by_cik: HashMap<u64, usize>,
    by_ticker: HashMap<String, usize>,
}

impl TickerTable {
    /// Parse the `company_tickers_exchange.json` body.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: TickersExchangeJson = serde_json::from_str(content)?;
        Ok(raw
            .data
            .into_iter()
            .map(|(cik, name, ticker, exchange)| CompanyTicker {
                cik,
                name,
                ticker,
                exchange,
            })
            .collect())
    }

    /// Look up by ticker symbol (case-insensitive).
    pub fn by_ticker(&self, ticker: &str) -> Option<&CompanyTicker> {
        self.by_ticker
            .get(&ticker.to_uppercase())
            .map(|&idx| &self.list[idx])
    }

    /// Look up by CIK.
    pub fn by_cik(&self, cik: u64) -> Option<&CompanyTicker> {
        self.by_cik.get(&cik).map(|&idx| &self.list[idx])
    }

    /// All rows in file order.
    pub fn all(&self) -> &[CompanyTicker] {
        &self.list
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether the table has no rows.
    pub const fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl FromIterator<CompanyTicker> for TickerTable {
    fn from_iter<I: IntoIterator<Item = CompanyTicker>>(iter: I) -> Self {
        let mut table = Self::default();
        for company in iter {
            let idx = table.list.len();
            // A CIK listed under several tickers resolves to its last row.
            table.by_cik.insert(company.cik, idx);
            table.by_ticker.insert(company.ticker.to_uppercase(), idx);
            table.list.push(company);
        }
        table
    }
}

fn check_ticker(ticker: &str) -> Result<&str> {
    let ticker = ticker.trim();
    if ticker.is_empty() || ticker.contains(char::is_whitespace) {
        return Err(DataError::InvalidSymbol(ticker.to_string()));
    }
    Ok(ticker)
}

#[derive(Debug)]
struct Indexed {
    last_modified: String,
    table: Arc<TickerTable>,
}

/// Ticker index backed by a [`Downloader`].
///
/// Every lookup revalidates the ticker file through the downloader. The
/// parsed table is kept in memory and rebuilt only when the envelope's
/// `last_modified` is empty or differs from the one it was built from.
#[derive(Debug)]
pub struct CikIndex {
    downloader: Arc<dyn Downloader>,
    state: Mutex<Option<Indexed>>,
}

impl CikIndex {
    /// Create an index reading through `downloader`.
    pub fn new(downloader: Arc<dyn Downloader>) -> Self {
        Self {
            downloader,
            state: Mutex::new(None),
        }
    }

    /// Current ticker table.
    ///
    /// The fetch runs without holding the index lock; the lock only guards
    /// the token comparison and the swap.
    pub async fn table(&self) -> Result<Arc<TickerTable>> {
        let envelope = self.downloader.fetch(COMPANY_TICKERS_EXCHANGE_URL).await?;

        if !envelope.last_modified.is_empty() {
            let state = self.state.lock().await;
            if let Some(indexed) = state.as_ref()
                && indexed.last_modified == envelope.last_modified
            {
                return Ok(Arc::clone(&indexed.table));
            }
        }

        let table = Arc::new(TickerTable::from_json(&envelope.content)?);
        tracing::debug!(
            companies = table.len(),
            last_modified = %envelope.last_modified,
            "rebuilt ticker index"
        );
        *self.state.lock().await = Some(Indexed {
            last_modified: envelope.last_modified,
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    /// Look up a company by ticker symbol (case-insensitive).
    ///
    /// # Errors
    /// [`DataError::InvalidSymbol`] for a blank ticker or one containing
    /// whitespace, before anything is fetched.
    pub async fn by_ticker(&self, ticker: &str) -> Result<Option<CompanyTicker>> {
        let ticker = check_ticker(ticker)?;
        Ok(self.table().await?.by_ticker(ticker).cloned())
    }

    /// Look up a CIK by ticker symbol (case-insensitive).
    pub async fn cik_by_ticker(&self, ticker: &str) -> Result<Option<u64>> {
        Ok(self.by_ticker(ticker).await?.map(|c| c.cik))
    }

    /// Look up a company by CIK.
    pub async fn by_cik(&self, cik: u64) -> Result<Option<CompanyTicker>> {
        Ok(self.table().await?.by_cik(cik).cloned())
    }

    /// All listed companies.
    pub async fn all(&self) -> Result<Vec<CompanyTicker>> {
        Ok(self.table().await?.all().to_vec())
    }
}
