//! Per-company filing listing and primary document retrieval.

use super::DATA_SEC_URL;
use super::cik::pad_cik;
use super::dates::{DateRange, Quarter};
use super::filings::{Filing, Submissions, filings_from_submissions};
use crate::error::Result;
use crate::fetch::{Downloader, Envelope};
use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Maximum number of primary documents fetched at once by
/// [`Company::primary_documents`].
///
/// Each fetch's rate-limit wait is bounded from the moment it starts, so the
/// batch keeps only a few requests queued on the limiter at a time.
pub const DOCUMENT_CONCURRENCY: usize = 8;

/// Filters for listing filings.
///
/// Dates are `YYYY-MM-DD` strings; see [`DateRange::resolve`] for how they
/// combine with `year` and `quarter`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilingQuery {
    /// First included report date
    pub start: Option<String>,
    /// Last included report date
    pub end: Option<String>,
    /// Exact form type, e.g. "10-Q"
    pub form: Option<String>,
    /// Fiscal year
    pub year: Option<i32>,
    /// Quarter within `year`
    pub quarter: Option<Quarter>,
    /// Refetch submissions even if already loaded
    pub force: bool,
}

impl FilingQuery {
    /// Query matching every filing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one form type.
    pub fn form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    /// Restrict report dates to a year, optionally one quarter of it.
    pub const fn period(mut self, year: i32, quarter: Option<Quarter>) -> Self {
        self.year = Some(year);
        self.quarter = quarter;
        self
    }

    /// Restrict report dates to explicit bounds.
    pub fn between(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Refetch submissions.
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Resolve the date bounds of this query.
    pub fn date_range(&self) -> Result<DateRange> {
        DateRange::resolve(
            self.start.as_deref(),
            self.end.as_deref(),
            self.year,
            self.quarter,
        )
    }
}

fn matches(filing: &Filing, range: &DateRange, form: Option<&str>) -> bool {
    if form.is_some_and(|f| f != filing.form) {
        return false;
    }
    if !range.is_bounded() {
        return true;
    }
    filing.report_date().is_some_and(|d| range.contains(d))
}

/// A filer on EDGAR.
#[derive(Debug)]
pub struct Company {
    cik: String,
    downloader: Arc<dyn Downloader>,
    filings: Mutex<Option<Arc<Vec<Filing>>>>,
}

impl Company {
    /// Create a company handle; `cik` is zero-padded to 10 digits.
    pub fn new(cik: impl std::fmt::Display, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            cik: pad_cik(cik),
            downloader,
            filings: Mutex::new(None),
        }
    }

    /// Padded CIK.
    pub fn cik(&self) -> &str {
        &self.cik
    }

    /// URL of this company's submissions document.
    pub fn submissions_url(&self) -> String {
        format!("{DATA_SEC_URL}/submissions/CIK{}.json", self.cik)
    }

    /// List filings matching `query`, newest first as EDGAR orders them.
    ///
    /// Submissions are fetched once per handle unless `query.force` is set.
    /// With any date bound in effect, filings without a parseable report
    /// date are left out.
    pub async fn filings(&self, query: &FilingQuery) -> Result<Vec<Filing>> {
        let range = query.date_range()?;
        let all = self.submissions(query.force).await?;

        if !range.is_bounded() && query.form.is_none() {
            return Ok(all.to_vec());
        }

        Ok(all
            .iter()
            .filter(|f| matches(f, &range, query.form.as_deref()))
            .cloned()
            .collect())
    }

    /// Download the primary document of every filing matching `query`.
    ///
    /// At most [`DOCUMENT_CONCURRENCY`] downloads are in flight; results come
    /// back in filing order. Any failure fails the whole batch.
    pub async fn primary_documents(&self, query: &FilingQuery) -> Result<Vec<Envelope>> {
        let filings = self.filings(query).await?;
        stream::iter(&filings)
            .map(|f| self.primary_document(f))
            .buffered(DOCUMENT_CONCURRENCY)
            .try_collect()
            .await
    }

    /// Download one filing's primary document.
    pub async fn primary_document(&self, filing: &Filing) -> Result<Envelope> {
        self.downloader.fetch(&filing.primary_document_url()).await
    }

    async fn submissions(&self, force: bool) -> Result<Arc<Vec<Filing>>> {
        let mut filings = self.filings.lock().await;

        if !force && let Some(loaded) = filings.as_ref() {
            return Ok(Arc::clone(loaded));
        }

        let envelope = self.downloader.fetch(&self.submissions_url()).await?;
        let submissions: Submissions = envelope.json()?;
        let loaded = Arc::new(filings_from_submissions(&self.cik, &submissions));
        tracing::debug!(cik = %self.cik, filings = loaded.len(), "loaded submissions");

        *filings = Some(Arc::clone(&loaded));
        Ok(loaded)
    }
}
