//! Submissions payload and the filing records derived from it.
//!
//! `data.sec.gov/submissions/CIK##########.json` lists a company's recent
//! filings as parallel arrays where index `i` of every array describes the
//! same filing. [`filings_from_submissions`] turns those columns into one
//! [`Filing`] per accession number.

use super::dates::DATE_FORMAT;
use super::SEC_URL;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Company submissions document from the EDGAR submissions API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Submissions {
    /// Central Index Key as returned by the API (unpadded)
    pub cik: String,
    /// Company name
    pub name: String,
    /// Exchange tickers
    pub tickers: Vec<String>,
    /// Filing history
    pub filings: FilingHistory,
}

/// Container for filing history data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilingHistory {
    /// Most recent filings, column oriented
    pub recent: RecentFilings,
    /// Older filings paged out into separate documents
    pub files: Vec<FilingFile>,
}

/// Pointer to a paged-out block of older filings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilingFile {
    /// Document name under `submissions/`
    pub name: String,
    /// Number of filings in the document
    pub filing_count: u64,
    /// Earliest filing date
    pub filing_from: String,
    /// Latest filing date
    pub filing_to: String,
}

/// Recent filings as parallel arrays.
///
/// Any column may be shorter than `accession_number`; missing cells read as
/// empty values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecentFilings {
    /// Accession numbers (unique filing identifiers)
    pub accession_number: Vec<String>,
    /// Filing dates in YYYY-MM-DD format
    pub filing_date: Vec<String>,
    /// Period-of-report dates in YYYY-MM-DD format, empty when not applicable
    pub report_date: Vec<String>,
    /// Acceptance timestamps
    pub acceptance_date_time: Vec<String>,
    /// Securities act
    pub act: Vec<String>,
    /// Form types (e.g., "10-K", "10-Q", "8-K")
    pub form: Vec<String>,
    /// SEC file numbers
    pub file_number: Vec<String>,
    /// Film numbers
    pub film_number: Vec<String>,
    /// 8-K item codes
    pub items: Vec<String>,
    /// Core form type
    #[serde(rename = "core_type")]
    pub core_type: Vec<String>,
    /// Filing sizes in bytes
    pub size: Vec<u64>,
    /// XBRL flags (0 or 1)
    #[serde(rename = "isXBRL")]
    pub is_xbrl: Vec<u8>,
    /// Inline XBRL flags (0 or 1)
    #[serde(rename = "isInlineXBRL")]
    pub is_inline_xbrl: Vec<u8>,
    /// Primary document filenames
    pub primary_document: Vec<String>,
    /// Primary document descriptions
    pub primary_doc_description: Vec<String>,
}

impl RecentFilings {
    /// Number of filings, one per accession number.
    pub const fn len(&self) -> usize {
        self.accession_number.len()
    }

    /// Whether there are no filings.
    pub const fn is_empty(&self) -> bool {
        self.accession_number.is_empty()
    }
}

/// A single filing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    /// Company CIK, zero-padded to 10 digits
    pub cik: String,
    /// Accession number (unique filing identifier)
    pub accession_number: String,
    /// Filing date
    pub filing_date: String,
    /// Period-of-report date, possibly empty
    pub report_date: String,
    /// Acceptance timestamp
    pub acceptance_date_time: String,
    /// Securities act
    pub act: String,
    /// Form type
    pub form: String,
    /// SEC file number
    pub file_number: String,
    /// Film number
    pub film_number: String,
    /// 8-K item codes
    pub items: String,
    /// Core form type
    pub core_type: String,
    /// Size in bytes
    pub size: u64,
    /// Whether the filing carries XBRL
    pub is_xbrl: bool,
    /// Whether the filing carries inline XBRL
    pub is_inline_xbrl: bool,
    /// Primary document filename
    pub primary_document: String,
    /// Primary document description
    pub primary_doc_description: String,
}

impl Filing {
    /// Report date, if present and well formed.
    pub fn report_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.report_date, DATE_FORMAT).ok()
    }

    /// Filing date, if well formed.
    pub fn filing_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.filing_date, DATE_FORMAT).ok()
    }

    /// Get the URL to the primary document for this filing.
    ///
    /// # Example
    /// ```
    /// # use docket_data::edgar::Filing;
    /// let filing = Filing {
    ///     cik: "0000320193".to_string(),
    ///     accession_number: "0000320193-23-000077".to_string(),
    ///     primary_document: "aapl-20230930.htm".to_string(),
    ///     ..Default::default()
    /// };
    /// assert_eq!(
    ///     filing.primary_document_url(),
    ///     "https://www.sec.gov/Archives/edgar/data/320193/000032019323000077/aapl-20230930.htm"
    /// );
    /// ```
    pub fn primary_document_url(&self) -> String {
        let cik = self.cik.trim_start_matches('0');
        let cik = if cik.is_empty() { "0" } else { cik };
        let accession_no_dashes = self.accession_number.replace('-', "");

        format!(
            "{SEC_URL}/Archives/edgar/data/{cik}/{accession_no_dashes}/{}",
            self.primary_document
        )
    }
}

/// Flatten the `recent` columns of `submissions` into filing records.
///
/// Yields exactly one record per accession number. `cik` is stored on every
/// record as given.
pub fn filings_from_submissions(cik: &str, submissions: &Submissions) -> Vec<Filing> {
    let recent = &submissions.filings.recent;

    (0..recent.len())
        .map(|i| Filing {
            cik: cik.to_string(),
            accession_number: text(&recent.accession_number, i),
            filing_date: text(&recent.filing_date, i),
            report_date: text(&recent.report_date, i),
            acceptance_date_time: text(&recent.acceptance_date_time, i),
            act: text(&recent.act, i),
            form: text(&recent.form, i),
            file_number: text(&recent.file_number, i),
            film_number: text(&recent.film_number, i),
            items: text(&recent.items, i),
            core_type: text(&recent.core_type, i),
            size: recent.size.get(i).copied().unwrap_or_default(),
            is_xbrl: recent.is_xbrl.get(i).is_some_and(|&flag| flag != 0),
            is_inline_xbrl: recent.is_inline_xbrl.get(i).is_some_and(|&flag| flag != 0),
            primary_document: text(&recent.primary_document, i),
            primary_doc_description: text(&recent.primary_doc_description, i),
        })
        .collect()
}

fn text(column: &[String], idx: usize) -> String {
    column.get(idx).cloned().unwrap_or_default()
}
