//! Rendering of lookup and filing results as text, JSON or CSV.

use clap::ValueEnum;
use docket_data::edgar::{CompanyTicker, Filing};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while rendering output.
#[derive(Debug, Error)]
pub(crate) enum OutputError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer could not be flushed into a string.
    #[error("CSV output error: {0}")]
    Buffer(String),
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Aligned plain-text table.
    #[default]
    Text,

    /// Pretty-printed JSON.
    Json,

    /// Comma-separated values with a header row.
    Csv,
}

/// One line of the filing listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct FilingRow<'a> {
    form: &'a str,
    report_date: &'a str,
    filing_date: &'a str,
    accession_number: &'a str,
    primary_document: &'a str,
    url: String,
}

impl<'a> From<&'a Filing> for FilingRow<'a> {
    fn from(filing: &'a Filing) -> Self {
        Self {
            form: &filing.form,
            report_date: &filing.report_date,
            filing_date: &filing.filing_date,
            accession_number: &filing.accession_number,
            primary_document: &filing.primary_document,
            url: filing.primary_document_url(),
        }
    }
}

fn to_csv<T: Serialize>(records: impl IntoIterator<Item = T>) -> Result<String, OutputError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| OutputError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OutputError::Buffer(e.to_string()))
}

/// Render one company.
pub(crate) fn render_company(
    company: &CompanyTicker,
    format: OutputFormat,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(format!(
            "{} ({})\n  CIK:      {}\n  Exchange: {}\n",
            company.name,
            company.ticker,
            company.cik,
            company.exchange.as_deref().unwrap_or("-"),
        )),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(company)? + "\n"),
        OutputFormat::Csv => to_csv([company]),
    }
}

/// Render a filing listing.
///
/// JSON carries every field of every filing; text and CSV show the columns
/// needed to pick a document.
pub(crate) fn render_filings(
    filings: &[Filing],
    format: OutputFormat,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(filings_table(filings)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(filings)? + "\n"),
        OutputFormat::Csv => to_csv(filings.iter().map(FilingRow::from)),
    }
}

fn filings_table(filings: &[Filing]) -> String {
    let form_width = filings
        .iter()
        .map(|f| f.form.len())
        .max()
        .unwrap_or(0)
        .max("FORM".len());

    let mut out = format!(
        "{:<form_width$}  {:<10}  {:<10}  {:<20}  {}\n",
        "FORM", "REPORT", "FILED", "ACCESSION", "DOCUMENT"
    );
    for filing in filings {
        out.push_str(&format!(
            "{:<form_width$}  {:<10}  {:<10}  {:<20}  {}\n",
            filing.form,
            if filing.report_date.is_empty() { "-" } else { filing.report_date.as_str() },
            filing.filing_date,
            filing.accession_number,
            filing.primary_document,
        ));
    }
    out.push_str(&format!("\n{} filing(s)\n", filings.len()));
    out
}
