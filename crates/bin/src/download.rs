//! Saving primary documents to disk.

use docket_data::DataError;
use docket_data::edgar::{Company, DOCUMENT_CONCURRENCY, Filing};
use futures::{StreamExt, TryStreamExt, stream};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while downloading documents.
#[derive(Debug, Error)]
pub(crate) enum DownloadError {
    /// Fetching a document failed.
    #[error("{accession}: {source}")]
    Fetch {
        /// Accession number of the failed filing.
        accession: String,
        /// Underlying error.
        source: DataError,
    },

    /// Writing a document failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Target path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Where a filing's primary document is stored under `out`.
///
/// The accession directory keeps only digits and dashes and the document
/// keeps only its file name, so the path never leaves `out`.
pub(crate) fn document_path(out: &Path, filing: &Filing) -> PathBuf {
    let accession: String = filing
        .accession_number
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    let accession = if accession.is_empty() {
        "unknown".to_string()
    } else {
        accession
    };
    let name = Path::new(&filing.primary_document)
        .file_name()
        .map_or_else(|| "document".into(), |n| n.to_os_string());
    out.join(accession).join(name)
}

/// Download the primary document of each filing into `out`.
///
/// Stops at the first failure; documents already written stay on disk.
pub(crate) async fn download_documents(
    company: &Company,
    filings: &[Filing],
    out: &Path,
    progress: Option<&ProgressBar>,
) -> Result<Vec<PathBuf>, DownloadError> {
    stream::iter(filings)
        .map(|filing| async move {
            let envelope =
                company
                    .primary_document(filing)
                    .await
                    .map_err(|source| DownloadError::Fetch {
                        accession: filing.accession_number.clone(),
                        source,
                    })?;

            let path = document_path(out, filing);
            write_document(&path, &envelope.content).await?;
            tracing::debug!(url = %envelope.url, path = %path.display(), "saved document");

            if let Some(pb) = progress {
                pb.inc(1);
            }
            Ok(path)
        })
        .buffer_unordered(DOCUMENT_CONCURRENCY)
        .try_collect()
        .await
}

async fn write_document(path: &Path, content: &str) -> Result<(), DownloadError> {
    let write = async {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await
    };
    write.await.map_err(|source| DownloadError::Write {
        path: path.to_path_buf(),
        source,
    })
}
