//! Ticker to primary documents through the caching downloader.

use async_trait::async_trait;
use docket_data::cache::FileCache;
use docket_data::edgar::{CikIndex, Company, FilingQuery, Quarter};
use docket_data::fetch::{
    CachingFetcher, Downloader, Fetcher, HttpRequest, HttpResponse, RateLimiter, Transport,
    TransportError,
};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

const LAST_MODIFIED: &str = "Fri, 03 Jan 2025 12:00:00 GMT";

const TICKERS: &str = r#"{
    "fields": ["cik", "name", "ticker", "exchange"],
    "data": [[320193, "Apple Inc.", "AAPL", "Nasdaq"], [789019, "MICROSOFT CORP", "MSFT", "Nasdaq"]]
}"#;

const SUBMISSIONS: &str = r#"{
    "cik": "320193",
    "name": "Apple Inc.",
    "filings": {"recent": {
        "accessionNumber": ["0000320193-24-000123", "0000320193-24-000069", "0000320193-24-000012"],
        "filingDate": ["2024-11-01", "2024-05-03", "2024-02-02"],
        "reportDate": ["2024-09-28", "2024-03-30", "2023-12-30"],
        "form": ["10-K", "10-Q", "10-Q"],
        "primaryDocument": ["aapl-20240928.htm", "aapl-20240330.htm", "aapl-20231230.htm"]
    }}
}"#;

/// Static site answering 304 whenever the client already holds the token.
#[derive(Debug)]
struct Site {
    pages: HashMap<&'static str, &'static str>,
    log: Mutex<Vec<(String, u16)>>,
}

impl Site {
    fn edgar() -> Arc<Self> {
        let pages = HashMap::from([
            ("https://www.sec.gov/files/company_tickers_exchange.json", TICKERS),
            ("https://data.sec.gov/submissions/CIK0000320193.json", SUBMISSIONS),
            (
                "https://www.sec.gov/Archives/edgar/data/320193/000032019324000069/aapl-20240330.htm",
                "<html>Q2 FY24</html>",
            ),
        ]);
        Arc::new(Self {
            pages,
            log: Mutex::default(),
        })
    }

    fn statuses(&self) -> Vec<u16> {
        self.log.lock().unwrap().iter().map(|(_, s)| *s).collect()
    }
}

#[async_trait]
impl Transport for Site {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = match self.pages.get(request.url.as_str()) {
            None => HttpResponse {
                status: 404,
                body: String::new(),
                last_modified: None,
                content_type: None,
            },
            Some(_) if request.if_modified_since.as_deref() == Some(LAST_MODIFIED) => {
                HttpResponse {
                    status: 304,
                    body: String::new(),
                    last_modified: Some(LAST_MODIFIED.to_string()),
                    content_type: None,
                }
            }
            Some(body) => HttpResponse {
                status: 200,
                body: (*body).to_string(),
                last_modified: Some(LAST_MODIFIED.to_string()),
                content_type: None,
            },
        };
        self.log
            .lock()
            .unwrap()
            .push((request.url, response.status));
        Ok(response)
    }
}

fn downloader(site: &Arc<Site>, root: &std::path::Path) -> Arc<dyn Downloader> {
    let limiter = Arc::new(RateLimiter::per_second(NonZeroU32::new(50).unwrap()));
    let fetcher = Fetcher::new(Arc::clone(site) as Arc<dyn Transport>, limiter);
    Arc::new(CachingFetcher::new(fetcher, FileCache::new(root)))
}

async fn quarterly_report(downloader: Arc<dyn Downloader>) -> Vec<String> {
    let index = CikIndex::new(Arc::clone(&downloader));
    let cik = index.cik_by_ticker("aapl").await.unwrap().unwrap();
    assert_eq!(cik, 320193);

    let company = Company::new(cik, downloader);
    let query = FilingQuery::new()
        .form("10-Q")
        .period(2024, Some(Quarter::Q1));
    company
        .primary_documents(&query)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.content)
        .collect()
}

#[tokio::test]
async fn test_ticker_to_documents() {
    let dir = tempfile::tempdir().unwrap();
    let site = Site::edgar();

    let documents = quarterly_report(downloader(&site, dir.path())).await;

    assert_eq!(documents, vec!["<html>Q2 FY24</html>".to_string()]);
    assert_eq!(site.statuses(), vec![200, 200, 200]);
    assert!(dir.path().join("files/company_tickers_exchange.json").is_file());
    assert!(
        dir.path()
            .join("Archives/edgar/data/320193/000032019324000069/aapl-20240330.htm")
            .is_file()
    );
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let site = Site::edgar();

    let first = quarterly_report(downloader(&site, dir.path())).await;
    let second = quarterly_report(downloader(&site, dir.path())).await;

    assert_eq!(second, first);
    assert_eq!(site.statuses(), vec![200, 200, 200, 304, 304, 304]);
}
