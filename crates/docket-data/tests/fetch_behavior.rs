//! Integration tests for the cache-aware fetch layer against a simulated origin.

use async_trait::async_trait;
use docket_data::DataError;
use docket_data::cache::FileCache;
use docket_data::edgar::{Company, FilingQuery};
use docket_data::fetch::{
    CachingFetcher, Downloader, Fetcher, HttpRequest, HttpResponse, RateLimiter, Transport,
    TransportError,
};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const SUBMISSIONS_URL: &str = "https://data.sec.gov/submissions/CIK0000320193.json";
const MONDAY: &str = "Mon, 06 Jan 2025 10:00:00 GMT";
const TUESDAY: &str = "Tue, 07 Jan 2025 10:00:00 GMT";

/// Origin honoring `If-Modified-Since` by exact token comparison.
#[derive(Debug)]
struct Origin {
    state: Mutex<OriginState>,
}

#[derive(Debug)]
struct OriginState {
    body: String,
    last_modified: Option<String>,
    requests: Vec<(Instant, HttpRequest)>,
}

impl Origin {
    fn new(body: &str, last_modified: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(OriginState {
                body: body.to_string(),
                last_modified: last_modified.map(str::to_string),
                requests: Vec::new(),
            }),
        })
    }

    fn publish(&self, body: &str, last_modified: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        state.body = body.to_string();
        state.last_modified = last_modified.map(str::to_string);
    }

    fn requests(&self) -> Vec<HttpRequest> {
        let state = self.state.lock().unwrap();
        state.requests.iter().map(|(_, r)| r.clone()).collect()
    }

    fn request_times(&self) -> Vec<Instant> {
        let state = self.state.lock().unwrap();
        state.requests.iter().map(|(t, _)| *t).collect()
    }
}

#[async_trait]
impl Transport for Origin {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push((Instant::now(), request.clone()));

        let unchanged = request.if_modified_since.is_some()
            && request.if_modified_since == state.last_modified;

        if unchanged {
            return Ok(HttpResponse {
                status: 304,
                body: String::new(),
                last_modified: state.last_modified.clone(),
                content_type: None,
            });
        }

        Ok(HttpResponse {
            status: 200,
            body: state.body.clone(),
            last_modified: state.last_modified.clone(),
            content_type: Some("application/json".to_string()),
        })
    }
}

fn caching(origin: &Arc<Origin>, root: &std::path::Path) -> CachingFetcher {
    let limiter = Arc::new(RateLimiter::per_second(NonZeroU32::new(50).unwrap()));
    let fetcher = Fetcher::new(Arc::clone(origin) as Arc<dyn Transport>, limiter);
    CachingFetcher::new(fetcher, FileCache::new(root))
}

#[tokio::test]
async fn test_cache_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::new(r#"{"cik":"320193"}"#, Some(MONDAY));
    let downloader = caching(&origin, dir.path());

    let fetched = downloader.fetch(SUBMISSIONS_URL).await.unwrap();
    let stored = downloader.cache().read(SUBMISSIONS_URL).await.unwrap();

    assert_eq!(stored, fetched);
    assert_eq!(stored.status_code, 200);
    assert_eq!(stored.last_modified, MONDAY);
    assert_eq!(stored.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_populate_then_not_modified() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::new(r#"{"cik":"320193","name":"Apple Inc."}"#, Some(MONDAY));
    let downloader = caching(&origin, dir.path());

    let first = downloader.fetch(SUBMISSIONS_URL).await.unwrap();
    let entry = dir.path().join("submissions").join("CIK0000320193.json");
    assert!(entry.is_file());
    let on_disk = std::fs::read_to_string(&entry).unwrap();

    let second = downloader.fetch(SUBMISSIONS_URL).await.unwrap();

    let requests = origin.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].if_modified_since, None);
    assert_eq!(requests[1].if_modified_since.as_deref(), Some(MONDAY));

    // The 304 is invisible to the caller: cached status and body come back.
    assert_eq!(second, first);
    assert_eq!(second.status_code, 200);
    assert_eq!(std::fs::read_to_string(&entry).unwrap(), on_disk);
}

#[tokio::test]
async fn test_changed_resource_replaces_entry() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::new("v1", Some(MONDAY));
    let downloader = caching(&origin, dir.path());

    downloader.fetch(SUBMISSIONS_URL).await.unwrap();
    origin.publish("v2", Some(TUESDAY));

    let fresh = downloader.fetch(SUBMISSIONS_URL).await.unwrap();
    let stored = downloader.cache().read(SUBMISSIONS_URL).await.unwrap();

    assert_eq!(fresh.content, "v2");
    assert_eq!(stored.content, "v2");
    assert_eq!(stored.last_modified, TUESDAY);
}

#[tokio::test]
async fn test_never_cache_without_last_modified() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::new("volatile", None);
    let downloader = caching(&origin, dir.path());

    let first = downloader.fetch(SUBMISSIONS_URL).await.unwrap();
    downloader.fetch(SUBMISSIONS_URL).await.unwrap();

    assert_eq!(first.content, "volatile");
    assert_eq!(first.last_modified, "");
    assert!(!dir.path().join("submissions").join("CIK0000320193.json").exists());
    assert!(origin.requests().iter().all(|r| r.if_modified_since.is_none()));
}

#[tokio::test]
async fn test_fresh_response_without_token_keeps_old_entry() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::new("v1", Some(MONDAY));
    let downloader = caching(&origin, dir.path());

    downloader.fetch(SUBMISSIONS_URL).await.unwrap();
    origin.publish("v2", None);

    let fresh = downloader.fetch(SUBMISSIONS_URL).await.unwrap();
    let stored = downloader.cache().read(SUBMISSIONS_URL).await.unwrap();

    assert_eq!(fresh.content, "v2");
    assert_eq!(stored.content, "v1");
}

#[tokio::test]
async fn test_corrupt_entry_means_unconditional_request() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::new(r#"{"cik":"320193"}"#, Some(MONDAY));
    let downloader = caching(&origin, dir.path());

    let entry = downloader.cache().path_for(SUBMISSIONS_URL).unwrap();
    std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
    std::fs::write(&entry, "{ not json").unwrap();

    let envelope = downloader.fetch(SUBMISSIONS_URL).await.unwrap();

    assert_eq!(envelope.content, r#"{"cik":"320193"}"#);
    assert_eq!(origin.requests()[0].if_modified_since, None);
    assert_eq!(
        downloader.cache().read(SUBMISSIONS_URL).await.unwrap(),
        envelope
    );
}

#[tokio::test]
async fn test_pass_through_fetcher_leaves_cache_alone() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::new("v1", Some(MONDAY));
    caching(&origin, dir.path()).fetch(SUBMISSIONS_URL).await.unwrap();
    origin.publish("v2", Some(TUESDAY));

    let limiter = Arc::new(RateLimiter::per_second(NonZeroU32::new(50).unwrap()));
    let fetcher = Fetcher::new(Arc::clone(&origin) as Arc<dyn Transport>, limiter);
    let fresh = fetcher.fetch(SUBMISSIONS_URL).await.unwrap();
    fetcher.fetch(SUBMISSIONS_URL).await.unwrap();

    // A cached entry exists, yet the pass-through fetcher neither revalidates
    // against it nor replaces it.
    assert_eq!(fresh.content, "v2");
    assert!(origin.requests()[1..].iter().all(|r| r.if_modified_since.is_none()));
    let stored = FileCache::new(dir.path()).read(SUBMISSIONS_URL).await.unwrap();
    assert_eq!(stored.content, "v1");
    assert_eq!(stored.last_modified, MONDAY);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_fetches_respect_rate_ceiling() {
    const LIMIT: usize = 5;
    const REQUESTS: usize = 23;

    let origin = Origin::new("{}", None);
    let limiter = Arc::new(RateLimiter::per_second(NonZeroU32::new(LIMIT as u32).unwrap()));
    let fetcher = Arc::new(Fetcher::new(
        Arc::clone(&origin) as Arc<dyn Transport>,
        limiter,
    ));

    let started = Instant::now();
    let tasks: Vec<_> = (0..REQUESTS)
        .map(|i| {
            let fetcher = Arc::clone(&fetcher);
            tokio::spawn(async move {
                fetcher
                    .fetch(&format!("https://www.sec.gov/Archives/doc-{i}.htm"))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut times = origin.request_times();
    times.sort();
    assert_eq!(times.len(), REQUESTS);

    for (i, &t) in times.iter().enumerate() {
        let in_window = times[i..]
            .iter()
            .take_while(|&&u| u.duration_since(t) < Duration::from_secs(1))
            .count();
        assert!(in_window <= LIMIT, "{in_window} requests within one second");
    }

    // 23 requests at 5/s need four full waits.
    assert!(started.elapsed() >= Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_wait_is_bounded() {
    let origin = Origin::new("{}", None);
    let limiter = Arc::new(
        RateLimiter::per_second(NonZeroU32::new(1).unwrap()).with_max_delay(Duration::from_millis(500)),
    );
    let fetcher = Fetcher::new(Arc::clone(&origin) as Arc<dyn Transport>, limiter);

    fetcher.fetch(SUBMISSIONS_URL).await.unwrap();
    let result = fetcher.fetch(SUBMISSIONS_URL).await;

    assert!(matches!(result, Err(DataError::RateLimitExceeded { .. })));
    assert_eq!(origin.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_large_document_batch_waits_instead_of_failing() {
    // More documents than the default limiter admits within its wait bound.
    const FILINGS: usize = 400;

    let accessions: Vec<String> = (0..FILINGS)
        .map(|i| format!("0000320193-24-{i:06}"))
        .collect();
    let submissions = serde_json::json!({
        "cik": "320193",
        "filings": {"recent": {
            "accessionNumber": accessions,
            "reportDate": vec![""; FILINGS],
            "form": vec!["4"; FILINGS],
            "primaryDocument": vec!["form4.xml"; FILINGS],
        }}
    });
    let origin = Origin::new(&submissions.to_string(), None);
    let fetcher = Fetcher::new(
        Arc::clone(&origin) as Arc<dyn Transport>,
        Arc::new(RateLimiter::default()),
    );
    let company = Company::new(320193, Arc::new(fetcher));

    let documents = company
        .primary_documents(&FilingQuery::new().form("4"))
        .await
        .unwrap();

    assert_eq!(documents.len(), FILINGS);
    assert!(documents[0].url.contains("/000032019324000000/"));
    assert!(documents[FILINGS - 1].url.contains("/000032019324000399/"));
    assert_eq!(origin.requests().len(), FILINGS + 1);
}
