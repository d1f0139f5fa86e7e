use crate::error::{Result, ScanError};
use crate::result::{ExternalLinkRecord, FailureReason, LinkFailure};
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};
use url::Url;

pub type VerifyProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Status that anti-automation front ends answer with instead of the page.
pub const CLIENT_BLOCK_STATUS: StatusCode = StatusCode::FORBIDDEN;

/// Checks that outbound links still answer.
///
/// Each record gets a HEAD probe; a 4xx/5xx answer escalates to a single GET
/// before the link is declared dead. Domains listed as trusted are treated
/// as reachable when they answer with [`CLIENT_BLOCK_STATUS`].
pub struct LinkVerifier {
    client: Client,
    concurrency: usize,
    trusted_domains: Arc<Vec<String>>,
    progress_callback: Option<VerifyProgressCallback>,
}

impl LinkVerifier {
    pub fn new() -> Result<Self> {
        Self::with_timeout(5)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            concurrency: 10,
            trusted_domains: Arc::new(Vec::new()),
            progress_callback: None,
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_trusted_domains(mut self, domains: Vec<String>) -> Self {
        let domains = domains
            .into_iter()
            .map(|d| d.trim().trim_start_matches('.').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        self.trusted_domains = Arc::new(domains);
        self
    }

    pub fn with_progress_callback(mut self, callback: VerifyProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Verifies every record and returns the failures in record order.
    ///
    /// A worker that dies is logged and skipped; failures already collected
    /// from other workers are still returned.
    pub async fn verify(&self, records: Vec<ExternalLinkRecord>) -> Vec<LinkFailure> {
        info!(
            "Verifying {} external links with {} workers",
            records.len(),
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let failures: Arc<Mutex<Vec<(usize, LinkFailure)>>> = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = Vec::with_capacity(records.len());
        for (idx, record) in records.into_iter().enumerate() {
            let client = self.client.clone();
            let semaphore = semaphore.clone();
            let failures = failures.clone();
            let trusted = self.trusted_domains.clone();
            let progress_cb = self.progress_callback.clone();

            tasks.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };

                let url = record.url.clone();
                if let Some(reason) = check_link(&client, &record.url, &trusted).await {
                    warn!("External link {} failed: {}", record.url, reason);
                    failures.lock().await.push((idx, LinkFailure { record, reason }));
                }

                if let Some(ref callback) = progress_cb {
                    callback(url);
                }
            }));
        }

        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                warn!("External link worker failed: {}", ScanError::from(e));
            }
        }

        let mut failures = std::mem::take(&mut *failures.lock().await);
        failures.sort_by_key(|(idx, _)| *idx);
        info!("External verification complete, {} failures", failures.len());

        failures.into_iter().map(|(_, failure)| failure).collect()
    }
}

/// Probes one URL, returning why it is considered dead.
async fn check_link(client: &Client, url: &str, trusted: &[String]) -> Option<FailureReason> {
    let target = match absolute_url(url) {
        Ok(target) => target,
        Err(e) => return Some(FailureReason::Network(e.to_string())),
    };

    let status = match client.head(target.as_str()).send().await {
        Ok(response) => response.status(),
        Err(e) => return Some(FailureReason::Network(e.to_string())),
    };
    debug!("HEAD {} -> {}", target, status);

    if is_reachable(status, &target, trusted) {
        return None;
    }

    // Some servers reject HEAD but serve GET; the body is never read.
    let status = match client.get(target.as_str()).send().await {
        Ok(response) => response.status(),
        Err(e) => return Some(FailureReason::Network(e.to_string())),
    };
    debug!("GET {} -> {}", target, status);

    if is_reachable(status, &target, trusted) {
        None
    } else {
        Some(FailureReason::Status(status.as_u16()))
    }
}

fn is_reachable(status: StatusCode, url: &Url, trusted: &[String]) -> bool {
    if status.as_u16() < 400 {
        return true;
    }
    status == CLIENT_BLOCK_STATUS && is_trusted_host(url, trusted)
}

/// Protocol-relative links are probed over https.
fn absolute_url(url: &str) -> Result<Url> {
    let raw = if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    };
    Url::parse(&raw).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))
}

fn is_trusted_host(url: &Url, trusted: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_lowercase();
    trusted
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn record(url: String) -> ExternalLinkRecord {
        ExternalLinkRecord::new(url, "/site/index.html")
    }

    #[tokio::test]
    async fn test_reachable_link_has_no_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let verifier = LinkVerifier::new().unwrap();
        let failures = verifier
            .verify(vec![record(format!("{}/ok", mock_server.uri()))])
            .await;

        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_head_rejection_falls_back_to_get() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/no-head"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/no-head"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let verifier = LinkVerifier::new().unwrap();
        let failures = verifier
            .verify(vec![record(format!("{}/no-head", mock_server.uri()))])
            .await;

        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_dead_link_reports_status() {
        let mock_server = MockServer::start().await;
        Mock::given(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/gone", mock_server.uri());
        let verifier = LinkVerifier::new().unwrap();
        let failures = verifier.verify(vec![record(url.clone())]).await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].record.url, url);
        assert_eq!(failures[0].reason, FailureReason::Status(404));
    }

    #[tokio::test]
    async fn test_block_status_is_suppressed_only_for_trusted_domains() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/blocked"))
            .respond_with(ResponseTemplate::new(403))
            .expect(2)
            .mount(&mock_server)
            .await;
        // Only the untrusted run escalates to GET.
        Mock::given(method("GET"))
            .and(path("/blocked"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&mock_server)
            .await;
        let url = format!("{}/blocked", mock_server.uri());

        let trusted = LinkVerifier::new()
            .unwrap()
            .with_trusted_domains(vec!["127.0.0.1".to_string()]);
        assert!(trusted.verify(vec![record(url.clone())]).await.is_empty());

        let untrusted = LinkVerifier::new()
            .unwrap()
            .with_trusted_domains(vec!["example.com".to_string()]);
        let failures = untrusted.verify(vec![record(url)]).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].reason, FailureReason::Status(403));

        mock_server.verify().await;
    }

    #[tokio::test]
    async fn test_crashed_worker_does_not_lose_other_failures() {
        let mock_server = MockServer::start().await;
        Mock::given(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        Mock::given(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let ok_url = format!("{}/ok", mock_server.uri());
        let gone_url = format!("{}/gone", mock_server.uri());
        let crash_on = ok_url.clone();
        let callback: VerifyProgressCallback = Arc::new(move |url: String| {
            if url == crash_on {
                panic!("progress sink went away");
            }
        });

        let verifier = LinkVerifier::new()
            .unwrap()
            .with_progress_callback(callback);
        let failures = verifier
            .verify(vec![record(ok_url), record(gone_url.clone())])
            .await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].record.url, gone_url);
    }

    #[tokio::test]
    async fn test_network_error_is_reported_verbatim() {
        // Nothing listens on port 9 of localhost in the test environment.
        let verifier = LinkVerifier::with_timeout(2).unwrap();
        let failures = verifier
            .verify(vec![record("http://127.0.0.1:9/".to_string())])
            .await;

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].reason, FailureReason::Network(_)));
    }

    #[tokio::test]
    async fn test_failures_keep_record_order() {
        let mock_server = MockServer::start().await;
        for i in 0..12 {
            Mock::given(path(format!("/page{}", i)))
                .respond_with(if i % 2 == 0 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200)
                })
                .mount(&mock_server)
                .await;
        }

        let records: Vec<_> = (0..12)
            .map(|i| record(format!("{}/page{}", mock_server.uri(), i)))
            .collect();
        let verifier = LinkVerifier::new().unwrap().with_concurrency(3);
        let failures = verifier.verify(records).await;

        let failed: Vec<_> = failures.iter().map(|f| f.record.url.clone()).collect();
        let expected: Vec<_> = (0..12)
            .filter(|i| i % 2 == 0)
            .map(|i| format!("{}/page{}", mock_server.uri(), i))
            .collect();
        assert_eq!(failed, expected);
    }

    #[test]
    fn test_trusted_host_matches_subdomains() {
        let trusted = vec!["anthropic.com".to_string()];
        let docs = Url::parse("https://docs.anthropic.com/x").unwrap();
        let bare = Url::parse("https://anthropic.com").unwrap();
        let other = Url::parse("https://notanthropic.com").unwrap();

        assert!(is_trusted_host(&docs, &trusted));
        assert!(is_trusted_host(&bare, &trusted));
        assert!(!is_trusted_host(&other, &trusted));
    }
}
