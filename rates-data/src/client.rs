use crate::error::DataError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of additional attempts after the first (4 tries total).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Default per-request timeout for [`HttpFeedClient`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Performs a single GET of a feed URL and decodes the body as JSON.
///
/// Any network failure, non-2xx status or undecodable body is a [`DataError::Transport`].
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, DataError>;
}

#[async_trait]
impl<T> FeedClient for std::sync::Arc<T>
where
    T: FeedClient + ?Sized,
{
    async fn get_json(&self, url: &str) -> Result<Value, DataError> {
        (**self).get_json(url).await
    }
}

/// [`FeedClient`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    http: Client,
}

impl HttpFeedClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rates-board/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn get_json(&self, url: &str) -> Result<Value, DataError> {
        let transport = |reason: String| DataError::Transport {
            url: url.to_string(),
            reason,
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|error| transport(format!("request failed: {error}")))?;

        if let Err(status_err) = response.error_for_status_ref() {
            return Err(transport(format!("HTTP error: {status_err}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|error| transport(format!("failed to decode JSON body: {error}")))
    }
}

/// Bounded, fixed-delay retry policy (no exponential backoff).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    /// Wait between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// GET `url` through `client`, retrying retryable failures according to `policy`.
///
/// On exhaustion returns [`DataError::FetchExhausted`] carrying the last underlying error.
/// Non-retryable errors are returned immediately.
pub async fn fetch_with_retry<C>(
    client: &C,
    url: &str,
    policy: &RetryPolicy,
) -> Result<Value, DataError>
where
    C: FeedClient + ?Sized,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        let error = match client.get_json(url).await {
            Ok(body) => return Ok(body),
            Err(error) if !error.is_retryable() => return Err(error),
            Err(error) => error,
        };

        debug!(%url, attempt, max_attempts, %error, "feed request attempt failed");

        if attempt >= max_attempts {
            warn!(%url, attempts = attempt, %error, "feed request retries exhausted");
            return Err(DataError::FetchExhausted {
                url: url.to_string(),
                attempts: attempt,
                last: Box::new(error),
            });
        }

        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::{
        collections::{HashMap, VecDeque},
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        time::Instant,
    };

    /// Scripted [`FeedClient`]: each URL replays a queue of responses, optionally delayed.
    ///
    /// Once a queue holds a single response it is repeated forever.
    #[derive(Debug, Default)]
    pub struct ScriptedClient {
        scripts: Mutex<HashMap<String, VecDeque<(Duration, Result<Value, DataError>)>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, url: &str, response: Result<Value, DataError>) -> Self {
            self.respond_after(url, Duration::ZERO, response)
        }

        pub fn respond_after(
            self,
            url: &str,
            latency: Duration,
            response: Result<Value, DataError>,
        ) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back((latency, response));
            self
        }

        pub fn calls(&self, url: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|called| called.as_str() == url)
                .count()
        }
    }

    pub fn transport(url: &str) -> DataError {
        DataError::Transport {
            url: url.to_string(),
            reason: "HTTP error: 503 Service Unavailable".to_string(),
        }
    }

    #[async_trait]
    impl FeedClient for ScriptedClient {
        async fn get_json(&self, url: &str) -> Result<Value, DataError> {
            self.calls.lock().unwrap().push(url.to_string());

            let (latency, response) = {
                let mut scripts = self.scripts.lock().unwrap();
                match scripts.get_mut(url) {
                    Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                    Some(queue) if !queue.is_empty() => queue.front().cloned().unwrap(),
                    _ => (Duration::ZERO, Err(transport(url))),
                }
            };

            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            response
        }
    }

    fn http_response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: {content_type}\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serve `response` to every connection on a loopback port, counting connections.
    async fn serve(response: String) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/feed", listener.local_addr().unwrap());
        let connections = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&connections);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut request = [0u8; 4096];
                let _ = stream.read(&mut request).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, connections)
    }

    #[tokio::test]
    async fn test_http_client_maps_failures_to_transport() {
        struct TestCase {
            response: String,
            expected_reason: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: non-2xx status
                response: http_response("503 Service Unavailable", "text/plain", ""),
                expected_reason: "HTTP error",
            },
            TestCase {
                // TC1: 2xx with a body that is not JSON
                response: http_response("200 OK", "text/html", "<html>maintenance</html>"),
                expected_reason: "failed to decode JSON body",
            },
        ];

        let client = HttpFeedClient::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        for (index, test) in tests.into_iter().enumerate() {
            let (url, _) = serve(test.response).await;
            let actual = client.get_json(&url).await;

            match actual {
                Err(DataError::Transport { url: failed, reason }) => {
                    assert_eq!(failed, url, "TC{} failed", index);
                    assert!(
                        reason.starts_with(test.expected_reason),
                        "TC{} failed: {}",
                        index,
                        reason
                    );
                }
                other => panic!("TC{} failed: {:?}", index, other),
            }
        }
    }

    #[tokio::test]
    async fn test_http_client_decodes_json_body() {
        let (url, _) =
            serve(http_response("200 OK", "application/json", r#"{"price":2345.6}"#)).await;

        let client = HttpFeedClient::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let body = client.get_json(&url).await.unwrap();

        assert_eq!(body["price"], 2345.6);
    }

    #[tokio::test]
    async fn test_http_client_retries_non_2xx_like_network_errors() {
        let (url, connections) =
            serve(http_response("503 Service Unavailable", "text/plain", "")).await;

        let client = HttpFeedClient::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let error = fetch_with_retry(&client, &url, &policy).await.unwrap_err();

        let DataError::FetchExhausted { attempts, last, .. } = &error else {
            panic!("expected exhausted fetch, got {error:?}");
        };
        assert_eq!(*attempts, 4);
        assert!(matches!(**last, DataError::Transport { .. }), "{last:?}");
        assert_eq!(connections.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_with_retry_succeeds_after_transient_failures() {
        let url = "https://feed.test/gold";
        let client = ScriptedClient::new()
            .respond(url, Err(transport(url)))
            .respond(url, Err(transport(url)))
            .respond(url, Ok(serde_json::json!({ "price": 2345.6 })));

        let start = Instant::now();
        let body = fetch_with_retry(&client, url, &RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(body["price"], 2345.6);
        assert_eq!(client.calls(url), 3);
        assert!(start.elapsed() >= Duration::from_millis(2000));
        assert!(start.elapsed() < Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_with_retry_exhausts_after_four_attempts() {
        let url = "https://feed.test/oil";
        let client = ScriptedClient::new().respond(url, Err(transport(url)));

        let start = Instant::now();
        let error = fetch_with_retry(&client, url, &RetryPolicy::default())
            .await
            .unwrap_err();

        assert_eq!(
            error,
            DataError::FetchExhausted {
                url: url.to_string(),
                attempts: 4,
                last: Box::new(transport(url)),
            }
        );
        assert_eq!(client.calls(url), 4);
        // Three fixed delays between four attempts, none after the last.
        assert!(start.elapsed() >= Duration::from_millis(3000));
        assert!(start.elapsed() < Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_with_retry_zero_retries_tries_once() {
        let url = "https://feed.test/fx";
        let client = ScriptedClient::new().respond(url, Err(transport(url)));

        let error = fetch_with_retry(&client, url, &RetryPolicy::new(0, Duration::from_secs(1)))
            .await
            .unwrap_err();

        assert!(matches!(error, DataError::FetchExhausted { attempts: 1, .. }));
        assert_eq!(client.calls(url), 1);
    }
}
