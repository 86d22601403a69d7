//! Submission client for the cNLS Mapper form.
//!
//! One POST per sequence, no retries, and a fixed pause after every successful
//! exchange so a long run of submissions does not hammer the service.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::ScreenscraperConfig;
use crate::cutoff::Cutoff;
use crate::parser;
use crate::types::{CnlsError, CnlsResult, Prediction};

/// Status and body of a form POST.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can POST a url-encoded form.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<RawResponse>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ScreenscraperConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.as_str())
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<RawResponse> {
        let r = self.client.post(url).form(fields).send().await?;
        let status = r.status().as_u16();
        let body = r.text().await?;
        Ok(RawResponse { status, body })
    }
}

/// Client for the cNLS Mapper.
pub struct Screenscraper<T: Transport = HttpTransport> {
    transport: T,
    endpoint: String,
}

impl Screenscraper<HttpTransport> {
    /// Create a client talking HTTP to `config.endpoint`.
    pub fn new(config: &ScreenscraperConfig) -> Self {
        Self::with_transport(HttpTransport::new(config), config.endpoint.clone())
    }
}

impl<T: Transport> Screenscraper<T> {
    pub fn with_transport(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit `sequence` and parse the response.
    pub async fn submit(
        &self,
        sequence: &str,
        cut_off: &str,
        pause: Duration,
    ) -> CnlsResult<Prediction> {
        let html = self.fetch_raw(sequence, cut_off, pause).await?;
        parser::parse(&html)
    }

    /// Submit `sequence` and return the response body unparsed, for callers
    /// that store pages and parse them later.
    ///
    /// `cut_off` must be one of the [`Cutoff`] tokens; anything else fails
    /// before a request is made. After a successful response this sleeps for
    /// `pause` before returning.
    pub async fn fetch_raw(
        &self,
        sequence: &str,
        cut_off: &str,
        pause: Duration,
    ) -> CnlsResult<String> {
        let cut_off: Cutoff = cut_off.parse()?;

        tracing::debug!(
            "POST {} cut_off={} ({} residues)",
            self.endpoint,
            cut_off,
            sequence.len()
        );

        let network_error = |reason: String| CnlsError::Network {
            cut_off: cut_off.to_string(),
            sequence: sequence.to_string(),
            reason,
        };

        let response = self
            .transport
            .post_form(
                &self.endpoint,
                &[("cut_off", cut_off.as_token()), ("typedseq", sequence)],
            )
            .await
            .map_err(|e| network_error(format!("{e:#}")))?;

        if !response.is_success() {
            return Err(network_error(format!("HTTP status {}", response.status)));
        }

        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        Ok(response.body)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) const NO_HITS: &str = "Predicted monopartite NLS</th>\n</tr>\n<tr bgcolor=\"#d0d0d0\">\n<th>Pos.</th>\n<th>Sequence</th>\n<th>Score</th>\n</tr>\n<tr><td><strong><big><code></code></big></strong></td><td><strong><big><code></code></big></strong></td><td align=\"center\"><strong><big><code></code></big></strong></td></tr>\nPredicted bipartite NLS</th>\n</tr>\n<tr bgcolor=\"#d0d0d0\">\n<th>Pos.</th>\n<th>Sequence</th>\n<th>Score</th>\n</tr>\n<tr><td><strong><big><code></code></big></strong></td><td><strong><big><code></code></big></strong></td><td align=\"center\"><strong><big><code></code></big></strong></td></tr>";

    /// Records every form it is given and answers with a canned response.
    pub(crate) struct StubTransport {
        pub(crate) calls: AtomicUsize,
        pub(crate) fields: Mutex<Vec<(String, String)>>,
        response: Option<RawResponse>,
    }

    impl StubTransport {
        pub(crate) fn answering(status: u16, body: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fields: Mutex::new(Vec::new()),
                response: Some(RawResponse {
                    status,
                    body: body.to_string(),
                }),
            }
        }

        pub(crate) fn unreachable() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fields: Mutex::new(Vec::new()),
                response: None,
            }
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn post_form(&self, _url: &str, fields: &[(&str, &str)]) -> Result<RawResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.fields.lock().unwrap().extend(
                fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            );
            self.response
                .clone()
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    const SEQ: &str = "MKRPAATKKAGQAKKKKLDKE";

    #[tokio::test]
    async fn test_invalid_cutoff_sends_nothing() {
        let client = Screenscraper::with_transport(StubTransport::answering(200, NO_HITS), "stub");
        let err = client.submit(SEQ, "7.0", Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, CnlsError::InvalidParameter(_)));
        assert_eq!(client.transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_form_fields() {
        let client = Screenscraper::with_transport(StubTransport::answering(200, NO_HITS), "stub");
        client.fetch_raw(SEQ, "4.0", Duration::ZERO).await.unwrap();
        let fields = client.transport.fields.lock().unwrap().clone();
        assert_eq!(
            fields,
            vec![
                ("cut_off".to_string(), "4.0".to_string()),
                ("typedseq".to_string(), SEQ.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_parses_body() {
        let client = Screenscraper::with_transport(StubTransport::answering(200, NO_HITS), "stub");
        let prediction = client.submit(SEQ, "3.0", Duration::ZERO).await.unwrap();
        assert!(!prediction.has_any_prediction());
    }

    #[tokio::test]
    async fn test_non_success_status_is_network_error() {
        let client = Screenscraper::with_transport(StubTransport::answering(503, "busy"), "stub");
        match client.fetch_raw(SEQ, "3.0", Duration::ZERO).await {
            Err(CnlsError::Network {
                cut_off,
                sequence,
                reason,
            }) => {
                assert_eq!(cut_off, "3.0");
                assert_eq!(sequence, SEQ);
                assert!(reason.contains("503"));
            }
            other => panic!("expected network error, got {other:?}"),
        }
        assert_eq!(client.transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let client = Screenscraper::with_transport(StubTransport::unreachable(), "stub");
        let err = client.fetch_raw(SEQ, "2.0", Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, CnlsError::Network { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pauses_after_success() {
        let client = Screenscraper::with_transport(StubTransport::answering(200, NO_HITS), "stub");
        let started = tokio::time::Instant::now();
        client
            .fetch_raw(SEQ, "3.0", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pause_after_failure() {
        let client = Screenscraper::with_transport(StubTransport::answering(500, ""), "stub");
        let started = tokio::time::Instant::now();
        let _ = client.fetch_raw(SEQ, "3.0", Duration::from_secs(5)).await;
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_raw_response_success_range() {
        let ok = |status| RawResponse {
            status,
            body: String::new(),
        }
        .is_success();
        assert!(ok(200));
        assert!(ok(204));
        assert!(!ok(301));
        assert!(!ok(404));
    }
}
