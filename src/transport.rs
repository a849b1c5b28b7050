//! HTTP transport
//!
//! The only module that touches the network. [`Transport`] is the seam the
//! orchestrator is generic over, so tests run against a canned-response
//! mock exactly like production runs against [`HttpTransport`].
//!
//! The endpoint rejects requests that do not look like they come from the
//! web client, so the real transport sends a fixed set of browser-style
//! headers. Failures are surfaced verbatim — no internal retry — with
//! HTTP 429 split into its own error variant.

use crate::batch::{Batch, RPC_ID};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Pass-through request configuration supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Per-request timeout; the transport's own default applies when unset.
    pub timeout: Option<Duration>,
    /// Proxy URL for this call.
    pub proxy: Option<String>,
    /// Extra headers, appended after the built-in browser set.
    pub headers: Vec<(String, String)>,
    /// Cancellation signal shared by every batch of the call.
    pub cancel: Option<CancelToken>,
}

/// Create a linked cancel handle/token pair.
///
/// The token is cloned into every in-flight batch request; cancelling the
/// handle aborts them all and the call fails with [`Error::Cancelled`].
///
/// # Example
///
/// ```
/// use gtx_batch::transport::cancel_pair;
///
/// let (handle, token) = cancel_pair();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Caller-held side of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Transport-held side of a cancellation pair.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the paired handle cancels. Pends forever if the
    /// handle was dropped without cancelling.
    pub(crate) async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Run a transport future under the caller's cancellation token, if any.
pub(crate) async fn with_cancel<F>(cancel: Option<&CancelToken>, fut: F) -> Result<String>
where
    F: Future<Output = Result<String>>,
{
    match cancel {
        Some(token) if token.is_cancelled() => Err(Error::Cancelled),
        Some(token) => {
            tokio::select! {
                _ = token.cancelled() => Err(Error::Cancelled),
                res = fut => res,
            }
        }
        None => fut.await,
    }
}

/// One request/response round trip for a single batch.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the batch's serialized payload and return the raw response
    /// text. Implementations must honor `opts.cancel`.
    async fn send(&self, batch: &Batch, opts: &RequestOptions) -> Result<String>;
}

/// Production transport over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

/// Fixed browser-style headers; the endpoint rejects bare clients.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
    ("Accept", "*/*"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Origin", "https://translate.google.com"),
    ("X-Same-Domain", "1"),
];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Self::build_client(None).expect("default HTTP client"),
        }
    }

    fn build_client(proxy: Option<&str>) -> Result<reqwest::Client> {
        let mut headers = reqwest::header::HeaderMap::new();
        for &(name, value) in BROWSER_HEADERS {
            headers.insert(
                name,
                reqwest::header::HeaderValue::from_static(value),
            );
        }
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(DEFAULT_TIMEOUT);
        if let Some(url) = proxy {
            let proxy = reqwest::Proxy::all(url).map_err(|e| Error::Transport {
                status: None,
                message: format!("invalid proxy {url:?}: {e}"),
            })?;
            builder = builder.proxy(proxy);
        }
        builder.build().map_err(|e| Error::Transport {
            status: None,
            message: format!("failed to build HTTP client: {e}"),
        })
    }

    /// Endpoint URL for a batch's regional domain.
    fn endpoint(tld: &str) -> String {
        format!("https://translate.google.{tld}/_/TranslateWebserverUi/data/batchexecute")
    }

    async fn exchange(&self, batch: &Batch, opts: &RequestOptions) -> Result<String> {
        // A per-call proxy needs its own client; reqwest proxies are
        // client-level configuration.
        let one_off;
        let client = match opts.proxy.as_deref() {
            Some(url) => {
                one_off = Self::build_client(Some(url))?;
                &one_off
            }
            None => &self.client,
        };

        let mut request = client
            .post(Self::endpoint(&batch.key.tld))
            .query(&[
                ("rpcids", RPC_ID),
                ("source-path", "/"),
                ("soc-app", "1"),
                ("soc-platform", "1"),
                ("soc-device", "1"),
                ("rt", "c"),
            ])
            .form(&[("f.req", batch.payload.as_str())]);
        if let Some(timeout) = opts.timeout {
            request = request.timeout(timeout);
        }
        for (name, value) in &opts.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimit);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(Error::Transport {
                status: Some(status.as_u16()),
                message,
            });
        }
        response.text().await.map_err(transport_error)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::Transport {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &Batch, opts: &RequestOptions) -> Result<String> {
        tracing::debug!(
            from = %batch.key.from,
            to = %batch.key.to,
            tld = %batch.key.tld,
            jobs = batch.jobs.len(),
            "dispatching batch"
        );
        with_cancel(opts.cancel.as_ref(), self.exchange(batch, opts)).await
    }
}
