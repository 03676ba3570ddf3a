use reqwest::header::HeaderMap;
use reqwest::{Client, Url};
use std::sync::Arc;

use crate::config::FetcherConfig;
use crate::error::{FetchError, TransportError};
use crate::types::{Headers, TransportResponse};

/// The network seam: one GET, body read to text.
///
/// Implementations must be safe to share across concurrent fetches.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Build a client whose total per-call budget is `request_timeout`.
    pub fn new(cfg: &FetcherConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder().timeout(cfg.request_timeout);
        if let Some(connect) = cfg.connect_timeout {
            builder = builder.connect_timeout(connect);
        }
        if let Some(ua) = &cfg.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let inner = builder
            .build()
            .map_err(|e| FetchError::Build(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let parsed = Url::parse(url)
            .map_err(|e| TransportError::Connection(format!("invalid URL {url:?}: {e}")))?;
        let resp = self
            .inner
            .get(parsed)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;
        let status = resp.status().as_u16();
        let headers = collect_headers(resp.headers());
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// Flatten a header map; repeated headers are joined with ", ".
fn collect_headers(h: &HeaderMap) -> Headers {
    let mut out = Headers::new();
    for (name, value) in h.iter() {
        let value = String::from_utf8_lossy(value.as_bytes());
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    out
}

/// Owns the transport for the lifetime of one open scope.
///
/// Dropping the last handle releases the transport and its pooled
/// connections. Fetches already in flight hold their own handle, so closing
/// the scope never tears the transport out from under them.
pub struct FetchSession {
    transport: Arc<dyn Transport>,
}

impl FetchSession {
    pub fn open(cfg: &FetcherConfig) -> Result<Self, FetchError> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new(cfg)?)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

impl std::fmt::Debug for FetchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchSession").finish_non_exhaustive()
    }
}
