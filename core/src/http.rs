//! HTTP transport types and the `Transport` seam.
//!
//! # Design
//! Requests and responses are plain data. `RtmClient::build_call` produces an
//! `HttpRequest` and `RtmClient::parse_call` consumes an `HttpResponse`
//! without touching the network; `Transport` is the single place where a
//! round-trip happens. The service only ever sees GET requests, so the
//! request carries no method or body.

use crate::error::RtmError;

/// Header sent with every request so intermediaries never serve a cached
/// reply to a signed call.
pub const CACHE_CONTROL: (&str, &str) = ("Cache-Control", "no-cache, max-age=0");

/// A signed GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// A GET request for `url` carrying the cache-bypass header.
    pub fn get(url: String) -> Self {
        Self {
            url,
            headers: vec![(CACHE_CONTROL.0.to_string(), CACHE_CONTROL.1.to_string())],
        }
    }

    /// Value of the query parameter `name`, decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let (_, query) = self.url.split_once('?')?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl HttpResponse {
    /// A `200 OK` response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            body: body.into(),
        }
    }
}

/// Executes a GET round-trip.
///
/// Implementations return `Ok` for every HTTP status; interpreting the status
/// is the client's job. `Err` is reserved for failures where no response was
/// received at all.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RtmError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RtmError> {
        (**self).send(request)
    }
}

/// Blocking transport over `ureq`.
#[cfg(feature = "ureq")]
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

#[cfg(feature = "ureq")]
impl Default for UreqTransport {
    fn default() -> Self {
        // 4xx/5xx must come back as data so the client can report them as
        // `RequestFailed` with the method name attached.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

#[cfg(feature = "ureq")]
impl UreqTransport {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

#[cfg(feature = "ureq")]
impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RtmError> {
        let mut builder = self.agent.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut response = builder
            .call()
            .map_err(|e| RtmError::Transport(e.to_string()))?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| RtmError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}
