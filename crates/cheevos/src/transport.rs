//! Transport adapter.
//!
//! One call to [`Transport::perform`] is one HTTP exchange. Timeouts and
//! connection handling belong to the implementation and surface as
//! [`crate::Error::NetworkFailure`]. The runtime never calls a transport on the
//! frame thread; it runs on whatever the configured executor provides.

use std::fmt;

#[cfg(feature = "http")]
use crate::error::Error;
use crate::error::Result;

/// Content type for form encoded POST bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Host supplied HTTP capability.
pub trait Transport: Send + Sync {
    fn perform(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync,
{
    fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self(request)
    }
}

/// Value for the `User-Agent` header, derived from the runtime version.
pub fn user_agent() -> String {
    format!(
        "cheevos-rs/{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

/// Blocking transport built on `ureq`.
#[cfg(feature = "http")]
pub struct UreqTransport {
    agent: ureq::Agent,
}

#[cfg(feature = "http")]
impl UreqTransport {
    pub fn new(timeout: std::time::Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(std::time::Duration::from_secs(30))
    }
}

#[cfg(feature = "http")]
impl Transport for UreqTransport {
    fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let network = |e: ureq::Error| Error::NetworkFailure(e.to_string());

        let mut response = match request.method {
            Method::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name, value);
                }
                builder.call().map_err(network)?
            }
            Method::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name, value);
                }
                builder
                    .send(request.body.as_deref().unwrap_or(""))
                    .map_err(network)?
            }
        };

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().map_err(network)?;
        Ok(HttpResponse { status, body })
    }
}
