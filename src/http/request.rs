//! Fetchable requests and the wires that carry them.
//!
//! A [`Request`] is an immutable description of one HTTP exchange. Every
//! "change" (a header, a method, a new URI) produces a new request value.
//! The actual exchange is performed by a [`Wire`]; decorators wrap the wire
//! of a request through [`Request::through`].

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::http::error::{HttpError, HttpResult};
use crate::http::headers::Headers;
use crate::http::response::{HttpResponse, Response};

/// Everything a wire needs to perform one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParts {
    /// HTTP method, e.g. `GET`.
    pub method: String,
    /// Absolute request URI.
    pub uri: Url,
    /// Request headers.
    pub headers: Headers,
    /// Request body.
    pub body: Vec<u8>,
}

impl RequestParts {
    /// A `GET` with no headers and no body.
    pub fn new(uri: Url) -> Self {
        Self {
            method: "GET".to_string(),
            uri,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }
}

/// Performs one network exchange.
///
/// The terminal wire is the transport; decorating wires hold the wire they
/// wrap and call it from `send`.
pub trait Wire: Send + Sync + fmt::Debug {
    fn send(&self, request: &RequestParts) -> HttpResult<HttpResponse>;
}

/// A configured, not yet executed HTTP exchange.
pub trait Request: Clone + fmt::Debug {
    /// What `fetch` produces.
    type Response: Response;

    /// The request URI.
    fn uri(&self) -> &Url;

    /// The request body.
    fn body(&self) -> &[u8];

    /// A request with one more value for header `name`.
    fn header(&self, name: &str, value: &str) -> HttpResult<Self>;

    /// A request without any value for header `name`.
    fn reset(&self, name: &str) -> HttpResult<Self>;

    /// A request using another HTTP method.
    fn method(&self, method: &str) -> HttpResult<Self>;

    /// The same request pointed at another URI.
    fn with_uri(&self, uri: Url) -> Self;

    /// The same request sent through a decorating wire.
    fn through<F, W>(&self, decorate: F) -> Self
    where
        F: FnOnce(Arc<dyn Wire>) -> W,
        W: Wire + 'static;

    /// Perform the exchange.
    fn fetch(&self) -> HttpResult<Self::Response>;
}

/// The plain request: parts plus the wire that sends them.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    parts: RequestParts,
    wire: Arc<dyn Wire>,
}

impl HttpRequest {
    /// Create a `GET` request for `uri`, sent over `wire`.
    pub fn new(uri: &str, wire: Arc<dyn Wire>) -> HttpResult<Self> {
        Ok(Self::from_url(Url::parse(uri)?, wire))
    }

    pub fn from_url(uri: Url, wire: Arc<dyn Wire>) -> Self {
        Self {
            parts: RequestParts::new(uri),
            wire,
        }
    }

    pub fn parts(&self) -> &RequestParts {
        &self.parts
    }

    /// The HTTP method.
    pub fn method_name(&self) -> &str {
        &self.parts.method
    }

    pub fn headers(&self) -> &Headers {
        &self.parts.headers
    }

    /// The same request carrying another body.
    pub fn with_body(&self, body: impl Into<Vec<u8>>) -> Self {
        let mut parts = self.parts.clone();
        parts.body = body.into();
        self.derive(parts)
    }

    fn derive(&self, parts: RequestParts) -> Self {
        Self {
            parts,
            wire: Arc::clone(&self.wire),
        }
    }
}

impl PartialEq for HttpRequest {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts && Arc::ptr_eq(&self.wire, &other.wire)
    }
}

impl Request for HttpRequest {
    type Response = HttpResponse;

    fn uri(&self) -> &Url {
        &self.parts.uri
    }

    fn body(&self) -> &[u8] {
        &self.parts.body
    }

    fn header(&self, name: &str, value: &str) -> HttpResult<Self> {
        check_token("header name", name)?;
        check_header_value(name, value)?;
        let mut parts = self.parts.clone();
        parts.headers.append(name, value);
        Ok(self.derive(parts))
    }

    fn reset(&self, name: &str) -> HttpResult<Self> {
        check_token("header name", name)?;
        let mut parts = self.parts.clone();
        parts.headers.remove(name);
        Ok(self.derive(parts))
    }

    fn method(&self, method: &str) -> HttpResult<Self> {
        check_token("method", method)?;
        let mut parts = self.parts.clone();
        parts.method = method.to_string();
        Ok(self.derive(parts))
    }

    fn with_uri(&self, uri: Url) -> Self {
        let mut parts = self.parts.clone();
        parts.uri = uri;
        self.derive(parts)
    }

    fn through<F, W>(&self, decorate: F) -> Self
    where
        F: FnOnce(Arc<dyn Wire>) -> W,
        W: Wire + 'static,
    {
        Self {
            parts: self.parts.clone(),
            wire: Arc::new(decorate(Arc::clone(&self.wire))),
        }
    }

    fn fetch(&self) -> HttpResult<HttpResponse> {
        self.wire.send(&self.parts)
    }
}

/// Append `path` to the path of `uri`, keeping its query.
pub fn append_path(uri: &Url, path: &str) -> Url {
    let mut next = uri.clone();
    let base = uri.path().trim_end_matches('/');
    let tail = path.trim_start_matches('/');
    next.set_path(&format!("{base}/{tail}"));
    next
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn check_token(what: &str, value: &str) -> HttpResult<()> {
    if value.is_empty() {
        return Err(HttpError::InvalidArgument(format!("{what} can't be empty")));
    }
    if let Some(c) = value.chars().find(|c| !is_token_char(*c)) {
        return Err(HttpError::InvalidArgument(format!(
            "{what} {value:?} contains {c:?}"
        )));
    }
    Ok(())
}

fn check_header_value(name: &str, value: &str) -> HttpResult<()> {
    if value.contains(['\r', '\n']) {
        return Err(HttpError::InvalidArgument(format!(
            "value of header {name:?} contains a line break"
        )));
    }
    Ok(())
}
