//! Blocking transport built on `reqwest`.

use crate::http::error::{HttpError, HttpResult};
use crate::http::headers::Headers;
use crate::http::request::{RequestParts, Wire};
use crate::http::response::HttpResponse;

/// Terminal wire sending requests with a blocking `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestWire {
    client: reqwest::blocking::Client,
}

impl ReqwestWire {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, TLS).
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Wire for ReqwestWire {
    fn send(&self, request: &RequestParts) -> HttpResult<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| HttpError::InvalidArgument(format!("method {:?}: {e}", request.method)))?;

        let mut builder = self.client.request(method, request.uri.clone());
        for (name, values) in request.headers.iter() {
            for value in values {
                builder = builder.header(name, value.as_str());
            }
        }

        let response = builder
            .body(request.body.clone())
            .send()
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = response.status();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        let body = response
            .bytes()
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        Ok(HttpResponse::new(
            request.clone(),
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            body.to_vec(),
        ))
    }
}
