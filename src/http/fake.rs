//! In-memory wire for tests.
//!
//! [`FakeWire`] answers from a queue of canned [`FakeAnswer`]s and records
//! every request it receives, so code that drives requests can be checked
//! without a network.

use std::collections::VecDeque;
use std::io;

use parking_lot::Mutex;

use crate::http::error::{HttpError, HttpResult};
use crate::http::headers::Headers;
use crate::http::request::{RequestParts, Wire};
use crate::http::response::HttpResponse;

/// One canned answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeAnswer {
    /// Reply with this status line, headers and body.
    Reply {
        status: u16,
        reason: String,
        headers: Headers,
        body: Vec<u8>,
    },
    /// Fail the exchange with an I/O error.
    Fail(String),
}

impl FakeAnswer {
    /// `200 OK` with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, "OK", body)
    }

    pub fn with_status(status: u16, reason: &str, body: impl Into<Vec<u8>>) -> Self {
        Self::Reply {
            status,
            reason: reason.to_string(),
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// An I/O failure with the given message.
    pub fn fail(message: &str) -> Self {
        Self::Fail(message.to_string())
    }

    /// Add a response header; no effect on a failing answer.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let Self::Reply { headers, .. } = &mut self {
            headers.append(name, value);
        }
        self
    }
}

/// A wire that replays canned answers in order.
#[derive(Debug, Default)]
pub struct FakeWire {
    answers: Mutex<VecDeque<FakeAnswer>>,
    received: Mutex<Vec<RequestParts>>,
}

impl FakeWire {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer (builder form).
    pub fn answer(self, answer: FakeAnswer) -> Self {
        self.push(answer);
        self
    }

    /// Queue an answer.
    pub fn push(&self, answer: FakeAnswer) {
        self.answers.lock().push_back(answer);
    }

    /// Every request received so far, oldest first.
    pub fn received(&self) -> Vec<RequestParts> {
        self.received.lock().clone()
    }

    /// Number of answers not yet consumed.
    pub fn pending(&self) -> usize {
        self.answers.lock().len()
    }
}

impl Wire for FakeWire {
    fn send(&self, request: &RequestParts) -> HttpResult<HttpResponse> {
        self.received.lock().push(request.clone());
        let answer = self.answers.lock().pop_front();
        match answer {
            Some(FakeAnswer::Reply {
                status,
                reason,
                headers,
                body,
            }) => Ok(HttpResponse::new(request.clone(), status, reason, headers, body)),
            Some(FakeAnswer::Fail(message)) => {
                Err(HttpError::Io(io::Error::new(io::ErrorKind::ConnectionReset, message)))
            }
            None => Err(HttpError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("no answer queued for {} {}", request.method, request.uri),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::Response;
    use url::Url;

    fn parts() -> RequestParts {
        RequestParts::new(Url::parse("https://api.github.com/zen").unwrap())
    }

    #[test]
    fn test_answers_in_order() {
        let wire = FakeWire::new()
            .answer(FakeAnswer::ok("first").with_header("X-Page", "1"))
            .answer(FakeAnswer::with_status(404, "Not Found", "second"));

        let first = wire.send(&parts()).unwrap();
        assert_eq!(first.body().unwrap(), "first");
        assert_eq!(first.headers().first("x-page"), Some("1"));

        let second = wire.send(&parts()).unwrap();
        assert_eq!(second.status(), 404);
        assert_eq!(second.reason(), "Not Found");

        assert_eq!(wire.pending(), 0);
        assert_eq!(wire.received().len(), 2);
    }

    #[test]
    fn test_failures() {
        let wire = FakeWire::new().answer(FakeAnswer::fail("connection reset"));
        assert!(wire.send(&parts()).unwrap_err().is_transport());
        // exhausted queue behaves like an unreachable host
        assert!(wire.send(&parts()).unwrap_err().is_transport());
    }
}
