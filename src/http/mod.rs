//! Request/response abstraction consumed by the pagination layer.
//!
//! ```text
//!   Request::fetch()
//!        │
//!        ▼
//!   ┌──────────┐    ┌──────────┐    ┌─────────────────────┐
//!   │ decorator│ ─▶ │ decorator│ ─▶ │ terminal wire       │
//!   │  wire    │    │  wire    │    │ (transport / fake)  │
//!   └──────────┘    └──────────┘    └─────────────────────┘
//!                                          │
//!                                          ▼
//!                                    HttpResponse ─▶ views (JsonResponse,
//!                                                      WebLinkingResponse)
//! ```
//!
//! The crate does not own a production transport. [`fake::FakeWire`] is the
//! in-memory wire used in tests; with the `reqwest` feature enabled,
//! `ReqwestWire` sends requests over the network.

mod error;
pub mod fake;
mod headers;
mod request;
mod response;
#[cfg(feature = "reqwest")]
mod transport;

pub use error::{HttpError, HttpResult};
pub use headers::Headers;
pub use request::{append_path, HttpRequest, Request, RequestParts, Wire};
pub use response::{FromResponse, HttpResponse, JsonResponse, Link, Response, WebLinkingResponse};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestWire;
