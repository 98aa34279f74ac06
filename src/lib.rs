//! hubkit - paginated access to a git hosting API, and a stand-in for it
//!
//! Two halves:
//!
//! - [`pagination`] walks listing and search endpoints page by page,
//!   following `Link: rel="next"` headers, on top of the request/response
//!   abstraction in [`http`].
//! - [`mock`] simulates the service in memory: repositories and their git
//!   references live in one hierarchical document ([`storage`]) that is
//!   queried with path expressions and edited with atomic directive batches.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use hubkit::http::fake::{FakeAnswer, FakeWire};
//! use hubkit::http::{HttpError, HttpRequest, HttpResult};
//! use hubkit::pagination::{Order, SearchPagination};
//! use serde_json::{Map, Value};
//!
//! fn full_name(item: &Map<String, Value>) -> HttpResult<String> {
//!     item.get("full_name")
//!         .and_then(Value::as_str)
//!         .map(str::to_string)
//!         .ok_or_else(|| HttpError::MalformedResponse("no full_name".to_string()))
//! }
//!
//! let wire = Arc::new(FakeWire::new().answer(FakeAnswer::ok(
//!     r#"{"total_count": 1, "items": [{"full_name": "jeff/test"}]}"#,
//! )));
//! let entry = HttpRequest::new("https://api.github.com", wire)?;
//! let search = SearchPagination::new(&entry, "/search/repositories", "test", "stars", Order::Desc, full_name);
//!
//! let names: Vec<String> = search.iter().collect::<HttpResult<_>>()?;
//! assert_eq!(names, vec!["jeff/test"]);
//! # Ok::<(), HttpError>(())
//! ```

pub mod http;
pub mod mock;
pub mod pagination;
pub mod storage;
