//! Paginated and searchable remote collections.
//!
//! ```text
//!   SearchPagination ──▶ SearchRequest (unwraps "items") ──┐
//!                                                           ▼
//!   Pagination ───────────────────────────────────────▶ Pages ──▶ caller
//!                                                 fetch, map, follow rel="next"
//! ```

mod pages;
mod search;

pub use pages::{Mapping, Pages, Pagination};
pub use search::{Order, SearchPagination, SearchRequest, SearchResponse};
