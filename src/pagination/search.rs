//! Search listings.
//!
//! Search endpoints wrap each page in an envelope:
//!
//! ```text
//! { "total_count": 2, "incomplete_results": false, "items": [ {..}, {..} ] }
//! ```
//!
//! [`SearchRequest`] decorates a request so that the body of every response
//! it fetches is just the `items` array. That lets [`Pages`] walk search
//! results exactly like any other listing.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::value::RawValue;
use url::Url;

use crate::http::{append_path, Headers, HttpError, HttpResult, Request, RequestParts, Response, Wire};
use crate::pagination::pages::{Mapping, Pages};

/// Sort direction of a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Order {
    #[default]
    Desc,
    Asc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Desc => "desc",
            Order::Asc => "asc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request whose responses expose only the `items` of a search envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest<R> {
    inner: R,
}

impl<R: Request> SearchRequest<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Request> Request for SearchRequest<R> {
    type Response = SearchResponse<R::Response>;

    fn uri(&self) -> &Url {
        self.inner.uri()
    }

    fn body(&self) -> &[u8] {
        self.inner.body()
    }

    fn header(&self, name: &str, value: &str) -> HttpResult<Self> {
        Ok(Self::new(self.inner.header(name, value)?))
    }

    fn reset(&self, name: &str) -> HttpResult<Self> {
        Ok(Self::new(self.inner.reset(name)?))
    }

    fn method(&self, method: &str) -> HttpResult<Self> {
        Ok(Self::new(self.inner.method(method)?))
    }

    fn with_uri(&self, uri: Url) -> Self {
        Self::new(self.inner.with_uri(uri))
    }

    fn through<F, W>(&self, decorate: F) -> Self
    where
        F: FnOnce(Arc<dyn Wire>) -> W,
        W: Wire + 'static,
    {
        Self::new(self.inner.through(decorate))
    }

    fn fetch(&self) -> HttpResult<Self::Response> {
        Ok(SearchResponse {
            inner: self.inner.fetch()?,
        })
    }
}

/// A response whose text body is the `items` array of the wrapped one.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse<R> {
    inner: R,
}

impl<R: Response> SearchResponse<R> {
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: Response> Response for SearchResponse<R> {
    fn back(&self) -> &RequestParts {
        self.inner.back()
    }

    fn status(&self) -> u16 {
        self.inner.status()
    }

    fn reason(&self) -> &str {
        self.inner.reason()
    }

    fn headers(&self) -> &Headers {
        self.inner.headers()
    }

    fn body(&self) -> HttpResult<String> {
        items(&self.inner.body()?)
    }

    fn binary(&self) -> &[u8] {
        self.inner.binary()
    }
}

/// Cut the `items` array out of a search envelope.
///
/// The array is written compactly; every element keeps its text as received.
fn items(envelope: &str) -> HttpResult<String> {
    let fields: HashMap<String, &RawValue> = serde_json::from_str(envelope).map_err(|e| {
        HttpError::MalformedResponse(format!("search response is not a JSON object: {e}"))
    })?;
    let items = fields.get("items").ok_or_else(|| {
        HttpError::MalformedResponse("search response has no \"items\" field".to_string())
    })?;
    let elements: Vec<&RawValue> = serde_json::from_str(items.get()).map_err(|e| {
        HttpError::MalformedResponse(format!("\"items\" of search response is not an array: {e}"))
    })?;
    Ok(serde_json::to_string(&elements)?)
}

/// Iterable search results for one query.
///
/// Holds the fully built search request; each [`SearchPagination::iter`]
/// starts a new walk from page one.
pub struct SearchPagination<T, R, M> {
    request: R,
    mapping: M,
    _item: PhantomData<fn() -> T>,
}

impl<T, R, M> SearchPagination<T, R, M>
where
    R: Request,
    M: Mapping<T>,
{
    /// Search `path` under the URI of `entry`, e.g. `/search/repositories`.
    pub fn new(entry: &R, path: &str, keywords: &str, sort: &str, order: Order, mapping: M) -> Self {
        let mut uri = append_path(entry.uri(), path);
        uri.query_pairs_mut()
            .append_pair("q", keywords)
            .append_pair("sort", sort)
            .append_pair("order", order.as_str());
        Self {
            request: entry.with_uri(uri),
            mapping,
            _item: PhantomData,
        }
    }

    /// The search request for page one, without envelope unwrapping.
    pub fn request(&self) -> &R {
        &self.request
    }

    /// A fresh iterator starting at page one.
    pub fn iter(&self) -> Pages<'_, T, SearchRequest<R>, M> {
        Pages::new(SearchRequest::new(self.request.clone()), &self.mapping)
    }
}

impl<'a, T, R, M> IntoIterator for &'a SearchPagination<T, R, M>
where
    R: Request,
    M: Mapping<T>,
{
    type Item = HttpResult<T>;
    type IntoIter = Pages<'a, T, SearchRequest<R>, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, R: Clone, M: Clone> Clone for SearchPagination<T, R, M> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            mapping: self.mapping.clone(),
            _item: PhantomData,
        }
    }
}

impl<T, R: PartialEq, M: PartialEq> PartialEq for SearchPagination<T, R, M> {
    fn eq(&self, other: &Self) -> bool {
        self.request == other.request && self.mapping == other.mapping
    }
}

impl<T, R: fmt::Debug, M> fmt::Debug for SearchPagination<T, R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchPagination")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use super::*;
    use crate::http::fake::{FakeAnswer, FakeWire};
    use crate::http::{HttpRequest, HttpResponse, JsonResponse};

    fn entry(wire: Arc<FakeWire>) -> HttpRequest {
        HttpRequest::new("https://api.github.com", wire).unwrap()
    }

    fn full_name(item: &Map<String, Value>) -> HttpResult<String> {
        item.get("full_name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| HttpError::MalformedResponse("no full_name".to_string()))
    }

    #[test]
    fn test_body_is_compact_items_array() {
        let body = r#"{"total_count": 3, "items": [ {"a": 1.50}, "x" ,
  [true] ]}"#;
        let wire = Arc::new(
            FakeWire::new().answer(FakeAnswer::with_status(200, "OK", body).with_header("X-RateLimit-Remaining", "9")),
        );
        let search = SearchRequest::new(entry(wire));
        let response = search.fetch().unwrap();

        assert_eq!(response.body().unwrap(), r#"[{"a": 1.50},"x",[true]]"#);
        assert_eq!(response.status(), 200);
        assert_eq!(response.reason(), "OK");
        assert_eq!(response.headers(), response.inner().headers());
        assert_eq!(response.headers().first("x-ratelimit-remaining"), Some("9"));
        assert_eq!(response.binary(), body.as_bytes());
    }

    #[test]
    fn test_views_see_unwrapped_body() {
        let wire = Arc::new(FakeWire::new().answer(FakeAnswer::ok(r#"{"items": [{"id": 1}]}"#)));
        let response = SearchRequest::new(entry(wire)).fetch().unwrap();

        let json: JsonResponse = response.view().unwrap();
        assert_eq!(json.array().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_envelopes() {
        for body in [r#"[1, 2]"#, r#"{"total_count": 0}"#, r#"{"items": {"a": 1}}"#, "nope"] {
            let wire = Arc::new(FakeWire::new().answer(FakeAnswer::ok(body)));
            let response = SearchRequest::new(entry(wire)).fetch().unwrap();
            let err = response.body().unwrap_err();
            assert!(err.is_malformed(), "{body}: {err}");
        }
    }

    #[derive(Debug)]
    struct Tagging {
        inner: Arc<dyn Wire>,
    }

    impl Wire for Tagging {
        fn send(&self, request: &RequestParts) -> HttpResult<HttpResponse> {
            let mut tagged = request.clone();
            tagged.headers.append("X-Tagged", "yes");
            self.inner.send(&tagged)
        }
    }

    #[test]
    fn test_derived_requests_stay_wrapped() {
        let wire = Arc::new(FakeWire::new().answer(FakeAnswer::ok(r#"{"items": [1]}"#)));
        let search = SearchRequest::new(entry(wire.clone()).with_body("query"));
        assert_eq!(search.body(), b"query");

        let derived = search
            .header("Accept", "application/vnd.github+json")
            .unwrap()
            .header("X-Trace", "1")
            .unwrap()
            .method("POST")
            .unwrap();
        assert_eq!(derived.inner().method_name(), "POST");
        assert_eq!(derived.inner().headers().first("accept"), Some("application/vnd.github+json"));
        assert_eq!(derived.uri(), search.uri());
        assert_eq!(derived.body(), b"query");

        let derived = derived.reset("x-trace").unwrap().through(|inner| Tagging { inner });
        assert!(!derived.inner().headers().contains("x-trace"));

        let response = derived.fetch().unwrap();
        assert_eq!(response.body().unwrap(), "[1]");
        let sent = &wire.received()[0];
        assert_eq!(sent.method, "POST");
        assert_eq!(sent.body, b"query");
        assert_eq!(sent.headers.first("x-tagged"), Some("yes"));
        assert!(!sent.headers.contains("x-trace"));

        assert!(matches!(search.header("", "x"), Err(HttpError::InvalidArgument(_))));
        assert!(matches!(search.reset(""), Err(HttpError::InvalidArgument(_))));
        assert!(matches!(search.method("B A D"), Err(HttpError::InvalidArgument(_))));
    }

    #[test]
    fn test_search_query_parameters() {
        let wire = Arc::new(FakeWire::new());
        let search = SearchPagination::new(
            &entry(wire),
            "/search/repositories",
            "tetris language:rust",
            "stars",
            Order::Asc,
            full_name,
        );

        assert_eq!(
            search.request().uri().as_str(),
            "https://api.github.com/search/repositories?q=tetris+language%3Arust&sort=stars&order=asc"
        );
    }

    #[test]
    fn test_search_walks_every_page() {
        let wire = Arc::new(
            FakeWire::new()
                .answer(
                    FakeAnswer::ok(r#"{"total_count": 3, "items": [{"full_name": "a/one"}, {"full_name": "a/two"}]}"#)
                        .with_header(
                            "Link",
                            "<https://api.github.com/search/repositories?q=x&sort=stars&order=desc&page=2>; rel=\"next\"",
                        ),
                )
                .answer(FakeAnswer::ok(r#"{"total_count": 3, "items": [{"full_name": "b/three"}]}"#)),
        );
        let search = SearchPagination::new(&entry(wire.clone()), "search/repositories", "x", "stars", Order::default(), full_name);

        let names: Vec<String> = search.iter().collect::<HttpResult<_>>().unwrap();
        assert_eq!(names, vec!["a/one", "a/two", "b/three"]);
        assert_eq!(wire.received()[1].uri.query(), Some("q=x&sort=stars&order=desc&page=2"));
    }

    #[test]
    fn test_iterators_are_independent() {
        let wire = Arc::new(
            FakeWire::new()
                .answer(FakeAnswer::ok(r#"{"items": [{"full_name": "a/b"}]}"#))
                .answer(FakeAnswer::ok(r#"{"items": [{"full_name": "a/b"}]}"#)),
        );
        let search = SearchPagination::new(&entry(wire.clone()), "search/code", "q", "indexed", Order::Desc, full_name);

        let mut first = search.iter();
        let mut second = (&search).into_iter();
        assert_eq!(first.next().unwrap().unwrap(), "a/b");
        assert_eq!(second.next().unwrap().unwrap(), "a/b");
        assert!(first.next().is_none());
        assert!(second.next().is_none());
        assert_eq!(wire.received().len(), 2);
    }

    #[test]
    fn test_malformed_page_ends_search() {
        let wire = Arc::new(FakeWire::new().answer(FakeAnswer::ok(r#"{"message": "Validation Failed"}"#)));
        let search = SearchPagination::new(&entry(wire), "search/issues", "", "created", Order::Asc, full_name);

        let mut results = search.iter();
        assert!(results.next().unwrap().unwrap_err().is_malformed());
        assert!(results.next().is_none());
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Login;

    impl Mapping<String> for Login {
        fn map(&self, item: &Map<String, Value>) -> HttpResult<String> {
            Ok(item.get("login").and_then(Value::as_str).unwrap_or_default().to_string())
        }
    }

    #[test]
    fn test_structural_equality() {
        let wire = Arc::new(FakeWire::new());
        let base = entry(wire);

        let a: SearchPagination<String, _, _> =
            SearchPagination::new(&base, "search/users", "tom", "followers", Order::Desc, Login);
        let b = SearchPagination::new(&base, "search/users", "tom", "followers", Order::Desc, Login);
        let c: SearchPagination<String, _, _> = SearchPagination::new(&base, "search/users", "tom", "followers", Order::Asc, Login);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
