//! Lazy iteration over paginated listing endpoints.
//!
//! A listing endpoint answers with a JSON array per page and advertises the
//! following page through a `Link: <...>; rel="next"` header. [`Pages`]
//! walks those pages on demand: nothing is fetched until the first element
//! is requested, and the next page is only fetched once the current one is
//! drained.

use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use serde_json::{Map, Value};
use tracing::debug;

use crate::http::{HttpError, HttpResult, JsonResponse, Request, Response, WebLinkingResponse};

/// Converts one element of a fetched page into a `T`.
///
/// Implemented for every `Fn(&Map<String, Value>) -> HttpResult<T>`.
pub trait Mapping<T> {
    fn map(&self, item: &Map<String, Value>) -> HttpResult<T>;
}

impl<T, F> Mapping<T> for F
where
    F: Fn(&Map<String, Value>) -> HttpResult<T>,
{
    fn map(&self, item: &Map<String, Value>) -> HttpResult<T> {
        self(item)
    }
}

/// A paginated listing: the request for page one plus the element mapping.
///
/// Stateless; every call to [`Pagination::iter`] starts again at page one.
pub struct Pagination<T, R, M> {
    request: R,
    mapping: M,
    _item: PhantomData<fn() -> T>,
}

impl<T, R, M> Pagination<T, R, M>
where
    R: Request,
    M: Mapping<T>,
{
    pub fn new(request: R, mapping: M) -> Self {
        Self {
            request,
            mapping,
            _item: PhantomData,
        }
    }

    /// The request for page one.
    pub fn request(&self) -> &R {
        &self.request
    }

    /// A fresh iterator starting at page one.
    pub fn iter(&self) -> Pages<'_, T, R, M> {
        Pages::new(self.request.clone(), &self.mapping)
    }
}

impl<'a, T, R, M> IntoIterator for &'a Pagination<T, R, M>
where
    R: Request,
    M: Mapping<T>,
{
    type Item = HttpResult<T>;
    type IntoIter = Pages<'a, T, R, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, R: Clone, M: Clone> Clone for Pagination<T, R, M> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            mapping: self.mapping.clone(),
            _item: PhantomData,
        }
    }
}

impl<T, R: PartialEq, M: PartialEq> PartialEq for Pagination<T, R, M> {
    fn eq(&self, other: &Self) -> bool {
        self.request == other.request && self.mapping == other.mapping
    }
}

impl<T, R: fmt::Debug, M> fmt::Debug for Pagination<T, R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pagination")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Cursor over the elements of a paginated listing.
///
/// Yields `Err` once if a page cannot be fetched or understood; the page
/// being built is discarded and the iterator is exhausted afterwards.
pub struct Pages<'a, T, R, M> {
    next: Option<R>,
    page: VecDeque<T>,
    mapping: &'a M,
    fetched: usize,
}

impl<'a, T, R, M> Pages<'a, T, R, M>
where
    R: Request,
    M: Mapping<T>,
{
    pub(crate) fn new(request: R, mapping: &'a M) -> Self {
        Self {
            next: Some(request),
            page: VecDeque::new(),
            mapping,
            fetched: 0,
        }
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.fetched
    }

    fn fetch(&mut self, request: R) -> HttpResult<()> {
        let response = request.fetch()?;
        response.assert_status(200)?;

        let json: JsonResponse = response.view()?;
        let items = json.array()?;
        let mut page = VecDeque::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let object = item.as_object().ok_or_else(|| {
                HttpError::MalformedResponse(format!(
                    "element {position} of {} is not a JSON object",
                    response.back().uri
                ))
            })?;
            page.push_back(self.mapping.map(object)?);
        }

        let links: WebLinkingResponse = response.view()?;
        let next = match links.link("next") {
            Some(link) => Some(request.with_uri(link.resolve(&response.back().uri)?)),
            None => None,
        };

        debug!(
            uri = %response.back().uri,
            items = page.len(),
            more = next.is_some(),
            "fetched page"
        );

        self.page = page;
        self.next = next;
        self.fetched += 1;
        Ok(())
    }
}

impl<T, R, M> Iterator for Pages<'_, T, R, M>
where
    R: Request,
    M: Mapping<T>,
{
    type Item = HttpResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.page.pop_front() {
                return Some(Ok(item));
            }
            let request = self.next.take()?;
            if let Err(e) = self.fetch(request) {
                return Some(Err(e));
            }
        }
    }
}

impl<T, R, M> FusedIterator for Pages<'_, T, R, M>
where
    R: Request,
    M: Mapping<T>,
{
}
