//! Responses and typed views over them.
//!
//! A [`Response`] is read-only once produced. Callers that want a richer
//! interpretation of it (parsed JSON, `Link` relations) ask for a view
//! implementing [`FromResponse`], chosen statically at the call site.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use url::Url;

use crate::http::error::{HttpError, HttpResult};
use crate::http::headers::Headers;
use crate::http::request::RequestParts;

/// The outcome of one fetch.
pub trait Response: fmt::Debug {
    /// The request that produced this response.
    fn back(&self) -> &RequestParts;

    fn status(&self) -> u16;

    fn reason(&self) -> &str;

    fn headers(&self) -> &Headers;

    /// The body as text.
    fn body(&self) -> HttpResult<String>;

    /// The body as raw bytes.
    fn binary(&self) -> &[u8];

    /// Build a typed view of this response.
    fn view<V: FromResponse>(&self) -> HttpResult<V>
    where
        Self: Sized,
    {
        V::from_response(self)
    }

    /// Fail unless the status is `expected`.
    fn assert_status(&self, expected: u16) -> HttpResult<()> {
        if self.status() == expected {
            return Ok(());
        }
        Err(HttpError::UnexpectedStatus {
            expected,
            actual: self.status(),
            reason: self.reason().to_string(),
            uri: self.back().uri.to_string(),
        })
    }
}

/// A type that can be constructed from a response.
pub trait FromResponse: Sized {
    fn from_response<R: Response + ?Sized>(response: &R) -> HttpResult<Self>;
}

/// A response as produced by a wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    back: RequestParts,
    status: u16,
    reason: String,
    headers: Headers,
    body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(
        back: RequestParts,
        status: u16,
        reason: impl Into<String>,
        headers: Headers,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            back,
            status,
            reason: reason.into(),
            headers,
            body: body.into(),
        }
    }
}

impl Response for HttpResponse {
    fn back(&self) -> &RequestParts {
        &self.back
    }

    fn status(&self) -> u16 {
        self.status
    }

    fn reason(&self) -> &str {
        &self.reason
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn body(&self) -> HttpResult<String> {
        String::from_utf8(self.body.clone())
            .map_err(|e| HttpError::MalformedResponse(format!("body is not valid utf-8: {e}")))
    }

    fn binary(&self) -> &[u8] {
        &self.body
    }
}

/// The response body parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    json: Value,
}

impl JsonResponse {
    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn into_json(self) -> Value {
        self.json
    }

    /// The body as a JSON array.
    pub fn array(&self) -> HttpResult<&Vec<Value>> {
        self.json
            .as_array()
            .ok_or_else(|| HttpError::MalformedResponse("expected a JSON array".to_string()))
    }

    /// The body as a JSON object.
    pub fn object(&self) -> HttpResult<&Map<String, Value>> {
        self.json
            .as_object()
            .ok_or_else(|| HttpError::MalformedResponse("expected a JSON object".to_string()))
    }
}

impl FromResponse for JsonResponse {
    fn from_response<R: Response + ?Sized>(response: &R) -> HttpResult<Self> {
        let json = serde_json::from_str(&response.body()?)?;
        Ok(Self { json })
    }
}

/// One entry of a `Link` header (RFC 8288).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    uri: String,
    params: BTreeMap<String, String>,
}

impl Link {
    /// The target, exactly as written between `<` and `>`.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// The target resolved against the URI of the request that returned it.
    pub fn resolve(&self, base: &Url) -> HttpResult<Url> {
        Ok(base.join(&self.uri)?)
    }
}

/// The `Link` relations of a response, keyed by relation type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebLinkingResponse {
    links: BTreeMap<String, Link>,
}

impl WebLinkingResponse {
    pub fn links(&self) -> &BTreeMap<String, Link> {
        &self.links
    }

    /// The link for relation `rel`, e.g. `next`.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.get(&rel.to_ascii_lowercase())
    }
}

impl FromResponse for WebLinkingResponse {
    fn from_response<R: Response + ?Sized>(response: &R) -> HttpResult<Self> {
        let mut links = BTreeMap::new();
        for value in response.headers().get_all("link") {
            for link in parse_links(value)? {
                let rels = link.param("rel").unwrap_or_default().to_ascii_lowercase();
                for rel in rels.split_whitespace() {
                    links.entry(rel.to_string()).or_insert_with(|| link.clone());
                }
            }
        }
        Ok(Self { links })
    }
}

fn malformed_link(value: &str, why: &str) -> HttpError {
    HttpError::MalformedResponse(format!("bad Link header {value:?}: {why}"))
}

/// Parse one `Link` header value: `<uri>; name="value"; ..., <uri>; ...`.
fn parse_links(value: &str) -> HttpResult<Vec<Link>> {
    let mut links = Vec::new();
    let mut rest = value.trim();
    while !rest.is_empty() {
        let inside = rest
            .strip_prefix('<')
            .ok_or_else(|| malformed_link(value, "expected '<'"))?;
        let close = inside
            .find('>')
            .ok_or_else(|| malformed_link(value, "unterminated '<'"))?;
        let uri = inside[..close].trim().to_string();
        rest = &inside[close + 1..];

        let mut params = BTreeMap::new();
        loop {
            rest = rest.trim_start();
            if let Some(param) = rest.strip_prefix(';') {
                let param = param.trim_start();
                let eq = param
                    .find('=')
                    .ok_or_else(|| malformed_link(value, "parameter without '='"))?;
                let name = param[..eq].trim().to_ascii_lowercase();
                let after = param[eq + 1..].trim_start();
                let (text, remaining) = match after.strip_prefix('"') {
                    Some(quoted) => {
                        let end = quoted
                            .find('"')
                            .ok_or_else(|| malformed_link(value, "unterminated quote"))?;
                        (&quoted[..end], &quoted[end + 1..])
                    }
                    None => {
                        let end = after.find([';', ',']).unwrap_or(after.len());
                        (after[..end].trim(), &after[end..])
                    }
                };
                params.insert(name, text.to_string());
                rest = remaining;
            } else if let Some(next) = rest.strip_prefix(',') {
                rest = next.trim_start();
                break;
            } else if rest.is_empty() {
                break;
            } else {
                return Err(malformed_link(value, "expected ';' or ','"));
            }
        }
        links.push(Link { uri, params });
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, headers: Headers, body: &str) -> HttpResponse {
        let back = RequestParts::new(Url::parse("https://api.github.com/repos/a/b/issues").unwrap());
        HttpResponse::new(back, status, "OK", headers, body)
    }

    #[test]
    fn test_assert_status() {
        let ok = response(200, Headers::new(), "");
        assert!(ok.assert_status(200).is_ok());

        let err = ok.assert_status(201).unwrap_err();
        assert!(matches!(err, HttpError::UnexpectedStatus { expected: 201, actual: 200, .. }));
    }

    #[test]
    fn test_json_view() {
        let res = response(200, Headers::new(), r#"[{"number": 1}]"#);
        let json: JsonResponse = res.view().unwrap();
        assert_eq!(json.array().unwrap().len(), 1);
        assert!(json.object().is_err());

        let broken = response(200, Headers::new(), "{not json");
        let err = broken.view::<JsonResponse>().unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_binary_body_is_not_text() {
        let back = RequestParts::new(Url::parse("https://api.github.com/").unwrap());
        let res = HttpResponse::new(back, 200, "OK", Headers::new(), vec![0xff, 0xfe]);
        assert_eq!(res.binary(), &[0xffu8, 0xfe]);
        assert!(matches!(res.body(), Err(HttpError::MalformedResponse(_))));
    }

    #[test]
    fn test_link_header_relations() {
        let mut headers = Headers::new();
        headers.append(
            "Link",
            "<https://api.github.com/repositories/1/issues?page=2>; rel=\"next\", \
             <https://api.github.com/repositories/1/issues?page=5>; rel=\"last\"",
        );
        let links: WebLinkingResponse = response(200, headers, "[]").view().unwrap();

        assert_eq!(links.links().len(), 2);
        assert_eq!(
            links.link("next").unwrap().uri(),
            "https://api.github.com/repositories/1/issues?page=2"
        );
        assert_eq!(links.link("LAST").unwrap().param("rel"), Some("last"));
        assert!(links.link("prev").is_none());
    }

    #[test]
    fn test_link_relative_target_and_unquoted_params() {
        let mut headers = Headers::new();
        headers.append("Link", "</repos/a/b/issues?page=3>; rel=next; title=x");
        let res = response(200, headers, "[]");
        let links: WebLinkingResponse = res.view().unwrap();

        let next = links.link("next").unwrap();
        assert_eq!(next.param("title"), Some("x"));
        assert_eq!(
            next.resolve(&res.back().uri).unwrap().as_str(),
            "https://api.github.com/repos/a/b/issues?page=3"
        );
    }

    #[test]
    fn test_malformed_link_header() {
        let mut headers = Headers::new();
        headers.append("Link", "https://no-brackets; rel=\"next\"");
        let err = response(200, headers, "[]").view::<WebLinkingResponse>().unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_no_link_header() {
        let links: WebLinkingResponse = response(200, Headers::new(), "[]").view().unwrap();
        assert!(links.links().is_empty());
    }
}
