//! Header multimap shared by requests and responses.

use std::collections::BTreeMap;

/// HTTP headers: lower-cased name to values in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, Vec<String>>);

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, keeping any values already present.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.0
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Remove every value of a header.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.0.remove(&name.to_ascii_lowercase())
    }

    /// All values of a header, empty if absent.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First value of a header.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    /// Iterate over `(name, values)` pairs, names in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "application/json");

        assert!(headers.contains("content-type"));
        assert_eq!(headers.first("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_values_keep_order() {
        let headers: Headers = [("Link", "<a>; rel=\"next\""), ("link", "<b>; rel=\"last\"")]
            .into_iter()
            .collect();

        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers.get_all("Link"),
            &["<a>; rel=\"next\"".to_string(), "<b>; rel=\"last\"".to_string()]
        );
    }

    #[test]
    fn test_remove() {
        let mut headers = Headers::new();
        headers.append("Accept", "text/plain");
        assert_eq!(headers.remove("accept"), Some(vec!["text/plain".to_string()]));
        assert!(headers.is_empty());
        assert!(headers.get_all("accept").is_empty());
    }
}
