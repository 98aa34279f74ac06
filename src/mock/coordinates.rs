//! Repository coordinates: `user/repo`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mock::error::{MockError, MockResult};

/// The owner and name of a repository.
///
/// Neither part may be empty or contain `/` or whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinates {
    user: String,
    repo: String,
}

impl Coordinates {
    pub fn new(user: impl Into<String>, repo: impl Into<String>) -> MockResult<Self> {
        let coords = Self {
            user: user.into(),
            repo: repo.into(),
        };
        if !valid_part(&coords.user) || !valid_part(&coords.repo) {
            return Err(MockError::InvalidCoordinates(format!(
                "{}/{}",
                coords.user, coords.repo
            )));
        }
        Ok(coords)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }
}

fn valid_part(part: &str) -> bool {
    !part.is_empty() && !part.contains('/') && !part.contains(char::is_whitespace)
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.repo)
    }
}

impl FromStr for Coordinates {
    type Err = MockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user, repo) = s
            .split_once('/')
            .ok_or_else(|| MockError::InvalidCoordinates(s.to_string()))?;
        Self::new(user, repo).map_err(|_| MockError::InvalidCoordinates(s.to_string()))
    }
}

impl TryFrom<String> for Coordinates {
    type Error = MockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinates> for String {
    fn from(coords: Coordinates) -> Self {
        coords.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let coords: Coordinates = "jeff/test".parse().unwrap();
        assert_eq!(coords.user(), "jeff");
        assert_eq!(coords.repo(), "test");
        assert_eq!(coords.to_string(), "jeff/test");
        assert_eq!(coords, Coordinates::new("jeff", "test").unwrap());
    }

    #[test]
    fn test_invalid() {
        for bad in ["", "jeff", "/test", "jeff/", "a/b/c", "je ff/test"] {
            assert!(
                matches!(bad.parse::<Coordinates>(), Err(MockError::InvalidCoordinates(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_serde_as_string() {
        let coords = Coordinates::new("jeff", "test").unwrap();
        let json = serde_json::to_string(&coords).unwrap();
        assert_eq!(json, "\"jeff/test\"");
        let back: Coordinates = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coords);
        assert!(serde_json::from_str::<Coordinates>("\"nope\"").is_err());
    }
}
