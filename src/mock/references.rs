//! Git references of a mock repository.
//!
//! Everything lives under the repository's refs container:
//!
//! ```text
//! /github/repos/repo[@coords='jeff/test']/git/refs
//!     reference
//!         ref   refs/heads/master
//!         sha   6dcb09b5b57875f334f61aebed695e2e4193db5e
//!     reference
//!         ...
//! ```
//!
//! Every operation is a path query or a directive batch against the shared
//! storage; nothing is cached in the handles.

use serde_json::{Map, Value};
use tracing::debug;

use crate::mock::coordinates::Coordinates;
use crate::mock::error::{MockError, MockResult};
use crate::mock::repo::{repo_xpath, MockRepo};
use crate::storage::{literal, Directives, Storage};

/// The references of one repository.
#[derive(Debug, Clone, PartialEq)]
pub struct MockReferences {
    storage: Storage,
    login: String,
    coords: Coordinates,
}

impl MockReferences {
    /// Make sure the refs container of `coords` exists.
    ///
    /// Does nothing to the document if it already does, or if there is no
    /// such repository.
    pub fn new(storage: Storage, login: impl Into<String>, coords: Coordinates) -> MockResult<Self> {
        storage.apply(
            &Directives::new()
                .xpath(format!("{}/git", repo_xpath(&coords)))
                .add_if("refs"),
        )?;
        Ok(Self {
            storage,
            login: login.into(),
            coords,
        })
    }

    pub fn repo(&self) -> MockRepo {
        MockRepo::new(self.storage.clone(), self.login.clone(), self.coords.clone())
    }

    /// Add a reference and return a handle to it.
    ///
    /// No uniqueness check: creating the same ref twice stores it twice.
    pub fn create(&self, reference: &str, sha: &str) -> MockResult<MockReference> {
        self.storage.apply(
            &Directives::new()
                .xpath(self.xpath())
                .add("reference")
                .add("ref")
                .set(reference)
                .up()
                .add("sha")
                .set(sha)
                .up(),
        )?;
        debug!(coords = %self.coords, reference, sha, "created reference");
        Ok(self.get(reference))
    }

    /// Handle to `identifier`; does not check that it exists.
    pub fn get(&self, identifier: &str) -> MockReference {
        MockReference {
            storage: self.storage.clone(),
            login: self.login.clone(),
            coords: self.coords.clone(),
            reference: identifier.to_string(),
        }
    }

    /// All references, in creation order.
    pub fn iterate(&self) -> MockResult<impl Iterator<Item = MockReference> + '_> {
        let nodes = self.storage.nodes(&format!("{}/reference", self.xpath()))?;
        Ok(nodes
            .into_iter()
            .filter_map(|node| node.child("ref").map(|r| r.value()))
            .map(move |name| self.get(&name)))
    }

    /// References whose name starts with `refs/<subnamespace>`.
    pub fn iterate_in(&self, subnamespace: &str) -> MockResult<impl Iterator<Item = MockReference> + '_> {
        let names = self.storage.xpath(&format!(
            "{}/reference/ref[starts-with(., {})]",
            self.xpath(),
            literal(&format!("refs/{subnamespace}"))
        ))?;
        Ok(names.into_iter().map(move |name| self.get(&name)))
    }

    /// Tags (`refs/tags/...`).
    pub fn tags(&self) -> MockResult<impl Iterator<Item = MockReference> + '_> {
        self.iterate_in("tags")
    }

    /// Branches (`refs/heads/...`).
    pub fn heads(&self) -> MockResult<impl Iterator<Item = MockReference> + '_> {
        self.iterate_in("heads")
    }

    /// Remove every reference called `identifier`; absent refs are ignored.
    pub fn remove(&self, identifier: &str) -> MockResult<()> {
        self.storage.apply(
            &Directives::new()
                .xpath(format!("{}/reference[ref={}]", self.xpath(), literal(identifier)))
                .remove(),
        )?;
        debug!(coords = %self.coords, reference = identifier, "removed reference");
        Ok(())
    }

    fn xpath(&self) -> String {
        format!("{}/git/refs", repo_xpath(&self.coords))
    }
}

/// One git reference of a mock repository.
#[derive(Debug, Clone, PartialEq)]
pub struct MockReference {
    storage: Storage,
    login: String,
    coords: Coordinates,
    reference: String,
}

impl MockReference {
    /// The ref name, e.g. `refs/heads/master`.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn repo(&self) -> MockRepo {
        MockRepo::new(self.storage.clone(), self.login.clone(), self.coords.clone())
    }

    /// The stored fields as a JSON object, e.g. `{"ref": .., "sha": ..}`.
    pub fn json(&self) -> MockResult<Value> {
        let node = self
            .storage
            .nodes(&self.xpath())?
            .into_iter()
            .next()
            .ok_or_else(|| MockError::NotFound(format!("{} in {}", self.reference, self.coords)))?;
        let mut object = Map::new();
        for child in node.children() {
            object
                .entry(child.name().to_string())
                .or_insert_with(|| Value::String(child.value()));
        }
        Ok(Value::Object(object))
    }

    /// The object the reference points at.
    pub fn sha(&self) -> MockResult<String> {
        match self.json()?.get("sha").and_then(Value::as_str) {
            Some(sha) => Ok(sha.to_string()),
            None => Err(MockError::NotFound(format!("sha of {} in {}", self.reference, self.coords))),
        }
    }

    /// Set string fields of the reference, e.g. `{"sha": "..."}`.
    pub fn patch(&self, json: &Value) -> MockResult<()> {
        let fields = json
            .as_object()
            .ok_or_else(|| MockError::InvalidPatch(format!("expected a JSON object, got {json}")))?;
        let mut dirs = Directives::new().xpath(self.xpath());
        for (name, value) in fields {
            let value = value
                .as_str()
                .ok_or_else(|| MockError::InvalidPatch(format!("field {name:?} is not a string")))?;
            dirs = dirs.add_if(name.as_str()).set(value).up();
        }
        self.storage.apply(&dirs)?;
        debug!(coords = %self.coords, reference = %self.reference, fields = fields.len(), "patched reference");
        Ok(())
    }

    fn xpath(&self) -> String {
        format!(
            "{}/git/refs/reference[ref={}]",
            repo_xpath(&self.coords),
            literal(&self.reference)
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;

    use super::*;
    use crate::mock::github::MockGithub;

    fn references(github: &MockGithub, name: &str) -> MockReferences {
        github.repos().create(name).unwrap().references().unwrap()
    }

    fn names(refs: impl Iterator<Item = MockReference>) -> Vec<String> {
        refs.map(|r| r.reference().to_string()).collect()
    }

    #[test]
    fn test_create_then_get() {
        let github = MockGithub::new("jeff").unwrap();
        let refs = references(&github, "test");

        let created = refs.create("refs/heads/feature", "abc123").unwrap();
        assert_eq!(created.reference(), "refs/heads/feature");
        assert_eq!(refs.get("refs/heads/feature").sha().unwrap(), "abc123");
        assert_eq!(created, refs.get("refs/heads/feature"));
    }

    #[test]
    fn test_construction_is_idempotent() {
        let github = MockGithub::new("jeff").unwrap();
        let repo = github.repos().create("test").unwrap();

        repo.references().unwrap();
        let before = github.storage().xml();
        repo.references().unwrap();
        MockReferences::new(github.storage().clone(), "jeff", repo.coordinates().clone()).unwrap();

        assert_eq!(github.storage().xml(), before);
        assert_eq!(github.storage().xpath("//git/refs").unwrap().len(), 1);
    }

    #[test]
    fn test_heads_and_tags() {
        let github = MockGithub::new("jeff").unwrap();
        let refs = references(&github, "test");
        refs.create("refs/tags/v1", "3").unwrap();
        refs.create("refs/heads/master", "1").unwrap();
        refs.create("refs/heads/dev", "2").unwrap();

        let heads: BTreeSet<String> = names(refs.heads().unwrap()).into_iter().collect();
        assert_eq!(
            heads,
            BTreeSet::from(["refs/heads/master".to_string(), "refs/heads/dev".to_string()])
        );
        assert_eq!(names(refs.heads().unwrap()).len(), 2);
        assert_eq!(names(refs.tags().unwrap()), vec!["refs/tags/v1"]);
        assert!(refs.iterate_in("pull").unwrap().next().is_none());
    }

    #[test]
    fn test_iterate_in_creation_order() {
        let github = MockGithub::new("jeff").unwrap();
        let refs = references(&github, "test");
        refs.create("refs/heads/master", "1").unwrap();
        refs.create("refs/tags/v1", "2").unwrap();
        refs.create("refs/heads/dev", "3").unwrap();

        assert_eq!(
            names(refs.iterate().unwrap()),
            vec!["refs/heads/master", "refs/tags/v1", "refs/heads/dev"]
        );
    }

    #[test]
    fn test_remove() {
        let github = MockGithub::new("jeff").unwrap();
        let refs = references(&github, "test");
        refs.create("refs/heads/master", "1").unwrap();
        refs.create("refs/heads/dev", "2").unwrap();
        refs.create("refs/tags/v1", "3").unwrap();

        refs.remove("refs/heads/dev").unwrap();
        assert_eq!(names(refs.iterate().unwrap()), vec!["refs/heads/master", "refs/tags/v1"]);

        let before = github.storage().xml();
        refs.remove("refs/heads/dev").unwrap();
        assert_eq!(github.storage().xml(), before);
    }

    #[test]
    fn test_duplicates_are_stored_and_removed_together() {
        let github = MockGithub::new("jeff").unwrap();
        let refs = references(&github, "test");
        refs.create("refs/heads/master", "1").unwrap();
        refs.create("refs/heads/master", "2").unwrap();

        assert_eq!(refs.iterate().unwrap().count(), 2);
        assert_eq!(refs.get("refs/heads/master").sha().unwrap(), "1");

        refs.remove("refs/heads/master").unwrap();
        assert_eq!(refs.iterate().unwrap().count(), 0);
    }

    #[test]
    fn test_repositories_are_isolated() {
        let github = MockGithub::new("jeff").unwrap();
        let first = references(&github, "first");
        let second = references(&github, "second");

        first.create("refs/heads/master", "1").unwrap();
        assert_eq!(first.iterate().unwrap().count(), 1);
        assert_eq!(second.iterate().unwrap().count(), 0);
        assert!(second.get("refs/heads/master").json().unwrap_err().is_not_found());

        second.remove("refs/heads/master").unwrap();
        assert_eq!(first.iterate().unwrap().count(), 1);
    }

    #[test]
    fn test_unusual_names_are_quoted() {
        let github = MockGithub::new("jeff").unwrap();
        let refs = references(&github, "test");
        let name = "refs/tags/it's \"odd\"";
        refs.create(name, "1").unwrap();

        assert_eq!(refs.get(name).sha().unwrap(), "1");
        assert_eq!(names(refs.tags().unwrap()), vec![name]);
        refs.remove(name).unwrap();
        assert_eq!(refs.iterate().unwrap().count(), 0);
    }

    #[test]
    fn test_json_and_patch() {
        let github = MockGithub::new("jeff").unwrap();
        let refs = references(&github, "test");
        let master = refs.create("refs/heads/master", "1").unwrap();

        assert_eq!(master.json().unwrap(), json!({"ref": "refs/heads/master", "sha": "1"}));

        master.patch(&json!({"sha": "2", "url": "https://example.com"})).unwrap();
        assert_eq!(master.sha().unwrap(), "2");
        assert_eq!(master.json().unwrap()["url"], "https://example.com");

        assert!(matches!(master.patch(&json!(["sha"])), Err(MockError::InvalidPatch(_))));
        assert!(matches!(master.patch(&json!({"sha": 3})), Err(MockError::InvalidPatch(_))));
        assert!(matches!(master.patch(&json!({"bad name": "x"})), Err(MockError::Storage(_))));
        assert_eq!(master.sha().unwrap(), "2");
    }

    #[test]
    fn test_handles_point_back() {
        let github = MockGithub::new("jeff").unwrap();
        let repo = github.repos().create("test").unwrap();
        let refs = repo.references().unwrap();

        assert_eq!(refs.repo(), repo);
        assert_eq!(refs.get("refs/heads/x").repo(), repo);
        assert!(refs.get("refs/heads/x").sha().unwrap_err().is_not_found());
    }

    #[test]
    fn test_references_of_missing_repo() {
        let github = MockGithub::new("jeff").unwrap();
        let refs = github.repos().get(&"jeff/ghost".parse().unwrap()).references().unwrap();

        // nothing to attach to, so nothing happens
        refs.create("refs/heads/master", "1").unwrap();
        assert_eq!(refs.iterate().unwrap().count(), 0);
    }
}
