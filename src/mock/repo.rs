//! Mock repositories: `/github/repos/repo[@coords]`.

use tracing::debug;

use crate::mock::coordinates::Coordinates;
use crate::mock::error::{MockError, MockResult};
use crate::mock::references::MockReferences;
use crate::storage::{literal, Directives, Storage};

/// Path of the repository node for `coords`.
pub(crate) fn repo_xpath(coords: &Coordinates) -> String {
    format!("/github/repos/repo[@coords={}]", literal(&coords.to_string()))
}

/// The repositories of the mock service.
#[derive(Debug, Clone, PartialEq)]
pub struct MockRepos {
    storage: Storage,
    login: String,
}

impl MockRepos {
    pub(crate) fn new(storage: Storage, login: String) -> Self {
        Self { storage, login }
    }

    /// Create `login/name`.
    pub fn create(&self, name: &str) -> MockResult<MockRepo> {
        let coords = Coordinates::new(self.login.as_str(), name)?;
        let repo = self.get(&coords);
        if repo.exists()? {
            return Err(MockError::RepoExists(coords));
        }
        self.storage.apply(
            &Directives::new()
                .xpath(repo_xpath(&coords))
                .strict(0)
                .xpath("/github/repos")
                .strict(1)
                .add("repo")
                .attr("coords", coords.to_string())
                .add("name")
                .set(name)
                .up()
                .add("git"),
        )?;
        debug!(%coords, "created repo");
        Ok(repo)
    }

    /// Handle to the repository at `coords`; does not check that it exists.
    pub fn get(&self, coords: &Coordinates) -> MockRepo {
        MockRepo {
            storage: self.storage.clone(),
            login: self.login.clone(),
            coords: coords.clone(),
        }
    }
}

/// One mock repository.
#[derive(Debug, Clone, PartialEq)]
pub struct MockRepo {
    storage: Storage,
    login: String,
    coords: Coordinates,
}

impl MockRepo {
    pub(crate) fn new(storage: Storage, login: String, coords: Coordinates) -> Self {
        Self {
            storage,
            login,
            coords,
        }
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coords
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn exists(&self) -> MockResult<bool> {
        Ok(!self.storage.nodes(&repo_xpath(&self.coords))?.is_empty())
    }

    /// The git references of this repository.
    pub fn references(&self) -> MockResult<MockReferences> {
        MockReferences::new(self.storage.clone(), self.login.clone(), self.coords.clone())
    }
}
