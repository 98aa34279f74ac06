//! Entry point of the mock service.

use tracing::debug;

use crate::mock::error::MockResult;
use crate::mock::repo::MockRepos;
use crate::storage::{Directives, Storage};

/// The mock service as seen by one logged-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct MockGithub {
    storage: Storage,
    login: String,
}

impl MockGithub {
    /// A service over a fresh in-memory document.
    pub fn new(login: impl Into<String>) -> MockResult<Self> {
        Self::with_storage(Storage::in_memory(), login)
    }

    /// A service over `storage`; makes sure `/github/repos` exists.
    pub fn with_storage(storage: Storage, login: impl Into<String>) -> MockResult<Self> {
        storage.apply(&Directives::new().xpath("/github").strict(1).add_if("repos"))?;
        let login = login.into();
        debug!(%login, "mock github ready");
        Ok(Self { storage, login })
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The logged-in user.
    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn repos(&self) -> MockRepos {
        MockRepos::new(self.storage.clone(), self.login.clone())
    }
}
