//! In-memory stand-in for the git hosting service.
//!
//! Resources are thin handles over one shared [`Storage`](crate::storage::Storage)
//! document; every read is a path query and every write a directive batch.
//!
//! ```text
//! /github
//!   repos
//!     repo @coords="jeff/test"
//!       name   test
//!       git
//!         refs
//!           reference { ref, sha }
//! ```
//!
//! # Usage
//!
//! ```
//! use hubkit::mock::MockGithub;
//!
//! let github = MockGithub::new("jeff")?;
//! let refs = github.repos().create("test")?.references()?;
//! refs.create("refs/heads/master", "6dcb09b5")?;
//! assert_eq!(refs.get("refs/heads/master").sha()?, "6dcb09b5");
//! # Ok::<(), hubkit::mock::MockError>(())
//! ```

mod coordinates;
mod error;
mod github;
mod references;
mod repo;

pub use coordinates::Coordinates;
pub use error::{MockError, MockResult};
pub use github::MockGithub;
pub use references::{MockReference, MockReferences};
pub use repo::{MockRepo, MockRepos};
