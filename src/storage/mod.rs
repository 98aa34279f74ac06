//! storage layer for the mock service
//!
//! One mutable tree holds the entire simulated remote state. The upper layer
//! (the `mock` resources) reads it with path expressions and writes it with
//! directive batches; it never touches the tree directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Storage                             │
//! │        (shared handle: apply / xpath / nodes / xml)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │    path     │       │ directives  │       │    eval     │
//!  │  (parser)   │       │  (writes)   │       │   (reads)   │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!         │                     │                     │
//!         └─────────────────────┼─────────────────────┘
//!                               │
//!                               ▼
//!                        ┌─────────────┐
//!                        │    node     │
//!                        │ (Document)  │
//!                        └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use hubkit::storage::{Directives, Storage};
//!
//! let storage = Storage::in_memory();
//! storage.apply(
//!     &Directives::new()
//!         .xpath("/github")
//!         .add_if("repos")
//!         .add("repo")
//!         .attr("coords", "jeff/test"),
//! )?;
//! assert_eq!(storage.xpath("/github/repos/repo/@coords")?, vec!["jeff/test"]);
//! # Ok::<(), hubkit::storage::StorageError>(())
//! ```

mod directives;
mod error;
mod eval;
mod node;
mod path;
mod store;

pub use directives::{Directive, Directives};
pub use error::{StorageError, StorageResult};
pub use node::{is_valid_name, Document, Node};
pub use path::{literal, Path, PathError};
pub use store::{Storage, StorageConfig};
