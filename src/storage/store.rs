//! The shared document store.
//!
//! [`Storage`] is a cheap handle (clone it freely) around one document.
//! Reads take a shared lock; [`Storage::apply`] edits a private copy under
//! the exclusive lock and swaps it in only once the whole batch succeeded,
//! so readers see either the old or the new document, never a mix.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::storage::directives::{self, Directives};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::eval;
use crate::storage::node::{Document, Node};
use crate::storage::path::Path;

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Name of the root element.
    pub root: String,
    /// JSON snapshot file; `None` keeps everything in memory.
    pub path: Option<PathBuf>,
    /// Start an empty document if the snapshot file does not exist.
    pub create_if_missing: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "github".to_string(),
            path: None,
            create_if_missing: true,
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root element name.
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Persist the document to this file after every batch.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set create_if_missing flag.
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }
}

/// Handle to one shared document.
///
/// Clones share the document; equality is identity of that document.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    document: RwLock<Document>,
    path: Option<PathBuf>,
}

impl Storage {
    /// An empty in-memory document rooted at `github`.
    pub fn in_memory() -> Self {
        Self::from_document(Document::with_root(Node::new("github")), None)
    }

    /// A store persisted to the snapshot file at `path`.
    pub fn open(path: impl AsRef<FsPath>) -> StorageResult<Self> {
        Self::with_config(StorageConfig::new().path(path.as_ref()))
    }

    pub fn with_config(config: StorageConfig) -> StorageResult<Self> {
        let document = match &config.path {
            Some(path) if path.exists() => load(path, &config.root)?,
            Some(path) if !config.create_if_missing => {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no snapshot at {}", path.display()),
                )));
            }
            Some(path) => {
                let document = Document::new(&config.root)?;
                persist(path, &document)?;
                document
            }
            None => Document::new(&config.root)?,
        };
        debug!(root = %config.root, path = ?config.path, "opened storage");
        Ok(Self::from_document(document, config.path))
    }

    fn from_document(document: Document, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                document: RwLock::new(document),
                path,
            }),
        }
    }

    /// The snapshot file, if any.
    pub fn path(&self) -> Option<&FsPath> {
        self.inner.path.as_deref()
    }

    /// Apply a batch atomically.
    ///
    /// Either every directive takes effect or none does.
    pub fn apply(&self, directives: &Directives) -> StorageResult<()> {
        let mut document = self.inner.document.write();
        let mut next = document.clone();
        directives::apply(&mut next, directives)?;
        if let Some(path) = &self.inner.path {
            persist(path, &next)?;
        }
        *document = next;
        debug!(steps = directives.len(), "applied directives");
        Ok(())
    }

    /// String values of everything `path` selects, in document order.
    pub fn xpath(&self, path: &str) -> StorageResult<Vec<String>> {
        let path: Path = path.parse()?;
        let document = self.inner.document.read();
        Ok(eval::select(&document, &path, &[])
            .iter()
            .map(|item| item.string_value(&document))
            .collect())
    }

    /// Copies of the elements `path` selects, in document order.
    pub fn nodes(&self, path: &str) -> StorageResult<Vec<Node>> {
        let path: Path = path.parse()?;
        let document = self.inner.document.read();
        Ok(eval::select(&document, &path, &[])
            .into_iter()
            .filter_map(|item| match item {
                eval::Item::Node(locator) if !locator.is_empty() => document.node(&locator).cloned(),
                _ => None,
            })
            .collect())
    }

    /// A copy of the current document.
    pub fn document(&self) -> Document {
        self.inner.document.read().clone()
    }

    /// The current document as XML.
    pub fn xml(&self) -> String {
        self.inner.document.read().to_string()
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl PartialEq for Storage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Storage {}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

fn load(path: &FsPath, root: &str) -> StorageResult<Document> {
    let corrupted = |reason: String| StorageError::Corrupted {
        path: path.to_path_buf(),
        reason,
    };
    let reader = BufReader::new(File::open(path)?);
    let node: Node = serde_json::from_reader(reader).map_err(|e| corrupted(e.to_string()))?;
    if node.name() != root {
        return Err(corrupted(format!(
            "root element is {:?}, expected {root:?}",
            node.name()
        )));
    }
    Document::from_root(node).map_err(|e| corrupted(e.to_string()))
}

/// Write the snapshot next to its final location, then rename it into place.
fn persist(path: &FsPath, document: &Document) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => FsPath::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, document.root())?;
        writer.flush()?;
    }
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
