//! Directive batches: ordered structural edits of the document.
//!
//! A batch moves a cursor (a set of elements) around the document and edits
//! whatever the cursor points at:
//!
//! ```text
//! XPATH '/github/repos';ADD 'repo';ATTR 'coords', 'jeff/test';ADD 'name';SET 'test';UP;ADD 'git';
//! ```
//!
//! Building a batch never fails; problems are reported when the batch is
//! applied, and a batch that fails is not applied at all (see
//! [`Storage::apply`](crate::storage::Storage::apply)).

use std::fmt;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::eval::{self, Item};
use crate::storage::node::{is_valid_name, Document, Locator, Node};
use crate::storage::path::{literal, Path};

/// One edit step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Move the cursor to the elements matched by a path. Relative paths
    /// start from every element of the cursor.
    XPath(String),
    /// Append a new child to every cursor element; the cursor moves to the
    /// new children.
    Add(String),
    /// Like `Add`, but reuse the first child with that name if there is one.
    AddIf(String),
    /// Replace the content of every cursor element with text.
    Set(String),
    /// Set an attribute on every cursor element.
    Attr(String, String),
    /// Move the cursor to the parents of its elements.
    Up,
    /// Remove the cursor elements; the cursor moves to their parents.
    Remove,
    /// Fail unless the cursor holds exactly this many elements.
    Strict(usize),
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::XPath(path) => write!(f, "XPATH {}", literal(path)),
            Directive::Add(name) => write!(f, "ADD {}", literal(name)),
            Directive::AddIf(name) => write!(f, "ADDIF {}", literal(name)),
            Directive::Set(text) => write!(f, "SET {}", literal(text)),
            Directive::Attr(name, value) => write!(f, "ATTR {}, {}", literal(name), literal(value)),
            Directive::Up => f.write_str("UP"),
            Directive::Remove => f.write_str("REMOVE"),
            Directive::Strict(n) => write!(f, "STRICT '{n}'"),
        }
    }
}

/// An ordered batch of directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    steps: Vec<Directive>,
}

impl Directives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn xpath(self, path: impl Into<String>) -> Self {
        self.push(Directive::XPath(path.into()))
    }

    pub fn add(self, name: impl Into<String>) -> Self {
        self.push(Directive::Add(name.into()))
    }

    pub fn add_if(self, name: impl Into<String>) -> Self {
        self.push(Directive::AddIf(name.into()))
    }

    pub fn set(self, text: impl Into<String>) -> Self {
        self.push(Directive::Set(text.into()))
    }

    pub fn attr(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Directive::Attr(name.into(), value.into()))
    }

    pub fn up(self) -> Self {
        self.push(Directive::Up)
    }

    pub fn remove(self) -> Self {
        self.push(Directive::Remove)
    }

    pub fn strict(self, count: usize) -> Self {
        self.push(Directive::Strict(count))
    }

    /// Append every step of `other`.
    pub fn append(mut self, other: Directives) -> Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn push(mut self, directive: Directive) -> Self {
        self.steps.push(directive);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.steps.iter()
    }
}

impl fmt::Display for Directives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{step};")?;
        }
        Ok(())
    }
}

impl FromIterator<Directive> for Directives {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Directives {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Apply `directives` to `doc` in place.
///
/// On error `doc` may be partially edited; callers work on a copy.
pub(crate) fn apply(doc: &mut Document, directives: &Directives) -> StorageResult<()> {
    // start at the root element
    let mut cursor: Vec<Locator> = vec![vec![0]];
    for (index, directive) in directives.iter().enumerate() {
        cursor = step(doc, directive, cursor).map_err(|e| match e {
            Failure::Storage(e) => e,
            Failure::Reason(reason) => StorageError::Directive {
                index,
                directive: directive.to_string(),
                reason,
            },
        })?;
    }
    Ok(())
}

enum Failure {
    Storage(StorageError),
    Reason(String),
}

impl From<StorageError> for Failure {
    fn from(e: StorageError) -> Self {
        Failure::Storage(e)
    }
}

fn fail<T>(reason: impl Into<String>) -> Result<T, Failure> {
    Err(Failure::Reason(reason.into()))
}

fn step(doc: &mut Document, directive: &Directive, cursor: Vec<Locator>) -> Result<Vec<Locator>, Failure> {
    match directive {
        Directive::XPath(expression) => {
            let path: Path = expression.parse().map_err(StorageError::from)?;
            let mut next = Vec::new();
            for item in eval::select(doc, &path, &cursor) {
                match item {
                    Item::Node(locator) => next.push(locator),
                    _ => return fail("path selects text or attributes, not elements"),
                }
            }
            Ok(next)
        }
        Directive::Add(name) => {
            check_name(name)?;
            let mut next = Vec::with_capacity(cursor.len());
            for locator in cursor {
                let index = element_mut(doc, &locator)?.push(Node::new(name.as_str()));
                next.push(child_of(&locator, index));
            }
            Ok(next)
        }
        Directive::AddIf(name) => {
            check_name(name)?;
            let mut next = Vec::with_capacity(cursor.len());
            for locator in cursor {
                let node = element_mut(doc, &locator)?;
                let index = match node.children().iter().position(|c| c.name() == name) {
                    Some(index) => index,
                    None => node.push(Node::new(name.as_str())),
                };
                next.push(child_of(&locator, index));
            }
            Ok(next)
        }
        Directive::Set(text) => {
            // content of an ancestor replaces its cursor descendants as well
            let next = outermost(cursor);
            for locator in &next {
                element_mut(doc, locator)?.set_text(text);
            }
            Ok(next)
        }
        Directive::Attr(name, value) => {
            check_name(name)?;
            for locator in &cursor {
                element_mut(doc, locator)?.set_attribute(name, value);
            }
            Ok(cursor)
        }
        Directive::Up => {
            let mut parents = Vec::with_capacity(cursor.len());
            for locator in &cursor {
                match locator.split_last() {
                    Some((_, parent)) => parents.push(parent.to_vec()),
                    None => return fail("the document node has no parent"),
                }
            }
            parents.sort();
            parents.dedup();
            Ok(parents)
        }
        Directive::Remove => remove(doc, cursor),
        Directive::Strict(count) => {
            if cursor.len() == *count {
                Ok(cursor)
            } else {
                fail(format!("expected {count} node(s), found {}", cursor.len()))
            }
        }
    }
}

fn remove(doc: &mut Document, cursor: Vec<Locator>) -> Result<Vec<Locator>, Failure> {
    if cursor.iter().any(|l| l.len() < 2) {
        return fail("the document node and the root element can't be removed");
    }
    let mut doomed = outermost(cursor);
    doomed.sort_by(|a, b| b.cmp(a));

    let mut parents: Vec<Locator> = Vec::with_capacity(doomed.len());
    for locator in doomed {
        let Some((&index, parent)) = locator.split_last() else {
            continue;
        };
        let node = doc
            .node_mut(parent)
            .ok_or_else(|| Failure::Reason(format!("no element at {parent:?}")))?;
        node.remove_child(index);
        for other in parents.iter_mut() {
            shift_after_removal(other, parent, index);
        }
        parents.push(parent.to_vec());
    }
    parents.sort();
    parents.dedup();
    Ok(parents)
}

/// Fix up `locator` after child `index` of `parent` was removed.
fn shift_after_removal(locator: &mut [usize], parent: &[usize], index: usize) {
    let depth = parent.len();
    if locator.len() > depth && locator.starts_with(parent) && locator[depth] > index {
        locator[depth] -= 1;
    }
}

/// Sorted cursor without the elements that sit below another cursor element.
fn outermost(mut cursor: Vec<Locator>) -> Vec<Locator> {
    cursor.sort();
    cursor.dedup();
    let mut kept: Vec<Locator> = Vec::with_capacity(cursor.len());
    for locator in cursor {
        // sorted, so an ancestor precedes all of its descendants
        if !kept.iter().any(|k| locator.starts_with(k)) {
            kept.push(locator);
        }
    }
    kept
}

fn child_of(parent: &[usize], index: usize) -> Locator {
    let mut child = parent.to_vec();
    child.push(index);
    child
}

fn element_mut<'a>(doc: &'a mut Document, locator: &[usize]) -> Result<&'a mut Node, Failure> {
    if locator.is_empty() {
        return fail("the document node can't be edited");
    }
    doc.node_mut(locator)
        .ok_or_else(|| Failure::Reason(format!("no element at {locator:?}")))
}

fn check_name(name: &str) -> Result<(), Failure> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()).into())
    }
}
