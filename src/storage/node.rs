//! The document tree.
//!
//! A [`Document`] owns exactly one root element. Elements carry a name,
//! ordered attributes, a text value and ordered child elements; there are no
//! comments, processing instructions or namespaces.
//!
//! Nodes are addressed by a [`Locator`]: the child indexes leading from the
//! (nameless) document node to the element. `[]` is the document node and
//! `[0]` is the root element.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::error::{StorageError, StorageResult};

/// Child indexes from the document node down to one element.
pub(crate) type Locator = Vec<usize>;

/// One element of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// The text directly inside this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// String value: own text followed by the values of all children.
    pub fn value(&self) -> String {
        let mut out = String::new();
        self.collect_value(&mut out);
        out
    }

    fn collect_value(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_value(out);
        }
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Replace the content of this element with `text`.
    pub(crate) fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.children.clear();
    }

    /// Append a child, returning its index.
    pub(crate) fn push(&mut self, child: Node) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    pub(crate) fn remove_child(&mut self, index: usize) -> Option<Node> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    pub(crate) fn child_at(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub(crate) fn child_at_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.children.get_mut(index)
    }

    fn validate(&self) -> StorageResult<()> {
        if !is_valid_name(&self.name) {
            return Err(StorageError::InvalidName(self.name.clone()));
        }
        if let Some((name, _)) = self.attributes.iter().find(|(n, _)| !is_valid_name(n)) {
            return Err(StorageError::InvalidName(name.clone()));
        }
        self.children.iter().try_for_each(Node::validate)
    }

    fn write_xml(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, Escaped(value))?;
        }
        if self.text.is_empty() && self.children.is_empty() {
            return f.write_str("/>");
        }
        write!(f, ">{}", Escaped(&self.text))?;
        for child in &self.children {
            child.write_xml(f)?;
        }
        write!(f, "</{}>", self.name)
    }
}

/// check if `name` can be used as an element or attribute name
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// A tree with a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    // nameless holder of the root element, addressed as `[]`
    top: Node,
}

impl Document {
    /// An empty document whose root element is called `root`.
    pub fn new(root: &str) -> StorageResult<Self> {
        if !is_valid_name(root) {
            return Err(StorageError::InvalidName(root.to_string()));
        }
        Ok(Self::with_root(Node::new(root)))
    }

    /// A document around an existing tree, checking every name in it.
    pub fn from_root(root: Node) -> StorageResult<Self> {
        root.validate()?;
        Ok(Self::with_root(root))
    }

    pub(crate) fn with_root(root: Node) -> Self {
        let mut top = Node::new("");
        top.push(root);
        Self { top }
    }

    pub fn root(&self) -> &Node {
        // always exactly one child, see `with_root`
        &self.top.children[0]
    }

    pub(crate) fn node(&self, locator: &[usize]) -> Option<&Node> {
        locator.iter().try_fold(&self.top, |node, &i| node.child_at(i))
    }

    pub(crate) fn node_mut(&mut self, locator: &[usize]) -> Option<&mut Node> {
        locator
            .iter()
            .try_fold(&mut self.top, |node, &i| node.child_at_mut(i))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        self.root().write_xml(f)
    }
}

struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&apos;")?,
                c => write!(f, "{c}")?,
            }
        }
        Ok(())
    }
}
