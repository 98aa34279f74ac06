//! Evaluation of parsed paths against a document.

use std::cmp::Ordering;

use tracing::trace;

use crate::storage::node::{Document, Locator};
use crate::storage::path::{Axis, CompareOp, Expr, Function, NodeTest, Path, Step};

/// Something a path can select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Item {
    /// an element, or the document node for `[]`
    Node(Locator),
    /// the text of an element
    Text(Locator),
    /// the attribute at this index of an element
    Attribute(Locator, usize),
}

impl Item {
    fn locator(&self) -> &[usize] {
        match self {
            Item::Node(l) | Item::Text(l) | Item::Attribute(l, _) => l.as_slice(),
        }
    }

    /// Sort key in document order: an element, then its attributes, then
    /// its text, then its children.
    fn order_key(&self) -> (&[usize], u8, usize) {
        match self {
            Item::Node(l) => (l.as_slice(), 0, 0),
            Item::Attribute(l, i) => (l.as_slice(), 1, *i),
            Item::Text(l) => (l.as_slice(), 2, 0),
        }
    }

    fn document_order(a: &Item, b: &Item) -> Ordering {
        a.order_key().cmp(&b.order_key())
    }

    /// XPath string value.
    pub(crate) fn string_value(&self, doc: &Document) -> String {
        let Some(node) = doc.node(self.locator()) else {
            return String::new();
        };
        match self {
            Item::Node(_) => node.value(),
            Item::Text(_) => node.text().to_string(),
            Item::Attribute(_, i) => node
                .attributes()
                .get(*i)
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
enum Value {
    Nodes(Vec<Item>),
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Position of the item being tested inside the candidate list of a step.
#[derive(Debug, Clone, Copy)]
struct Context<'a> {
    item: &'a Item,
    position: usize,
    size: usize,
}

/// Select the items `path` addresses, in document order without duplicates.
///
/// Relative paths are evaluated from each of the `context` nodes.
pub(crate) fn select(doc: &Document, path: &Path, context: &[Locator]) -> Vec<Item> {
    let start: Vec<Item> = if path.absolute {
        vec![Item::Node(Vec::new())]
    } else {
        context.iter().cloned().map(Item::Node).collect()
    };
    let items = walk(doc, &path.steps, start);
    trace!(path = %path, matched = items.len(), "evaluated path");
    items
}

fn walk(doc: &Document, steps: &[Step], start: Vec<Item>) -> Vec<Item> {
    let mut current = start;
    for step in steps {
        let mut next = Vec::new();
        for item in &current {
            let mut candidates = axis(doc, step, item);
            for predicate in &step.predicates {
                let size = candidates.len();
                candidates = candidates
                    .into_iter()
                    .enumerate()
                    .filter(|(i, candidate)| {
                        let ctx = Context {
                            item: candidate,
                            position: i + 1,
                            size,
                        };
                        matches_predicate(doc, predicate, ctx)
                    })
                    .map(|(_, candidate)| candidate)
                    .collect();
            }
            next.extend(candidates);
        }
        next.sort_by(Item::document_order);
        next.dedup();
        current = next;
    }
    current
}

/// Candidates of one step from one context item, in axis order.
fn axis(doc: &Document, step: &Step, item: &Item) -> Vec<Item> {
    let mut out = Vec::new();
    match (step.axis, item) {
        (Axis::SelfNode, _) => {
            if accepts(doc, &step.test, item) {
                out.push(item.clone());
            }
        }
        (Axis::Parent, Item::Node(l)) => {
            if let Some((_, parent)) = l.split_last() {
                let parent = Item::Node(parent.to_vec());
                if accepts(doc, &step.test, &parent) {
                    out.push(parent);
                }
            }
        }
        (Axis::Parent, Item::Text(l) | Item::Attribute(l, _)) => {
            let parent = Item::Node(l.clone());
            if accepts(doc, &step.test, &parent) {
                out.push(parent);
            }
        }
        (Axis::Child, Item::Node(l)) => children(doc, l, &step.test, &mut out),
        (Axis::DescendantOrSelf, Item::Node(l)) => {
            if accepts(doc, &step.test, item) {
                out.push(item.clone());
            }
            descendants(doc, l, &step.test, &mut out);
        }
        (Axis::DescendantOrSelf, _) => {
            if accepts(doc, &step.test, item) {
                out.push(item.clone());
            }
        }
        (Axis::Attribute, Item::Node(l)) => {
            if let Some(node) = doc.node(l) {
                for (i, (name, _)) in node.attributes().iter().enumerate() {
                    let wanted = match &step.test {
                        NodeTest::Name(n) => n == name,
                        NodeTest::Any | NodeTest::Node => true,
                        NodeTest::Text => false,
                    };
                    if wanted {
                        out.push(Item::Attribute(l.clone(), i));
                    }
                }
            }
        }
        // text and attributes have no children or attributes
        (Axis::Child | Axis::Attribute, _) => {}
    }
    out
}

fn children(doc: &Document, l: &[usize], test: &NodeTest, out: &mut Vec<Item>) {
    let Some(node) = doc.node(l) else { return };
    let text = Item::Text(l.to_vec());
    if accepts(doc, test, &text) {
        out.push(text);
    }
    for i in 0..node.children().len() {
        let mut child = l.to_vec();
        child.push(i);
        let child = Item::Node(child);
        if accepts(doc, test, &child) {
            out.push(child);
        }
    }
}

fn descendants(doc: &Document, l: &[usize], test: &NodeTest, out: &mut Vec<Item>) {
    let Some(node) = doc.node(l) else { return };
    let text = Item::Text(l.to_vec());
    if accepts(doc, test, &text) {
        out.push(text);
    }
    for i in 0..node.children().len() {
        let mut child = l.to_vec();
        child.push(i);
        let item = Item::Node(child.clone());
        if accepts(doc, test, &item) {
            out.push(item);
        }
        descendants(doc, &child, test, out);
    }
}

/// Node test on the principal (element) axes.
fn accepts(doc: &Document, test: &NodeTest, item: &Item) -> bool {
    match item {
        Item::Node(l) => match test {
            NodeTest::Node => true,
            // the document node has no name
            NodeTest::Name(name) => !l.is_empty() && doc.node(l).is_some_and(|n| n.name() == name),
            NodeTest::Any => !l.is_empty(),
            NodeTest::Text => false,
        },
        Item::Text(l) => match test {
            NodeTest::Text | NodeTest::Node => doc.node(l).is_some_and(|n| !n.text().is_empty()),
            _ => false,
        },
        Item::Attribute(..) => matches!(test, NodeTest::Node),
    }
}

fn matches_predicate(doc: &Document, predicate: &Expr, ctx: Context<'_>) -> bool {
    match evaluate(doc, predicate, ctx) {
        Value::Num(n) => n == ctx.position as f64,
        other => to_bool(&other),
    }
}

fn evaluate(doc: &Document, expr: &Expr, ctx: Context<'_>) -> Value {
    match expr {
        Expr::Or(a, b) => {
            Value::Bool(to_bool(&evaluate(doc, a, ctx)) || to_bool(&evaluate(doc, b, ctx)))
        }
        Expr::And(a, b) => {
            Value::Bool(to_bool(&evaluate(doc, a, ctx)) && to_bool(&evaluate(doc, b, ctx)))
        }
        Expr::Compare(op, a, b) => {
            let left = evaluate(doc, a, ctx);
            let right = evaluate(doc, b, ctx);
            Value::Bool(compare(doc, *op, &left, &right))
        }
        Expr::Path { absolute, steps } => {
            let start = if *absolute {
                Item::Node(Vec::new())
            } else {
                ctx.item.clone()
            };
            Value::Nodes(walk(doc, steps, vec![start]))
        }
        Expr::Literal(s) => Value::Str(s.clone()),
        Expr::Number(n) => Value::Num(*n),
        Expr::Call(function, args) => call(doc, *function, args, ctx),
    }
}

fn call(doc: &Document, function: Function, args: &[Expr], ctx: Context<'_>) -> Value {
    let string_arg = |i: usize| {
        args.get(i)
            .map(|a| to_string(doc, &evaluate(doc, a, ctx)))
            .unwrap_or_default()
    };
    match function {
        Function::StartsWith => Value::Bool(string_arg(0).starts_with(&string_arg(1))),
        Function::Contains => Value::Bool(string_arg(0).contains(&string_arg(1))),
        Function::Concat => Value::Str((0..args.len()).map(string_arg).collect()),
        Function::Not => Value::Bool(!args.first().is_some_and(|a| to_bool(&evaluate(doc, a, ctx)))),
        Function::Position => Value::Num(ctx.position as f64),
        Function::Last => Value::Num(ctx.size as f64),
        Function::Count => match args.first().map(|a| evaluate(doc, a, ctx)) {
            Some(Value::Nodes(items)) => Value::Num(items.len() as f64),
            _ => Value::Num(0.0),
        },
        Function::String => match args.first() {
            Some(_) => Value::Str(string_arg(0)),
            None => Value::Str(ctx.item.string_value(doc)),
        },
    }
}

fn compare(doc: &Document, op: CompareOp, left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nodes(a), Value::Nodes(b)) => {
            let b: Vec<String> = b.iter().map(|i| i.string_value(doc)).collect();
            a.iter().any(|x| {
                let x = x.string_value(doc);
                b.iter().any(|y| compare_atoms(op, &Value::Str(x.clone()), &Value::Str(y.clone())))
            })
        }
        (Value::Nodes(items), Value::Bool(_)) => {
            compare_atoms(op, &Value::Bool(!items.is_empty()), right)
        }
        (Value::Bool(_), Value::Nodes(items)) => {
            compare_atoms(op, left, &Value::Bool(!items.is_empty()))
        }
        (Value::Nodes(items), atom) => items
            .iter()
            .any(|i| compare_atoms(op, &node_as(atom, i.string_value(doc)), atom)),
        (atom, Value::Nodes(items)) => items
            .iter()
            .any(|i| compare_atoms(op, atom, &node_as(atom, i.string_value(doc)))),
        _ => compare_atoms(op, left, right),
    }
}

/// A node's string value converted to the type of the value it is compared with.
fn node_as(other: &Value, value: String) -> Value {
    match other {
        Value::Num(_) => Value::Num(parse_number(&value)),
        _ => Value::Str(value),
    }
}

fn compare_atoms(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::Eq | CompareOp::Ne => {
            let equal = match (left, right) {
                (Value::Bool(_), _) | (_, Value::Bool(_)) => atom_bool(left) == atom_bool(right),
                (Value::Num(_), _) | (_, Value::Num(_)) => atom_number(left) == atom_number(right),
                _ => atom_string(left) == atom_string(right),
            };
            equal == (op == CompareOp::Eq)
        }
        _ => {
            let (a, b) = (atom_number(left), atom_number(right));
            match op {
                CompareOp::Lt => a < b,
                CompareOp::Le => a <= b,
                CompareOp::Gt => a > b,
                _ => a >= b,
            }
        }
    }
}

fn atom_bool(value: &Value) -> bool {
    to_bool(value)
}

fn atom_number(value: &Value) -> f64 {
    match value {
        Value::Num(n) => *n,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Str(s) => parse_number(s),
        Value::Nodes(_) => f64::NAN,
    }
}

fn atom_string(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Num(n) => format_number(*n),
        Value::Bool(b) => b.to_string(),
        Value::Nodes(_) => String::new(),
    }
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Nodes(items) => !items.is_empty(),
        Value::Str(s) => !s.is_empty(),
        Value::Num(n) => *n != 0.0 && !n.is_nan(),
        Value::Bool(b) => *b,
    }
}

fn to_string(doc: &Document, value: &Value) -> String {
    match value {
        Value::Nodes(items) => items.first().map(|i| i.string_value(doc)).unwrap_or_default(),
        atom => atom_string(atom),
    }
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
