//! Path expressions.
//!
//! A compact XPath 1.0 subset, enough to address the mock service's
//! document:
//!
//! ```text
//! /github/repos/repo[@coords='jeff/test']/git/refs/reference[ref='refs/heads/master']/sha
//! //reference/ref[starts-with(., 'refs/tags')]
//! /github/repos/repo[last()]/name/text()
//! ```
//!
//! Supported: absolute and relative location paths, `//`, `*`, `.`, `..`,
//! `@name`, `@*`, `text()`, `node()`, predicates (positional or boolean),
//! `=`, `!=`, `<`, `<=`, `>`, `>=`, `and`, `or`, parentheses, string and
//! number literals, and the functions `starts-with`, `contains`, `concat`,
//! `not`, `position`, `last`, `count`, `string`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A path expression that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path {expression:?} at offset {offset}: {message}")]
pub struct PathError {
    pub expression: String,
    pub offset: usize,
    pub message: String,
}

/// A parsed location path.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    source: String,
    pub(crate) absolute: bool,
    pub(crate) steps: Vec<Step>,
}

impl Path {
    /// The expression as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = lex(s)?;
        let mut parser = Parser {
            source: s,
            tokens,
            pos: 0,
        };
        let (absolute, steps) = parser.location_path()?;
        if let Some(token) = parser.peek() {
            return Err(parser.error_at(token.offset, "unexpected trailing input"));
        }
        Ok(Path {
            source: s.to_string(),
            absolute,
            steps,
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Quote `value` as a string literal usable inside a path expression.
///
/// Values containing both quote characters are spelled with `concat()`.
pub fn literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    DescendantOrSelf,
    Parent,
    SelfNode,
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Name(String),
    /// `*`: any element, or any attribute on the attribute axis
    Any,
    Text,
    /// `node()`
    Node,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub(crate) axis: Axis,
    pub(crate) test: NodeTest,
    pub(crate) predicates: Vec<Expr>,
}

impl Step {
    fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    StartsWith,
    Contains,
    Concat,
    Not,
    Position,
    Last,
    Count,
    String,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "starts-with" => Function::StartsWith,
            "contains" => Function::Contains,
            "concat" => Function::Concat,
            "not" => Function::Not,
            "position" => Function::Position,
            "last" => Function::Last,
            "count" => Function::Count,
            "string" => Function::String,
            _ => return None,
        })
    }

    fn accepts(&self, arity: usize) -> bool {
        match self {
            Function::StartsWith | Function::Contains => arity == 2,
            Function::Concat => arity >= 2,
            Function::Not | Function::Count => arity == 1,
            Function::Position | Function::Last => arity == 0,
            Function::String => arity <= 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Path { absolute: bool, steps: Vec<Step> },
    Literal(String),
    Number(f64),
    Call(Function, Vec<Expr>),
}

// ==================== Lexer ====================

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Dot,
    DotDot,
    Star,
    Op(CompareOp),
    Name(String),
    Literal(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: Kind,
    offset: usize,
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn lex(source: &str) -> Result<Vec<Token>, PathError> {
    let error = |offset: usize, message: &str| PathError {
        expression: source.to_string(),
        offset,
        message: message.to_string(),
    };

    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let rest = &source[offset..];
        let (kind, len) = if rest.starts_with("//") {
            (Kind::DoubleSlash, 2)
        } else if rest.starts_with("..") {
            (Kind::DotDot, 2)
        } else if rest.starts_with("!=") {
            (Kind::Op(CompareOp::Ne), 2)
        } else if rest.starts_with("<=") {
            (Kind::Op(CompareOp::Le), 2)
        } else if rest.starts_with(">=") {
            (Kind::Op(CompareOp::Ge), 2)
        } else if c == '.' && !rest[1..].starts_with(|d: char| d.is_ascii_digit()) {
            (Kind::Dot, 1)
        } else if c.is_ascii_digit() || c == '.' {
            let len = rest
                .find(|d: char| !(d.is_ascii_digit() || d == '.'))
                .unwrap_or(rest.len());
            let number = rest[..len]
                .parse::<f64>()
                .map_err(|_| error(offset, "malformed number"))?;
            (Kind::Number(number), len)
        } else if c == '\'' || c == '"' {
            let end = rest[1..]
                .find(c)
                .ok_or_else(|| error(offset, "unterminated string literal"))?;
            (Kind::Literal(rest[1..1 + end].to_string()), end + 2)
        } else if is_name_start(c) {
            let len = rest.find(|d: char| !is_name_char(d)).unwrap_or(rest.len());
            (Kind::Name(rest[..len].to_string()), len)
        } else {
            let kind = match c {
                '/' => Kind::Slash,
                '[' => Kind::LBracket,
                ']' => Kind::RBracket,
                '(' => Kind::LParen,
                ')' => Kind::RParen,
                '@' => Kind::At,
                ',' => Kind::Comma,
                '*' => Kind::Star,
                '=' => Kind::Op(CompareOp::Eq),
                '<' => Kind::Op(CompareOp::Lt),
                '>' => Kind::Op(CompareOp::Gt),
                _ => return Err(error(offset, &format!("unexpected character {c:?}"))),
            };
            (kind, c.len_utf8())
        };
        tokens.push(Token { kind, offset });
        while chars.peek().is_some_and(|&(i, _)| i < offset + len) {
            chars.next();
        }
    }
    Ok(tokens)
}

// ==================== Parser ====================

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&Kind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_second(&self) -> Option<&Kind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.source.len(), |t| t.offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &Kind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &Kind, what: &str) -> Result<(), PathError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn error(&self, message: &str) -> PathError {
        self.error_at(self.offset(), message)
    }

    fn error_at(&self, offset: usize, message: &str) -> PathError {
        PathError {
            expression: self.source.to_string(),
            offset,
            message: message.to_string(),
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek_kind(), Some(Kind::Name(n)) if n == keyword)
    }

    /// `'/' relative?` | `'//' relative` | `relative`
    fn location_path(&mut self) -> Result<(bool, Vec<Step>), PathError> {
        let mut steps = Vec::new();
        match self.peek_kind() {
            Some(Kind::Slash) => {
                self.pos += 1;
                if !self.starts_step() {
                    return Ok((true, steps));
                }
                self.relative_path(&mut steps)?;
                Ok((true, steps))
            }
            Some(Kind::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                self.relative_path(&mut steps)?;
                Ok((true, steps))
            }
            _ => {
                self.relative_path(&mut steps)?;
                Ok((false, steps))
            }
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(Kind::Name(_) | Kind::Star | Kind::At | Kind::Dot | Kind::DotDot)
        )
    }

    fn relative_path(&mut self, steps: &mut Vec<Step>) -> Result<(), PathError> {
        steps.push(self.step()?);
        loop {
            if self.eat(&Kind::Slash) {
                steps.push(self.step()?);
            } else if self.eat(&Kind::DoubleSlash) {
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                steps.push(self.step()?);
            } else {
                return Ok(());
            }
        }
    }

    fn step(&mut self) -> Result<Step, PathError> {
        if !self.starts_step() {
            return Err(self.error("expected a location step"));
        }
        let mut step = match self.advance().map(|t| t.kind) {
            Some(Kind::Dot) => return Ok(Step::new(Axis::SelfNode, NodeTest::Node)),
            Some(Kind::DotDot) => return Ok(Step::new(Axis::Parent, NodeTest::Node)),
            Some(Kind::At) => match self.advance().map(|t| t.kind) {
                Some(Kind::Name(name)) => Step::new(Axis::Attribute, NodeTest::Name(name)),
                Some(Kind::Star) => Step::new(Axis::Attribute, NodeTest::Any),
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error("expected attribute name after '@'"));
                }
            },
            Some(Kind::Star) => Step::new(Axis::Child, NodeTest::Any),
            Some(Kind::Name(name)) => {
                if self.peek_kind() == Some(&Kind::LParen) {
                    let test = match name.as_str() {
                        "text" => NodeTest::Text,
                        "node" => NodeTest::Node,
                        _ => return Err(self.error(&format!("{name}() is not a node test"))),
                    };
                    self.pos += 1;
                    self.expect(&Kind::RParen, "')'")?;
                    Step::new(Axis::Child, test)
                } else {
                    Step::new(Axis::Child, NodeTest::Name(name))
                }
            }
            _ => return Err(self.error("expected a location step")),
        };
        while self.eat(&Kind::LBracket) {
            step.predicates.push(self.expr()?);
            self.expect(&Kind::RBracket, "']'")?;
        }
        Ok(step)
    }

    fn expr(&mut self) -> Result<Expr, PathError> {
        let mut left = self.and_expr()?;
        while self.is_keyword("or") {
            self.pos += 1;
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, PathError> {
        let mut left = self.compare_expr()?;
        while self.is_keyword("and") {
            self.pos += 1;
            let right = self.compare_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn compare_expr(&mut self) -> Result<Expr, PathError> {
        let mut left = self.primary()?;
        while let Some(Kind::Op(op)) = self.peek_kind() {
            let op = *op;
            self.pos += 1;
            let right = self.primary()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr, PathError> {
        match self.peek_kind() {
            Some(Kind::Literal(text)) => {
                let text = text.clone();
                self.pos += 1;
                Ok(Expr::Literal(text))
            }
            Some(Kind::Number(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Kind::LParen) => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(&Kind::RParen, "')'")?;
                Ok(inner)
            }
            Some(Kind::Name(name))
                if self.peek_second() == Some(&Kind::LParen) && name != "text" && name != "node" =>
            {
                self.call()
            }
            _ if self.starts_path() => {
                let (absolute, steps) = self.location_path()?;
                Ok(Expr::Path { absolute, steps })
            }
            _ => Err(self.error("expected an expression")),
        }
    }

    fn starts_path(&self) -> bool {
        self.starts_step() || matches!(self.peek_kind(), Some(Kind::Slash | Kind::DoubleSlash))
    }

    fn call(&mut self) -> Result<Expr, PathError> {
        let offset = self.offset();
        let name = match self.advance().map(|t| t.kind) {
            Some(Kind::Name(name)) => name,
            _ => return Err(self.error_at(offset, "expected a function name")),
        };
        let function = Function::lookup(&name)
            .ok_or_else(|| self.error_at(offset, &format!("unknown function {name}()")))?;
        self.expect(&Kind::LParen, "'('")?;

        let mut args = Vec::new();
        if !self.eat(&Kind::RParen) {
            loop {
                args.push(self.expr()?);
                if self.eat(&Kind::RParen) {
                    break;
                }
                self.expect(&Kind::Comma, "',' or ')'")?;
            }
        }

        if !function.accepts(args.len()) {
            return Err(self.error_at(
                offset,
                &format!("{name}() does not take {} argument(s)", args.len()),
            ));
        }
        if function == Function::Count && !matches!(args[0], Expr::Path { .. }) {
            return Err(self.error_at(offset, "count() expects a location path"));
        }
        Ok(Expr::Call(function, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn test_absolute_path() {
        let path = parse("/github/repos/repo");
        assert!(path.is_absolute());
        assert_eq!(path.steps.len(), 3);
        assert_eq!(path.steps[2].test, NodeTest::Name("repo".to_string()));
        assert_eq!(path.to_string(), "/github/repos/repo");
    }

    #[test]
    fn test_document_node_only() {
        let path = parse("/");
        assert!(path.is_absolute());
        assert!(path.steps.is_empty());
    }

    #[test]
    fn test_descendant_steps() {
        let path = parse("//reference/ref");
        assert_eq!(path.steps.len(), 3);
        assert_eq!(path.steps[0].axis, Axis::DescendantOrSelf);

        let path = parse("a//b");
        assert!(!path.is_absolute());
        assert_eq!(path.steps[1].axis, Axis::DescendantOrSelf);
    }

    #[test]
    fn test_predicates_and_functions() {
        let path = parse("/github/repos/repo[@coords='a/b' and name!=\"x\"]/git/refs/reference[ref[starts-with(., 'refs/tags')]][1]/sha/text()");
        let reference = &path.steps[5];
        assert_eq!(reference.predicates.len(), 2);
        assert_eq!(reference.predicates[1], Expr::Number(1.0));
        assert_eq!(path.steps[7].test, NodeTest::Text);

        let repo = &path.steps[2];
        assert!(matches!(repo.predicates[0], Expr::And(..)));
    }

    #[test]
    fn test_special_steps() {
        let path = parse("../@*/.");
        assert_eq!(path.steps[0].axis, Axis::Parent);
        assert_eq!(path.steps[1].axis, Axis::Attribute);
        assert_eq!(path.steps[1].test, NodeTest::Any);
        assert_eq!(path.steps[2].axis, Axis::SelfNode);
    }

    #[test]
    fn test_names_with_dashes_and_dots() {
        let path = parse("/a-b/c.d[position() >= 2 or last()]");
        assert_eq!(path.steps[1].test, NodeTest::Name("c.d".to_string()));
    }

    #[test]
    fn test_errors_carry_offsets() {
        let err = "/github/[".parse::<Path>().unwrap_err();
        assert_eq!(err.offset, 8);

        let err = "/a[@]".parse::<Path>().unwrap_err();
        assert_eq!(err.offset, 4);

        let err = "/a['open".parse::<Path>().unwrap_err();
        assert_eq!(err.offset, 3);

        let err = "/a[frob(1)]".parse::<Path>().unwrap_err();
        assert!(err.message.contains("unknown function"));

        let err = "/a[starts-with(.)]".parse::<Path>().unwrap_err();
        assert!(err.message.contains("argument"));

        let err = "/a[count('x')]".parse::<Path>().unwrap_err();
        assert!(err.message.contains("location path"));

        assert!("".parse::<Path>().is_err());
        assert!("/a]".parse::<Path>().is_err());
        assert!("/a#".parse::<Path>().is_err());
    }

    #[test]
    fn test_literal_quoting() {
        assert_eq!(literal("refs/heads/master"), "'refs/heads/master'");
        assert_eq!(literal("it's"), "\"it's\"");
        assert_eq!(literal("a'b\"c"), "concat('a', \"'\", 'b\"c')");

        let quoted = format!("/a[b={}]", literal("a'b\"c"));
        assert!(quoted.parse::<Path>().is_ok());
    }
}
