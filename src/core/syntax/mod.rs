//! Parse source text into the small tree the classifier reads.
//!
//! The tree is an owned projection of the parser's AST that keeps only the node
//! kinds able to carry a static module reference, nested as they appear in the
//! source. Everything else is dropped during projection.

mod oxc;

pub use self::oxc::OxcFrontend;

use crate::config::ParserOptions;
use crate::error::Result;
use serde::Serialize;

/// Byte offsets into the original source text, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Node type tags, named after their ESTree counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Program,
    Literal,
    CallExpression,
    Identifier,
    ImportDeclaration,
    ExportNamedDeclaration,
    ExportAllDeclaration,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    /// BigInt and RegExp literals, kept as raw source text.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

impl Literal {
    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Self {
            value: LiteralValue::String(value.into()),
            span,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Shallow description of an expression in callee or argument position.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    Other,
}

impl Expression {
    pub fn kind(&self) -> NodeKind {
        match self {
            Expression::Literal(_) => NodeKind::Literal,
            Expression::Identifier(_) => NodeKind::Identifier,
            Expression::Other => NodeKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub span: Span,
    pub callee: Expression,
    pub arguments: Vec<Expression>,
    /// Relevant nodes nested inside the callee or arguments.
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program {
        body: Vec<Node>,
    },
    CallExpression(CallExpression),
    ImportDeclaration {
        span: Span,
        source: Literal,
    },
    ExportNamedDeclaration {
        span: Span,
        source: Option<Literal>,
        children: Vec<Node>,
    },
    ExportAllDeclaration {
        span: Span,
        source: Literal,
    },
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Program { .. } => NodeKind::Program,
            Node::CallExpression(_) => NodeKind::CallExpression,
            Node::ImportDeclaration { .. } => NodeKind::ImportDeclaration,
            Node::ExportNamedDeclaration { .. } => NodeKind::ExportNamedDeclaration,
            Node::ExportAllDeclaration { .. } => NodeKind::ExportAllDeclaration,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Program { body } => body,
            Node::CallExpression(call) => &call.children,
            Node::ExportNamedDeclaration { children, .. } => children,
            Node::ImportDeclaration { .. } | Node::ExportAllDeclaration { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    pub root: Node,
}

impl SyntaxTree {
    pub fn new(body: Vec<Node>) -> Self {
        Self {
            root: Node::Program { body },
        }
    }
}

/// Visit every node of `tree` depth-first, parents before children.
pub fn walk(tree: &SyntaxTree, visit: &mut dyn FnMut(&Node)) {
    let mut stack = vec![&tree.root];
    while let Some(node) = stack.pop() {
        visit(node);
        stack.extend(node.children().iter().rev());
    }
}

/// A parser plus tree traversal, swappable without touching the classifier.
pub trait SyntaxFrontend {
    fn parse(&self, source: &str, options: &ParserOptions) -> Result<SyntaxTree>;

    fn traverse(&self, tree: &SyntaxTree, visit: &mut dyn FnMut(&Node)) {
        walk(tree, visit);
    }
}
