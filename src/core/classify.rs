//! Find the literal carrying a static module reference.
//!
//! Three matchers are tried in order (require call, import declaration,
//! export-from declaration); the first match wins. Nothing is mutated here.

use crate::syntax::{Expression, Literal, LiteralValue, Node, NodeKind, Span, SyntaxFrontend, SyntaxTree};
use serde::Serialize;

/// Node kinds worth inspecting; every other kind is skipped outright.
pub const RELEVANT_KINDS: [NodeKind; 4] = [
    NodeKind::ImportDeclaration,
    NodeKind::CallExpression,
    NodeKind::ExportAllDeclaration,
    NodeKind::ExportNamedDeclaration,
];

pub fn is_relevant(kind: NodeKind) -> bool {
    RELEVANT_KINDS.contains(&kind)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Require,
    Import,
    Export,
}

/// `require('x')` with a bare `require` identifier as callee and a literal
/// first argument. Member callees (`obj.require`) and computed arguments
/// don't match.
pub fn require_source(node: &Node) -> Option<&Literal> {
    let Node::CallExpression(call) = node else {
        return None;
    };

    match (&call.callee, call.arguments.first()) {
        (Expression::Identifier(name), Some(Expression::Literal(literal))) if name == "require" => {
            Some(literal)
        }
        _ => None,
    }
}

pub fn import_source(node: &Node) -> Option<&Literal> {
    match node {
        Node::ImportDeclaration { source, .. } => Some(source),
        _ => None,
    }
}

/// `export * from 'x'` and `export { a } from 'x'`; local exports have no source.
pub fn export_source(node: &Node) -> Option<&Literal> {
    match node {
        Node::ExportAllDeclaration { source, .. } => Some(source),
        Node::ExportNamedDeclaration {
            source: Some(source),
            ..
        } => Some(source),
        _ => None,
    }
}

pub fn classify_with_kind(node: &Node) -> Option<(ReferenceKind, &Literal)> {
    require_source(node)
        .map(|lit| (ReferenceKind::Require, lit))
        .or_else(|| import_source(node).map(|lit| (ReferenceKind::Import, lit)))
        .or_else(|| export_source(node).map(|lit| (ReferenceKind::Export, lit)))
}

pub fn classify(node: &Node) -> Option<&Literal> {
    classify_with_kind(node).map(|(_, literal)| literal)
}

/// A matched module reference, detached from the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleReference {
    pub kind: ReferenceKind,
    pub value: LiteralValue,
    pub span: Span,
}

impl ModuleReference {
    /// The referenced path, when the literal is a string.
    pub fn specifier(&self) -> Option<&str> {
        match &self.value {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// All module references of a tree, in traversal order.
pub fn collect_references<F>(frontend: &F, tree: &SyntaxTree) -> Vec<ModuleReference>
where
    F: SyntaxFrontend + ?Sized,
{
    let mut references = Vec::new();
    frontend.traverse(tree, &mut |node| {
        if !is_relevant(node.kind()) {
            return;
        }
        if let Some((kind, literal)) = classify_with_kind(node) {
            references.push(ModuleReference {
                kind,
                value: literal.value.clone(),
                span: literal.span,
            });
        }
    });
    references
}
