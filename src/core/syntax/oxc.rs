use oxc_allocator::Allocator;
use oxc_ast::ast;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;

use super::{CallExpression, Expression, Literal, LiteralValue, Node, Span, SyntaxFrontend, SyntaxTree};
use crate::config::{ParserOptions, SourceKind};
use crate::error::{Error, Result};

/// JavaScript / TypeScript front end backed by the oxc parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcFrontend;

impl SyntaxFrontend for OxcFrontend {
    fn parse(&self, source: &str, options: &ParserOptions) -> Result<SyntaxTree> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, source_type(options))
            .with_options(ParseOptions {
                allow_return_outside_function: options.allow_return_outside_function,
                preserve_parens: false,
                ..ParseOptions::default()
            })
            .parse();

        if !ret.errors.is_empty() {
            let offset = ret
                .errors
                .first()
                .and_then(|diagnostic| diagnostic.labels.as_ref())
                .and_then(|labels| labels.first())
                .map(|label| label.offset());
            let messages = ret.errors.iter().map(|e| e.to_string()).collect();
            return Err(Error::parse_syntax_error(messages, offset));
        }

        let mut projector = Projector::new(source);
        projector.visit_program(&ret.program);
        Ok(SyntaxTree::new(projector.finish()))
    }
}

fn source_type(options: &ParserOptions) -> SourceType {
    let base = match options.source_type {
        SourceKind::Module => SourceType::mjs(),
        SourceKind::Script => SourceType::cjs(),
    };
    base.with_typescript(options.typescript).with_jsx(options.jsx)
}

fn span(span: oxc_span::Span) -> Span {
    Span::new(span.start as usize, span.end as usize)
}

fn string_literal(lit: &ast::StringLiteral<'_>) -> Literal {
    Literal::string(lit.value.as_str(), span(lit.span))
}

/// Collects the module-reference-relevant nodes of an oxc AST.
///
/// Each relevant node opens a frame; nodes found while walking its subtree
/// become its children.
struct Projector<'s> {
    source: &'s str,
    frames: Vec<Vec<Node>>,
}

impl<'s> Projector<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            frames: vec![Vec::new()],
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.frames.pop().unwrap_or_default()
    }

    fn push(&mut self, node: Node) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(node);
        }
    }

    fn nested(&mut self, walk_children: impl FnOnce(&mut Self)) -> Vec<Node> {
        self.frames.push(Vec::new());
        walk_children(self);
        self.frames.pop().unwrap_or_default()
    }

    fn raw(&self, s: oxc_span::Span) -> String {
        self.source
            .get(s.start as usize..s.end as usize)
            .unwrap_or_default()
            .to_string()
    }

    fn expression(&self, expr: &ast::Expression<'_>) -> Expression {
        let literal = |value: LiteralValue, s: oxc_span::Span| {
            Expression::Literal(Literal {
                value,
                span: span(s),
            })
        };

        match expr {
            ast::Expression::Identifier(ident) => {
                Expression::Identifier(ident.name.as_str().to_string())
            }
            ast::Expression::StringLiteral(lit) => Expression::Literal(string_literal(lit)),
            ast::Expression::NumericLiteral(lit) => literal(LiteralValue::Number(lit.value), lit.span),
            ast::Expression::BooleanLiteral(lit) => literal(LiteralValue::Boolean(lit.value), lit.span),
            ast::Expression::NullLiteral(lit) => literal(LiteralValue::Null, lit.span),
            ast::Expression::BigIntLiteral(lit) => literal(LiteralValue::Raw(self.raw(lit.span)), lit.span),
            ast::Expression::RegExpLiteral(lit) => literal(LiteralValue::Raw(self.raw(lit.span)), lit.span),
            _ => Expression::Other,
        }
    }

    fn argument(&self, arg: &ast::Argument<'_>) -> Expression {
        arg.as_expression()
            .map_or(Expression::Other, |expr| self.expression(expr))
    }
}

impl<'a> Visit<'a> for Projector<'_> {
    fn visit_call_expression(&mut self, it: &ast::CallExpression<'a>) {
        let callee = self.expression(&it.callee);
        let arguments = it.arguments.iter().map(|arg| self.argument(arg)).collect();
        let children = self.nested(|this| walk::walk_call_expression(this, it));

        self.push(Node::CallExpression(CallExpression {
            span: span(it.span),
            callee,
            arguments,
            children,
        }));
    }

    fn visit_import_declaration(&mut self, it: &ast::ImportDeclaration<'a>) {
        self.push(Node::ImportDeclaration {
            span: span(it.span),
            source: string_literal(&it.source),
        });
    }

    fn visit_export_named_declaration(&mut self, it: &ast::ExportNamedDeclaration<'a>) {
        let children = self.nested(|this| walk::walk_export_named_declaration(this, it));

        self.push(Node::ExportNamedDeclaration {
            span: span(it.span),
            source: it.source.as_ref().map(string_literal),
            children,
        });
    }

    fn visit_export_all_declaration(&mut self, it: &ast::ExportAllDeclaration<'a>) {
        self.push(Node::ExportAllDeclaration {
            span: span(it.span),
            source: string_literal(&it.source),
        });
    }
}
