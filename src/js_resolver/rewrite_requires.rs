use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::{
    ast::{Argument, CallExpression, Expression},
    visit::{
        walk::{walk_call_expression, walk_program},
        Visit,
    },
};
use oxc_diagnostics::OxcDiagnostic;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use tracing::trace;

use super::{ModuleId, Resolver};
use crate::error::RewriteError;

/// Identifier every rewritten `require` call targets in the emitted bundle.
pub const LOADER_IDENT: &str = "__webpack_require__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenModule {
    pub source: String,
    /// Canonical ids of the required modules, in document order.
    pub dependencies: Vec<ModuleId>,
}

/// Parses `source` and points every `require("<specifier>")` call at the
/// runtime loader, passing the canonical id instead of the raw specifier.
///
/// Text outside the rewritten call sites is left untouched.
pub fn rewrite_requires<'a>(
    allocator: &'a Allocator,
    source_type: SourceType,
    source: &'a str,
    resolver: &Resolver,
    importer_dir: &Path,
) -> Result<RewrittenModule, RewriteError> {
    let parse_return = Parser::new(allocator, source, source_type).parse();
    if parse_return.panicked || !parse_return.errors.is_empty() {
        return Err(RewriteError::Parse {
            messages: parse_return
                .errors
                .iter()
                .map(|diagnostic: &OxcDiagnostic| diagnostic.to_string())
                .collect(),
        });
    }

    struct RequireVisitor<'s> {
        source: &'s str,
        resolver: &'s Resolver,
        importer_dir: &'s Path,
        edits: Vec<(Span, String)>,
        dependencies: Vec<ModuleId>,
        error: Option<RewriteError>,
    }

    impl<'s> RequireVisitor<'s> {
        fn shape_error(&self, span: Span) -> RewriteError {
            RewriteError::ArgumentShape {
                line: line_of(self.source, span),
                found: span.source_text(self.source).to_owned(),
            }
        }

        fn rewrite_call(&mut self, expr: &CallExpression<'_>) -> Result<(), RewriteError> {
            let mut callee = &expr.callee;
            while let Expression::ParenthesizedExpression(parenthesized) = callee {
                callee = &parenthesized.expression;
            }
            let Expression::Identifier(callee_id) = callee else {
                return Ok(());
            };
            if callee_id.name != "require" {
                return Ok(());
            }
            let literal = match &**expr.arguments {
                [Argument::StringLiteral(literal)] => literal,
                [arg] => return Err(self.shape_error(arg.span())),
                _ => return Err(self.shape_error(expr.span)),
            };
            let id = self
                .resolver
                .resolve(self.importer_dir, literal.value.as_str());
            trace!(specifier = %literal.value, %id, "rewriting require");

            let quote = self.source[literal.span.start as usize..]
                .chars()
                .next()
                .filter(|c| matches!(c, '\'' | '"'))
                .unwrap_or('"');
            self.edits.push((callee_id.span, LOADER_IDENT.to_owned()));
            self.edits.push((literal.span, quote_literal(&id, quote)));
            self.dependencies.push(id);
            Ok(())
        }
    }

    impl<'a, 's> Visit<'a> for RequireVisitor<'s> {
        fn visit_call_expression(&mut self, expr: &CallExpression<'a>) {
            if self.error.is_some() {
                return;
            }
            if let Err(err) = self.rewrite_call(expr) {
                self.error = Some(err);
                return;
            }
            walk_call_expression(self, expr)
        }
    }

    let mut visitor = RequireVisitor {
        source,
        resolver,
        importer_dir,
        edits: vec![],
        dependencies: vec![],
        error: None,
    };
    walk_program(&mut visitor, &parse_return.program);
    if let Some(err) = visitor.error {
        return Err(err);
    }

    Ok(RewrittenModule {
        source: apply_edits(source, visitor.edits),
        dependencies: visitor.dependencies,
    })
}

/// JSON modules carry no dependencies; they become a single export.
pub fn rewrite_json_module(source: &str) -> Result<RewrittenModule, RewriteError> {
    serde_json::from_str::<serde_json::Value>(source).map_err(|err| RewriteError::Parse {
        messages: vec![err.to_string()],
    })?;
    Ok(RewrittenModule {
        source: format!("module.exports = {};", source.trim()),
        dependencies: vec![],
    })
}

fn apply_edits(source: &str, mut edits: Vec<(Span, String)>) -> String {
    edits.sort_by_key(|(span, _)| span.start);
    let mut output = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for (span, replacement) in edits {
        output.push_str(&source[cursor..span.start as usize]);
        output.push_str(&replacement);
        cursor = span.end as usize;
    }
    output.push_str(&source[cursor..]);
    output
}

fn quote_literal(value: &str, quote: char) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push(quote);
    for c in value.chars() {
        if c == '\\' || c == quote {
            literal.push('\\');
        }
        literal.push(c);
    }
    literal.push(quote);
    literal
}

/// 1-based line of `span`, counting every ECMAScript line terminator.
fn line_of(source: &str, span: Span) -> usize {
    let mut line = 1;
    let mut chars = source[..span.start as usize].chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                line += 1;
            }
            '\n' | '\u{2028}' | '\u{2029}' => line += 1,
            _ => {}
        }
    }
    line
}
