// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compiling text or trees into executable units.
//!
//! Compilation is lex → parse → structural check. Nothing runs until the
//! unit is handed to [`crate::execute`].

use std::sync::Arc;

use tracing::debug;
use weave_ast::module::{Location, Module};
use weave_ast::stmt::{Stmt, StmtKind};
use weave_ast::{SourceFile, Span};
use weave_lexer::Lexer;
use weave_parser::Parser;

/// A unit that failed to compile. Points at the first problem found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{label}:{line}:{column}: {message}")]
pub struct CompileError {
    pub label: String,
    pub line: i64,
    pub column: u32,
    pub message: String,
    pub hint: Option<String>,
    /// Number of further errors in the same unit
    pub extra: usize,
}

impl CompileError {
    fn new(source: &SourceFile, line_offset: i64, span: Span, message: String, hint: Option<String>) -> Self {
        let location = Location::resolve(source, line_offset, span);
        Self {
            label: location.label,
            line: location.line,
            column: location.column,
            message,
            hint,
            extra: 0,
        }
    }

    pub fn location(&self) -> Location {
        Location {
            label: self.label.clone(),
            line: self.line,
            column: self.column,
        }
    }
}

/// Text or an already-parsed tree.
#[derive(Debug)]
pub enum UnitSource {
    Text(String),
    Tree(Module),
}

impl From<&str> for UnitSource {
    fn from(text: &str) -> Self {
        UnitSource::Text(text.to_string())
    }
}

impl From<String> for UnitSource {
    fn from(text: String) -> Self {
        UnitSource::Text(text)
    }
}

impl From<Module> for UnitSource {
    fn from(module: Module) -> Self {
        UnitSource::Tree(module)
    }
}

/// A checked module, ready to execute any number of times.
#[derive(Debug, Clone)]
pub struct Executable {
    module: Arc<Module>,
}

impl Executable {
    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn label(&self) -> &str {
        &self.module.source.label
    }

    pub fn source(&self) -> &Arc<SourceFile> {
        &self.module.source
    }
}

/// Lex and parse `text` into a tree labelled `label`.
pub fn parse_module(text: &str, label: &str) -> Result<Module, CompileError> {
    let source = Arc::new(SourceFile::new(label, text));

    let lexed = Lexer::new(text).tokenize();
    if let Some(first) = lexed.errors.first() {
        let mut err = CompileError::new(&source, 0, first.span, first.message.clone(), first.hint.clone());
        err.extra = lexed.errors.len() - 1;
        return Err(err);
    }

    let parsed = Parser::new(lexed.tokens).parse();
    if let Some(first) = parsed.errors.first() {
        let mut err = CompileError::new(&source, 0, first.span, first.message.clone(), first.hint.clone());
        err.extra = parsed.errors.len() - 1;
        return Err(err);
    }

    Ok(Module::new(parsed.body, source))
}

/// Compile text or a tree into an [`Executable`].
///
/// Text is parsed under `label`. A tree keeps its own text and line offset
/// and is relabelled when `label` differs from the label it was parsed with.
pub fn compile_unit(source: impl Into<UnitSource>, label: &str) -> Result<Executable, CompileError> {
    let mut module = match source.into() {
        UnitSource::Text(text) => parse_module(&text, label)?,
        UnitSource::Tree(module) => module,
    };
    if module.source.label != label {
        module.source = Arc::new(SourceFile::new(label, module.source.text.clone()));
    }

    check_body(&module, &module.body, Context::default())?;
    debug!(label, statements = module.body.len(), "compiled unit");
    Ok(Executable { module: Arc::new(module) })
}

#[derive(Clone, Copy, Default)]
struct Context {
    in_function: bool,
    in_loop: bool,
}

/// Reject `return` outside a function and `break`/`continue` outside a loop.
fn check_body(module: &Module, body: &[Stmt], ctx: Context) -> Result<(), CompileError> {
    for stmt in body {
        check_stmt(module, stmt, ctx)?;
    }
    Ok(())
}

fn check_stmt(module: &Module, stmt: &Stmt, ctx: Context) -> Result<(), CompileError> {
    let fail = |message: &str| {
        Err(CompileError::new(
            &module.source,
            module.line_offset,
            stmt.span,
            message.to_string(),
            None,
        ))
    };
    match &stmt.kind {
        StmtKind::Return(_) if !ctx.in_function => fail("'return' outside function"),
        StmtKind::Break if !ctx.in_loop => fail("'break' outside loop"),
        StmtKind::Continue if !ctx.in_loop => fail("'continue' not properly in loop"),
        StmtKind::If { then_branch, else_branch, .. } => {
            check_body(module, then_branch, ctx)?;
            check_body(module, else_branch, ctx)
        }
        StmtKind::While { body, .. } => check_body(module, body, Context { in_loop: true, ..ctx }),
        StmtKind::For { body, orelse, .. } => {
            check_body(module, body, Context { in_loop: true, ..ctx })?;
            check_body(module, orelse, ctx)
        }
        StmtKind::FunctionDef(def) => check_body(
            module,
            &def.body,
            Context {
                in_function: true,
                in_loop: false,
            },
        ),
        StmtKind::ClassDef(class) => check_body(module, &class.body, Context::default()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_first_parse_error_with_location() {
        let err = compile_unit("x = 1\ny = = 2\n", "unit.wv").unwrap_err();
        assert_eq!(err.label, "unit.wv");
        assert_eq!(err.line, 2);
        assert!(err.to_string().starts_with("unit.wv:2:5: "));
    }

    #[test]
    fn reports_lex_errors() {
        let err = compile_unit("s = 'open\n", "<lex>").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn structural_checks() {
        let err = compile_unit("return 1\n", "<t>").unwrap_err();
        assert_eq!(err.message, "'return' outside function");

        let err = compile_unit("def f():\n    break\n", "<t>").unwrap_err();
        assert_eq!(err.message, "'break' outside loop");
        assert_eq!(err.line, 2);

        let err = compile_unit("for x in y:\n    pass\nelse:\n    continue\n", "<t>").unwrap_err();
        assert_eq!(err.message, "'continue' not properly in loop");

        assert!(compile_unit("while x:\n    if y:\n        break\n", "<t>").is_ok());
        assert!(compile_unit("def f():\n    for x in y:\n        return x\n", "<t>").is_ok());
    }

    #[test]
    fn shifted_tree_reports_shifted_lines() {
        let mut module = parse_module("def f():\n    pass\nbreak\n", "orig.wv").unwrap();
        module.increment_lineno(40);
        let err = compile_unit(module, "orig.wv").unwrap_err();
        assert_eq!(err.line, 43);
    }

    #[test]
    fn tree_is_relabelled() {
        let module = parse_module("x = 1\n", "first").unwrap();
        let unit = compile_unit(module, "second").unwrap();
        assert_eq!(unit.label(), "second");
    }
}
