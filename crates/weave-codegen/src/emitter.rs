// SPDX-License-Identifier: (MIT OR Apache-2.0)

use std::collections::HashMap;

use tracing::debug;
use weave_interp::{compile_unit, execute, Namespace, Value};

use crate::args::{format_list, Var};
use crate::config::EmitterConfig;
use crate::error::{EmitError, Error};
use crate::template;
use crate::Subs;

/// A buffer of generated source lines plus the namespace it compiles into.
///
/// Lines are appended through a [`Scope`]; the convenience methods on `Code`
/// itself write through the root scope, which has no substitutions.
pub struct Code {
    lines: Vec<String>,
    depth: usize,
    globals: Namespace,
    counters: HashMap<String, usize>,
    config: EmitterConfig,
}

impl Code {
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
            globals: Namespace::new(),
            counters: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Current block nesting level.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The root scope.
    pub fn scope(&mut self) -> Scope<'_> {
        Scope {
            code: self,
            vars: Subs::new(),
        }
    }

    pub fn new_scope(&mut self, subs: &Subs) -> Scope<'_> {
        Scope {
            code: self,
            vars: subs.clone(),
        }
    }

    pub fn w(&mut self, parts: &[&str], subs: &Subs) -> Result<(), EmitError> {
        self.scope().w(parts, subs)
    }

    pub fn ww(&mut self, text: &str, subs: &Subs) -> Result<(), EmitError> {
        self.scope().ww(text, subs)
    }

    pub fn block<F, E>(&mut self, header: Option<&str>, subs: &Subs, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<(), E>,
        E: From<EmitError>,
    {
        self.scope().block(header, subs, body)
    }

    pub fn def_<F, E>(
        &mut self,
        name: &str,
        vars: &[Var],
        args: Option<&str>,
        kwargs: Option<&str>,
        body: F,
    ) -> Result<(), E>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<(), E>,
        E: From<EmitError>,
    {
        self.scope().def_(name, vars, args, kwargs, body)
    }

    /// The buffered lines joined by newlines.
    pub fn build(&self) -> String {
        self.lines.join("\n")
    }

    /// Compile the built text and run it in this buffer's namespace.
    pub fn compile(&self) -> Result<(), Error> {
        let text = self.build();
        debug!(label = %self.config.label, lines = self.lines.len(), "compiling generated code");
        let unit = compile_unit(text, &self.config.label)?;
        execute(&unit, &self.globals, None)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.globals.set(name, value);
    }

    pub fn namespace(&self) -> &Namespace {
        &self.globals
    }

    /// Stage `value` under `name` and return the key actually used.
    ///
    /// An equal value already bound to `name` is reused. A different one
    /// moves the new binding to the first free `name__1`, `name__2`, ...
    pub fn new_global(&mut self, name: &str, value: Value) -> String {
        let key = match self.globals.get(name) {
            None => name.to_string(),
            Some(existing) if existing == value => return name.to_string(),
            Some(_) => self.fresh_name(name),
        };
        self.globals.set(key.clone(), value);
        key
    }

    fn fresh_name(&mut self, name: &str) -> String {
        let counter = self.counters.entry(name.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{}__{}", name, counter);
            if !self.globals.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Argument list for a call site: `a, b=1, *rest, **kw`.
    pub fn args(vars: &[Var], args: Option<&str>, kwargs: Option<&str>) -> String {
        format_list(vars, args, kwargs)
    }

    /// Parameter list for a `def` header.
    pub fn params(vars: &[Var], args: Option<&str>, kwargs: Option<&str>) -> String {
        format_list(vars, args, kwargs)
    }

    /// A complete call expression: `func(args)`.
    pub fn call(func: &str, vars: &[Var], args: Option<&str>, kwargs: Option<&str>) -> String {
        format!("{}({})", func, Self::args(vars, args, kwargs))
    }

    fn push_line(&mut self, text: &str) {
        let indent = " ".repeat(self.depth * self.config.indent_width);
        self.lines.push(format!("{}{}", indent, text));
    }
}

impl Default for Code {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitutions in effect for a run of writes into a [`Code`].
///
/// A child scope starts from its parent's bindings; bindings given to a
/// single write apply to that write only.
pub struct Scope<'c> {
    code: &'c mut Code,
    vars: Subs,
}

impl<'c> Scope<'c> {
    pub fn vars(&self) -> &Subs {
        &self.vars
    }

    pub fn new_scope(&mut self, subs: &Subs) -> Scope<'_> {
        let vars = self.merged(subs);
        Scope {
            code: &mut *self.code,
            vars,
        }
    }

    /// Apply the scope's bindings plus `subs` to `text`. Text passes
    /// through untouched when nothing is bound.
    pub fn format(&self, text: &str, subs: &Subs) -> Result<String, EmitError> {
        if self.vars.is_empty() && subs.is_empty() {
            return Ok(text.to_string());
        }
        template::substitute(text, &self.merged(subs))
    }

    /// Write one line made of `parts` joined by single spaces.
    pub fn w(&mut self, parts: &[&str], subs: &Subs) -> Result<(), EmitError> {
        let line = self.format(&parts.join(" "), subs)?;
        self.code.push_line(&line);
        Ok(())
    }

    /// Write a multi-line template. One leading newline is dropped and the
    /// common indentation removed before each line goes through [`w`](Self::w).
    pub fn ww(&mut self, text: &str, subs: &Subs) -> Result<(), EmitError> {
        let text = text.strip_prefix('\n').unwrap_or(text);
        for line in template::dedent(text) {
            self.w(&[line], subs)?;
        }
        Ok(())
    }

    /// Write `header`, then run `body` one level deeper in a child scope
    /// holding `subs`. An empty body gets the configured placeholder.
    pub fn block<F, E>(&mut self, header: Option<&str>, subs: &Subs, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<(), E>,
        E: From<EmitError>,
    {
        let mut inner = self.new_scope(subs);
        if let Some(header) = header {
            inner.w(&[header], &Subs::new())?;
        }
        inner.code.depth += 1;
        let mark = inner.code.lines.len();
        let result = body(&mut inner);
        if result.is_ok() && inner.code.lines.len() == mark {
            let placeholder = inner.code.config.placeholder.clone();
            inner.code.push_line(&placeholder);
        }
        inner.code.depth -= 1;
        result
    }

    /// A block headed by `def name(params):`.
    pub fn def_<F, E>(
        &mut self,
        name: &str,
        vars: &[Var],
        args: Option<&str>,
        kwargs: Option<&str>,
        body: F,
    ) -> Result<(), E>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<(), E>,
        E: From<EmitError>,
    {
        let paramlist = Code::params(vars, args, kwargs);
        let subs = crate::subs! { funcname = name, paramlist = paramlist };
        self.block(Some("def {funcname}({paramlist}):"), &subs, body)
    }

    pub fn new_global(&mut self, name: &str, value: Value) -> String {
        self.code.new_global(name, value)
    }

    fn merged(&self, subs: &Subs) -> Subs {
        let mut vars = self.vars.clone();
        vars.extend(subs.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subs;

    fn none() -> Subs {
        Subs::new()
    }

    #[test]
    fn words_are_joined_with_spaces() {
        let mut code = Code::new();
        code.w(&["a", "=", "1"], &none()).unwrap();
        assert_eq!(code.build(), "a = 1");
        assert_eq!(code.build(), code.build());
    }

    #[test]
    fn braces_are_literal_without_bindings() {
        let mut code = Code::new();
        code.w(&["d = {}"], &none()).unwrap();
        code.w(&["e = {{}}", "# {n}"], &subs! { n = 1 }).unwrap();
        assert_eq!(code.build(), "d = {}\ne = {} # 1");
    }

    #[test]
    fn blocks_indent_and_fill_empty_bodies() {
        let mut code = Code::new();
        code.block(Some("if x:"), &none(), |s| s.w(&["y = 1"], &none())).unwrap();
        code.block::<_, EmitError>(Some("while False:"), &none(), |_| Ok(())).unwrap();
        assert_eq!(code.build(), "if x:\n    y = 1\nwhile False:\n    pass");
        assert_eq!(code.depth(), 0);
    }

    #[test]
    fn scopes_chain_their_bindings() {
        let mut code = Code::new();
        let outer = subs! { name = "outer", value = 1 };
        code.block::<_, EmitError>(Some("def {name}():"), &outer, |s| {
            s.w(&["x = {value}"], &none())?;
            s.block(Some("if {flag}:"), &subs! { value = 2, flag = "True" }, |s| {
                s.w(&["return {name}, {value}"], &none())
            })
        })
        .unwrap();
        assert_eq!(
            code.build(),
            "def outer():\n    x = 1\n    if True:\n        return outer, 2"
        );
    }

    #[test]
    fn child_scope_overrides_without_touching_parent() {
        let mut code = Code::new();
        let mut parent = code.new_scope(&subs! { a = 1, b = 2 });
        {
            let mut child = parent.new_scope(&subs! { b = 3 });
            assert_eq!(child.vars()["a"], "1");
            child.w(&["{a} {b}"], &none()).unwrap();
        }
        parent.w(&["{a} {b}"], &none()).unwrap();
        assert_eq!(parent.vars()["b"], "2");
        assert_eq!(code.build(), "1 3\n1 2");
    }

    #[test]
    fn missing_binding_leaves_depth_intact() {
        let mut code = Code::new();
        let err = code
            .block(Some("if x:"), &subs! { a = 1 }, |s| s.w(&["{b}"], &none()))
            .unwrap_err();
        assert!(matches!(err, EmitError::MissingSubstitution { ref name, .. } if name == "b"));
        assert_eq!(code.depth(), 0);
    }

    #[test]
    fn raw_templates_are_dedented() {
        let mut code = Code::new();
        code.block(Some("def f(x):"), &none(), |s| {
            s.ww(
                "
                if x:
                    return {a}
                return 0
                ",
                &subs! { a = 42 },
            )
        })
        .unwrap();
        assert_eq!(code.build(), "def f(x):\n    if x:\n        return 42\n    return 0");
    }

    #[test]
    fn argument_lists() {
        let vars = [Var::from("a"), Var::from(("b", 1)), Var::from(("c", "'s'"))];
        assert_eq!(Code::params(&vars, Some("*args"), Some("**kwargs")), "a, b=1, c='s', *args, **kwargs");
        assert_eq!(Code::call("f", &[Var::from("x")], None, Some("**kw")), "f(x, **kw)");
        assert_eq!(Code::args(&[], None, None), "");
    }

    #[test]
    fn def_builds_a_callable() {
        let mut code = Code::new();
        code.def_::<_, Error>("add", &["a".into(), ("b", 10).into()], None, None, |s| {
            s.w(&["return a + b"], &none())?;
            Ok(())
        })
        .unwrap();
        code.compile().unwrap();
        let add = code.get("add").unwrap();
        let result = weave_interp::call(&add, vec![Value::Int(1)], Default::default()).unwrap();
        assert_eq!(result, Value::Int(11));
    }

    #[test]
    fn globals_are_interned_per_name() {
        let mut code = Code::new();
        assert_eq!(code.new_global("k", Value::Int(1)), "k");
        assert_eq!(code.new_global("k", Value::Int(1)), "k");
        assert_eq!(code.new_global("k", Value::Int(2)), "k__1");
        assert_eq!(code.new_global("k", Value::Int(3)), "k__2");
        assert_eq!(code.get("k__1"), Some(Value::Int(2)));
    }

    #[test]
    fn compile_runs_against_staged_globals() {
        let mut code = Code::new();
        let key = code.new_global("base", Value::Int(40));
        code.w(&["answer = {base} + 2"], &subs! { base = key }).unwrap();
        code.set("unused", Value::None);
        code.compile().unwrap();
        assert_eq!(code.get("answer"), Some(Value::Int(42)));

        code.set("base", Value::Int(0));
        code.compile().unwrap();
        assert_eq!(code.get("answer"), Some(Value::Int(2)));
    }

    #[test]
    fn compile_errors_carry_the_label() {
        let mut code = Code::with_config(EmitterConfig {
            label: "<gen>".to_string(),
            ..EmitterConfig::default()
        });
        code.w(&["x = = 1"], &none()).unwrap();
        let err = code.compile().unwrap_err();
        assert!(matches!(err, Error::Compile(_)));
        assert!(err.to_string().starts_with("<gen>:1:"));
    }

    #[test]
    fn custom_indent_and_placeholder() {
        let mut code = Code::with_config(EmitterConfig {
            indent_width: 2,
            placeholder: "None".to_string(),
            ..EmitterConfig::default()
        });
        code.block::<_, EmitError>(Some("if x:"), &none(), |s| {
            s.block(Some("if y:"), &none(), |_| Ok(()))
        })
        .unwrap();
        assert_eq!(code.build(), "if x:\n  if y:\n    None");
    }
}
