//! Typed construction of Ninja build files.
//!
//! [`NinjaBuilder`] accumulates an append-only text buffer. Rules are
//! declared with a [`RuleSchema`] that separates required edge variables from
//! defaults, and every edge is validated against its rule before any text is
//! appended. Paths are escaped with [`crate::escape::escape_path`]; variable
//! values are written verbatim.
//!
//! # Examples
//!
//! ```
//! use shinobi::ninja::{Arity, BuildArgs, NinjaBuilder, RuleSchema};
//!
//! let mut ninja = NinjaBuilder::new();
//! let cp = ninja
//!     .rule("cp", RuleSchema::new("cp $in $out").output(Arity::One).input(Arity::One))
//!     .expect("valid rule");
//! let out = ninja
//!     .build(&cp, BuildArgs::new("a b.txt").input("c:d.txt"))
//!     .expect("valid edge");
//! assert_eq!(out, "a b.txt");
//! assert_eq!(
//!     ninja.output(),
//!     "rule cp\n  command = cp $in $out\nbuild a$ b.txt: cp c$:d.txt\n"
//! );
//! ```

mod edge;
mod error;
mod rule;

pub use edge::{BuildArgs, ForwardedInput, Input, PathList, Validations};
pub use error::GraphError;
pub use rule::{
    Arity, DefaultValue, DepsMode, RESERVED_VARIABLES, Rule, RuleSchema, Variable, is_reserved,
};

use crate::escape::{escape_path, join_escaped};
use crate::file_io;
use camino::Utf8Path;
use itertools::Itertools;
use rule::RuleExtras;
use std::fmt::{self, Display, Formatter};
use tracing::{debug, info};

/// The executor's built-in pool whose edges own the terminal.
pub const CONSOLE_POOL: &str = "console";

/// Append-only Ninja text buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NinjaBuilder {
    output: String,
}

impl NinjaBuilder {
    /// Create an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    /// Create a builder that starts with top-level assignments, such as
    /// `ninja_required_version` or `builddir`, in the order given.
    ///
    /// # Examples
    ///
    /// ```
    /// use shinobi::ninja::NinjaBuilder;
    ///
    /// let ninja = NinjaBuilder::with_variables([
    ///     ("ninja_required_version", "1.11"),
    ///     ("builddir", ".shinobi"),
    /// ]);
    /// assert_eq!(ninja.output(), "ninja_required_version = 1.11\nbuilddir = .shinobi\n");
    /// ```
    #[must_use]
    pub fn with_variables<I, K, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Display,
        V: Display,
    {
        let mut builder = Self::new();
        for (name, value) in variables {
            builder.push_assignment(&name.to_string(), &value.to_string());
        }
        builder
    }

    /// The text generated so far.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Consume the builder and return its text.
    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }

    /// Declare a rule and return the handle used to build its edges.
    ///
    /// Only reserved variables are written to the rule block; every other
    /// default is applied per edge.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] when the schema does not require `out`,
    /// defaults `in`, requires a reserved variable, or marks a variable as
    /// both required and defaulted.
    pub fn rule(&mut self, name: &str, schema: RuleSchema) -> Result<Rule, GraphError> {
        let (rule, declarations) = schema.compile(name)?;
        let block = RuleBlock {
            name,
            declarations: &declarations,
        };
        self.output.push_str(&block.to_string());
        debug!(rule = name, "declared rule");
        Ok(rule)
    }

    /// Write one build edge for `rule` and return its explicit outputs.
    ///
    /// Inputs wrapped in [`ForwardedInput`] contribute their implicit,
    /// order-only and validation paths after any rule-level extras and before
    /// the edge's own entries. Indented variables are written as `dyndep`,
    /// `pool`, the edge's variables in insertion order, then rule defaults the
    /// edge left unset.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] when the edge breaks its rule's schema. No
    /// text is appended in that case.
    pub fn build<O: PathList>(&mut self, rule: &Rule, args: BuildArgs<O>) -> Result<O, GraphError> {
        let BuildArgs {
            out,
            inputs,
            implicit_deps,
            implicit_out,
            order_only,
            validations,
            dyndep,
            pool,
            variables,
        } = args;

        check_outputs(rule, out.paths().len())?;
        check_inputs(rule, inputs.len())?;
        if let Some(name) = variables.keys().find(|name| is_reserved(name)) {
            return Err(GraphError::ReservedVariable {
                rule: rule.name().to_owned(),
                name: name.clone(),
            });
        }
        if let Some(name) = rule
            .required()
            .iter()
            .find(|name| !variables.contains_key(name.as_str()))
        {
            return Err(GraphError::MissingRequired {
                rule: rule.name().to_owned(),
                name: name.clone(),
            });
        }

        let mut lists = EdgeLists::from_extras(rule.extras());
        lists.absorb(inputs, implicit_deps, order_only);
        lists.implicit_out.extend(implicit_out);
        if let Some(validate) = validations {
            lists.validations.extend(validate(&out));
        }

        let mut bindings: Vec<(String, String)> = Vec::new();
        bindings.extend(dyndep.map(|value| ("dyndep".to_owned(), value)));
        bindings.extend(pool.map(|value| ("pool".to_owned(), value)));
        bindings.extend(variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        bindings.extend(
            rule.edge_defaults()
                .iter()
                .filter(|(name, _)| !variables.contains_key(name.as_str()))
                .filter_map(|(name, value)| match value {
                    DefaultValue::Value(text) => Some((name.clone(), text.clone())),
                    DefaultValue::Inherit => None,
                }),
        );

        let text = {
            let outputs = out.paths();
            Statement {
                outputs: &outputs,
                implicit_out: &lists.implicit_out,
                rule: rule.name(),
                inputs: &lists.explicit,
                implicit_deps: &lists.implicit_deps,
                order_only: &lists.order_only,
                validations: &lists.validations,
                bindings: &bindings,
            }
            .to_string()
        };
        self.output.push_str(&text);
        Ok(out)
    }

    /// Write an edge for the built-in `phony` rule and return `out`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NoOutputs`] when `out` names no paths.
    pub fn phony<O, I>(&mut self, out: O, inputs: I) -> Result<O, GraphError>
    where
        O: PathList,
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        if out.paths().is_empty() {
            return Err(GraphError::NoOutputs {
                rule: "phony".to_owned(),
            });
        }
        let mut lists = EdgeLists::default();
        lists.absorb(
            inputs.into_iter().map(Into::into).collect(),
            Vec::new(),
            Vec::new(),
        );
        let text = {
            let outputs = out.paths();
            Statement {
                outputs: &outputs,
                implicit_out: &[],
                rule: "phony",
                inputs: &lists.explicit,
                implicit_deps: &lists.implicit_deps,
                order_only: &lists.order_only,
                validations: &lists.validations,
                bindings: &[],
            }
            .to_string()
        };
        self.output.push_str(&text);
        Ok(out)
    }

    /// Write a top-level `name = value` assignment.
    ///
    /// The returned [`Variable`] can be passed to [`RuleSchema::inherit`] or
    /// used as a value through its `$name` display form.
    pub fn variable(&mut self, name: &str, value: impl Display) -> Variable {
        self.push_assignment(name, &value.to_string());
        Variable::new(name.to_owned())
    }

    /// Declare a pool and return its name.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidPoolDepth`] for a depth of zero.
    pub fn pool(&mut self, name: &str, depth: u32) -> Result<String, GraphError> {
        if depth == 0 {
            return Err(GraphError::InvalidPoolDepth {
                name: name.to_owned(),
            });
        }
        self.output.push_str(&format!("pool {name}\n  depth = {depth}\n"));
        Ok(name.to_owned())
    }

    /// Write an `include` statement.
    pub fn include(&mut self, path: &str) {
        self.output
            .push_str(&format!("include {}\n", escape_path(path)));
    }

    /// Write a `subninja` statement.
    pub fn subninja(&mut self, path: &str) {
        self.output
            .push_str(&format!("subninja {}\n", escape_path(path)));
    }

    /// Write a `default` statement naming `targets`.
    pub fn default<I>(&mut self, targets: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.output
            .push_str(&format!("default {}\n", join_escaped(targets)));
    }

    /// Write `text` as comment lines.
    pub fn comment(&mut self, text: &str) {
        for line in text.lines() {
            self.output.push_str(&format!("# {line}\n"));
        }
        if text.is_empty() {
            self.output.push_str("# \n");
        }
    }

    /// Persist the buffer to `path`, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Write`] when the file cannot be written.
    pub fn write_to(&self, path: &Utf8Path) -> Result<(), GraphError> {
        file_io::write_atomic(path, &self.output).map_err(|source| GraphError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path, "wrote build graph");
        Ok(())
    }

    fn push_assignment(&mut self, name: &str, value: &str) {
        self.output.push_str(&format!("{name} = {value}\n"));
    }
}

fn check_outputs(rule: &Rule, count: usize) -> Result<(), GraphError> {
    if count == 0 {
        return Err(GraphError::NoOutputs {
            rule: rule.name().to_owned(),
        });
    }
    if rule.out_arity() == Arity::One && count != 1 {
        return Err(GraphError::ArityMismatch {
            rule: rule.name().to_owned(),
            slot: "out",
            count,
        });
    }
    Ok(())
}

fn check_inputs(rule: &Rule, count: usize) -> Result<(), GraphError> {
    match rule.in_arity() {
        None if count > 0 => Err(GraphError::UnexpectedInputs {
            rule: rule.name().to_owned(),
            count,
        }),
        Some(Arity::One) if count != 1 => Err(GraphError::ArityMismatch {
            rule: rule.name().to_owned(),
            slot: "in",
            count,
        }),
        _ => Ok(()),
    }
}

/// Path slots of one edge after forwarded metadata has been merged.
#[derive(Debug, Default)]
struct EdgeLists {
    explicit: Vec<String>,
    implicit_out: Vec<String>,
    implicit_deps: Vec<String>,
    order_only: Vec<String>,
    validations: Vec<String>,
}

impl EdgeLists {
    fn from_extras(extras: &RuleExtras) -> Self {
        Self {
            implicit_out: extras.implicit_out.clone(),
            implicit_deps: extras.implicit_deps.clone(),
            order_only: extras.order_only.clone(),
            ..Self::default()
        }
    }

    fn absorb(&mut self, explicit: Vec<Input>, implicit: Vec<Input>, order_only: Vec<Input>) {
        let mut own_implicit = Vec::new();
        let mut own_order_only = Vec::new();
        for input in explicit {
            let file = self.take(input);
            self.explicit.push(file);
        }
        for input in implicit {
            own_implicit.push(self.take(input));
        }
        for input in order_only {
            own_order_only.push(self.take(input));
        }
        self.implicit_deps.extend(own_implicit);
        self.order_only.extend(own_order_only);
    }

    fn take(&mut self, input: Input) -> String {
        match input {
            Input::Path(path) => path,
            Input::Forwarded(forwarded) => {
                self.implicit_deps.extend(forwarded.implicit_deps);
                self.order_only.extend(forwarded.order_only);
                self.validations.extend(forwarded.validations);
                forwarded.file
            }
        }
    }
}

struct RuleBlock<'a> {
    name: &'a str,
    declarations: &'a [(String, String)],
}

impl Display for RuleBlock<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "rule {}", self.name)?;
        for (key, value) in self.declarations {
            writeln!(f, "  {key} = {value}")?;
        }
        Ok(())
    }
}

struct Statement<'a> {
    outputs: &'a [&'a str],
    implicit_out: &'a [String],
    rule: &'a str,
    inputs: &'a [String],
    implicit_deps: &'a [String],
    order_only: &'a [String],
    validations: &'a [String],
    bindings: &'a [(String, String)],
}

impl Display for Statement<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "build {}", join_escaped(self.outputs))?;
        if !self.implicit_out.is_empty() {
            write!(f, " | {}", join_escaped(self.implicit_out))?;
        }
        write!(f, ": {}", self.rule)?;
        if !self.inputs.is_empty() {
            write!(f, " {}", join_escaped(self.inputs))?;
        }
        if !self.implicit_deps.is_empty() {
            write!(f, " | {}", join_escaped(self.implicit_deps))?;
        }
        if !self.order_only.is_empty() {
            write!(f, " || {}", join_escaped(self.order_only))?;
        }
        if !self.validations.is_empty() {
            write!(f, " |@ {}", join_escaped(self.validations))?;
        }
        writeln!(f)?;
        let lines = self
            .bindings
            .iter()
            .map(|(key, value)| format!("  {key} = {value}\n"))
            .join("");
        f.write_str(&lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn ninja() -> NinjaBuilder {
        NinjaBuilder::new()
    }

    #[rstest]
    fn console_pool_is_builtin() {
        assert_eq!(CONSOLE_POOL, "console");
    }

    #[rstest]
    fn comment_prefixes_each_line(mut ninja: NinjaBuilder) {
        ninja.comment("this is a c#mment\nsecond");
        assert_eq!(ninja.output(), "# this is a c#mment\n# second\n");
    }

    #[rstest]
    fn failed_edges_append_nothing(mut ninja: NinjaBuilder) {
        let rule = ninja
            .rule(
                "gen",
                RuleSchema::new("gen $level > $out")
                    .output(Arity::One)
                    .require("level"),
            )
            .expect("rule");
        let before = ninja.output().to_owned();
        let err = ninja.build(&rule, BuildArgs::new("out")).unwrap_err();
        assert!(matches!(err, GraphError::MissingRequired { name, .. } if name == "level"));
        assert_eq!(ninja.output(), before);
    }

    #[rstest]
    #[case("command")]
    #[case("pool")]
    #[case("dyndep")]
    #[case("description")]
    fn edge_variables_reject_reserved_names(mut ninja: NinjaBuilder, #[case] name: &str) {
        let rule = ninja
            .rule("touch", RuleSchema::new("touch $out").output(Arity::One))
            .expect("rule");
        let err = ninja
            .build(&rule, BuildArgs::new("out").var(name, "x"))
            .unwrap_err();
        assert!(matches!(err, GraphError::ReservedVariable { .. }));
    }

    #[rstest]
    fn arity_is_enforced(mut ninja: NinjaBuilder) {
        let rule = ninja
            .rule(
                "cp",
                RuleSchema::new("cp $in $out")
                    .output(Arity::One)
                    .input(Arity::One),
            )
            .expect("rule");
        let err = ninja
            .build(&rule, BuildArgs::new(["a", "b"]).input("c"))
            .unwrap_err();
        assert!(matches!(err, GraphError::ArityMismatch { slot: "out", count: 2, .. }));
        let err = ninja
            .build(&rule, BuildArgs::new("a").inputs(["b", "c"]))
            .unwrap_err();
        assert!(matches!(err, GraphError::ArityMismatch { slot: "in", count: 2, .. }));
        let none: [&str; 0] = [];
        let err = ninja.build(&rule, BuildArgs::new(none)).unwrap_err();
        assert!(matches!(err, GraphError::NoOutputs { .. }));
    }

    #[rstest]
    fn inputs_to_rules_without_in_are_rejected(mut ninja: NinjaBuilder) {
        let rule = ninja
            .rule("touch", RuleSchema::new("touch $out").output(Arity::One))
            .expect("rule");
        let err = ninja
            .build(&rule, BuildArgs::new("out").input("stray"))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnexpectedInputs { count: 1, .. }));
    }

    #[rstest]
    fn zero_depth_pools_are_rejected(mut ninja: NinjaBuilder) {
        let err = ninja.pool("none", 0).unwrap_err();
        assert!(matches!(err, GraphError::InvalidPoolDepth { .. }));
        assert!(ninja.output().is_empty());
    }

    #[rstest]
    fn include_subninja_and_default_escape_paths(mut ninja: NinjaBuilder) {
        ninja.include("rules dir/common.ninja");
        ninja.subninja("sub:dir/build.ninja");
        ninja.default(["all", "my target"]);
        assert_eq!(
            ninja.output(),
            "include rules$ dir/common.ninja\nsubninja sub$:dir/build.ninja\ndefault all my$ target\n"
        );
    }
}
