//! Rule schemas and the validated rule handles edges are built from.

use super::GraphError;
use indexmap::IndexMap;
use std::fmt::Display;

/// Variable names Ninja interprets itself, plus the explicit `in`/`out`
/// lists. Schema entries with these names become rule-level declarations;
/// edges may not set them through their free-form variables.
pub const RESERVED_VARIABLES: &[&str] = &[
    "command",
    "description",
    "depfile",
    "deps",
    "msvc_deps_prefix",
    "dyndep",
    "generator",
    "pool",
    "restat",
    "rspfile",
    "rspfile_content",
    "in",
    "out",
];

/// Return `true` when `name` is one of [`RESERVED_VARIABLES`].
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_VARIABLES.contains(&name)
}

/// Number of paths an `out` or `in` slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one path.
    One,
    /// Any number of paths (at least one for outputs).
    Many,
}

/// Dependency file format understood by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepsMode {
    /// Make-style depfiles as written by GCC and Clang.
    Gcc,
    /// `/showIncludes` output as written by MSVC.
    Msvc,
}

impl DepsMode {
    /// Value written for the rule's `deps` variable.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gcc => "gcc",
            Self::Msvc => "msvc",
        }
    }
}

/// A default attached to a schema variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// Written on every edge that omits the variable.
    Value(String),
    /// Optional on edges; when omitted nothing is written and the executor
    /// falls back to the top-level variable of this name.
    Inherit,
}

/// Reference to a top-level variable returned by
/// [`crate::ninja::NinjaBuilder::variable`].
///
/// Pass it to [`RuleSchema::inherit`] to make an edge variable optional
/// without repeating its value on every edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
}

impl Variable {
    pub(crate) const fn new(name: String) -> Self {
        Self { name }
    }

    /// Name of the variable.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `$name`, for embedding in command templates.
    #[must_use]
    pub fn reference(&self) -> String {
        self.to_string()
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.name)
    }
}

/// Declared shape of a rule: a command template, the variables each edge
/// must supply, and defaults for everything else.
///
/// # Examples
///
/// ```
/// use shinobi::ninja::{Arity, NinjaBuilder, RuleSchema};
///
/// let mut ninja = NinjaBuilder::new();
/// let gzip = ninja
///     .rule(
///         "gzip",
///         RuleSchema::new("gzip -c $in -$level $args > $out")
///             .output(Arity::One)
///             .input(Arity::One)
///             .require("level")
///             .default("args", ""),
///     )
///     .expect("valid schema");
/// assert_eq!(gzip.name(), "gzip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSchema {
    required: Vec<String>,
    defaults: IndexMap<String, DefaultValue>,
    out_arity: Option<Arity>,
    in_arity: Option<Arity>,
    extras: RuleExtras,
}

/// Paths added to every edge of a rule before the edge's own entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RuleExtras {
    pub(crate) implicit_deps: Vec<String>,
    pub(crate) implicit_out: Vec<String>,
    pub(crate) order_only: Vec<String>,
}

impl RuleSchema {
    /// Start a schema for `command`.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        let mut defaults = IndexMap::new();
        defaults.insert("command".to_owned(), DefaultValue::Value(command.into()));
        Self {
            required: Vec::new(),
            defaults,
            out_arity: None,
            in_arity: None,
            extras: RuleExtras::default(),
        }
    }

    /// Require `out` on every edge with the given arity.
    #[must_use]
    pub fn output(mut self, arity: Arity) -> Self {
        self.out_arity = Some(arity);
        self.push_required("out")
    }

    /// Require `in` on every edge with the given arity.
    #[must_use]
    pub fn input(mut self, arity: Arity) -> Self {
        self.in_arity = Some(arity);
        self.push_required("in")
    }

    /// Require the edge variable `name`.
    #[must_use]
    pub fn require(self, name: impl Into<String>) -> Self {
        self.push_required(name)
    }

    /// Give `name` a default. Reserved names become rule declarations.
    #[must_use]
    pub fn default(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.defaults
            .insert(name.into(), DefaultValue::Value(value.to_string()));
        self
    }

    /// Make the edge variable named after `variable` optional, falling back
    /// to the top-level declaration.
    #[must_use]
    pub fn inherit(mut self, variable: &Variable) -> Self {
        self.defaults
            .insert(variable.name().to_owned(), DefaultValue::Inherit);
        self
    }

    /// Set the rule's `description`.
    #[must_use]
    pub fn description(self, description: impl Display) -> Self {
        self.default("description", description)
    }

    /// Set the rule's `depfile`.
    #[must_use]
    pub fn depfile(self, depfile: impl Display) -> Self {
        self.default("depfile", depfile)
    }

    /// Set the rule's `deps` format.
    #[must_use]
    pub fn deps(self, mode: DepsMode) -> Self {
        self.default("deps", mode.as_str())
    }

    /// Set the rule's `msvc_deps_prefix`.
    #[must_use]
    pub fn msvc_deps_prefix(self, prefix: impl Display) -> Self {
        self.default("msvc_deps_prefix", prefix)
    }

    /// Set the rule's `dyndep` binding.
    #[must_use]
    pub fn dyndep(self, dyndep: impl Display) -> Self {
        self.default("dyndep", dyndep)
    }

    /// Run every edge of this rule in `pool`.
    #[must_use]
    pub fn pool(self, pool: impl Display) -> Self {
        self.default("pool", pool)
    }

    /// Mark the rule as regenerating the graph itself.
    #[must_use]
    pub fn generator(self) -> Self {
        self.default("generator", 1)
    }

    /// Re-stat outputs after the command runs.
    #[must_use]
    pub fn restat(self) -> Self {
        self.default("restat", 1)
    }

    /// Write a response file before running the command.
    #[must_use]
    pub fn rspfile(self, path: impl Display, content: impl Display) -> Self {
        self.default("rspfile", path)
            .default("rspfile_content", content)
    }

    /// Add an implicit dependency to every edge of the rule.
    #[must_use]
    pub fn implicit_dep(mut self, path: impl Into<String>) -> Self {
        self.extras.implicit_deps.push(path.into());
        self
    }

    /// Add an implicit output to every edge of the rule.
    #[must_use]
    pub fn implicit_out(mut self, path: impl Into<String>) -> Self {
        self.extras.implicit_out.push(path.into());
        self
    }

    /// Add an order-only dependency to every edge of the rule.
    #[must_use]
    pub fn order_only(mut self, path: impl Into<String>) -> Self {
        self.extras.order_only.push(path.into());
        self
    }

    fn push_required(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Validate the schema and split it into rule-level declarations and a
    /// [`Rule`] handle carrying the edge-level contract.
    pub(crate) fn compile(self, name: &str) -> Result<(Rule, Vec<(String, String)>), GraphError> {
        for required in &self.required {
            if self.defaults.contains_key(required) {
                return Err(GraphError::ConflictingSchema {
                    rule: name.to_owned(),
                    name: required.clone(),
                });
            }
            if is_reserved(required) && required != "in" && required != "out" {
                return Err(GraphError::ReservedRequirement {
                    rule: name.to_owned(),
                    name: required.clone(),
                });
            }
        }
        if self.defaults.contains_key("in") {
            return Err(GraphError::InputNotRequired {
                rule: name.to_owned(),
            });
        }
        let out_arity = self.out_arity.ok_or_else(|| GraphError::OutputNotRequired {
            rule: name.to_owned(),
        })?;

        let mut declarations = Vec::new();
        let mut edge_defaults = IndexMap::new();
        for (key, value) in self.defaults {
            if is_reserved(&key) {
                if let DefaultValue::Value(text) = value {
                    declarations.push((key, text));
                }
            } else {
                edge_defaults.insert(key, value);
            }
        }
        let required = self
            .required
            .into_iter()
            .filter(|req| req != "in" && req != "out")
            .collect();
        let rule = Rule {
            name: name.to_owned(),
            required,
            out_arity,
            in_arity: self.in_arity,
            edge_defaults,
            extras: self.extras,
        };
        Ok((rule, declarations))
    }
}

/// Handle to a declared rule, used to instantiate build edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    name: String,
    required: Vec<String>,
    out_arity: Arity,
    in_arity: Option<Arity>,
    edge_defaults: IndexMap<String, DefaultValue>,
    extras: RuleExtras,
}

impl Rule {
    /// Name the rule was declared with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn required(&self) -> &[String] {
        &self.required
    }

    pub(crate) const fn out_arity(&self) -> Arity {
        self.out_arity
    }

    pub(crate) const fn in_arity(&self) -> Option<Arity> {
        self.in_arity
    }

    pub(crate) const fn edge_defaults(&self) -> &IndexMap<String, DefaultValue> {
        &self.edge_defaults
    }

    pub(crate) const fn extras(&self) -> &RuleExtras {
        &self.extras
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("command", true)]
    #[case("rspfile_content", true)]
    #[case("out", true)]
    #[case("args", false)]
    #[case("cwd", false)]
    fn reserved_names(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_reserved(name), expected);
    }

    #[test]
    fn compile_splits_declarations_from_edge_defaults() {
        let (rule, declarations) = RuleSchema::new("cp $in $out")
            .output(Arity::One)
            .input(Arity::Many)
            .description("Copying $in")
            .default("args", "")
            .require("level")
            .compile("cp")
            .expect("valid schema");
        assert_eq!(
            declarations,
            vec![
                ("command".to_owned(), "cp $in $out".to_owned()),
                ("description".to_owned(), "Copying $in".to_owned()),
            ]
        );
        assert_eq!(rule.required(), ["level".to_owned()]);
        assert_eq!(rule.in_arity(), Some(Arity::Many));
        assert_eq!(
            rule.edge_defaults().get("args"),
            Some(&DefaultValue::Value(String::new()))
        );
    }

    #[test]
    fn compile_rejects_missing_out() {
        let err = RuleSchema::new("touch").compile("touch").unwrap_err();
        assert!(matches!(err, GraphError::OutputNotRequired { .. }));
    }

    #[test]
    fn compile_rejects_defaulted_input() {
        let err = RuleSchema::new("cat $in")
            .output(Arity::One)
            .default("in", "x")
            .compile("cat")
            .unwrap_err();
        assert!(matches!(err, GraphError::InputNotRequired { .. }));
    }

    #[test]
    fn compile_rejects_required_reserved_names() {
        let err = RuleSchema::new("run")
            .output(Arity::One)
            .require("pool")
            .compile("run")
            .unwrap_err();
        assert!(matches!(err, GraphError::ReservedRequirement { name, .. } if name == "pool"));
    }

    #[test]
    fn compile_rejects_required_and_defaulted() {
        let err = RuleSchema::new("run")
            .output(Arity::One)
            .require("args")
            .default("args", "")
            .compile("run")
            .unwrap_err();
        assert!(matches!(err, GraphError::ConflictingSchema { name, .. } if name == "args"));
    }
}
