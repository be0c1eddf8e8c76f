//! Ready-made rules whose edges discover their own dependencies.
//!
//! Each factory declares its rule once and then builds edges that run
//! through `shinobi capture` or `shinobi tsc`, so the executor learns about
//! every file a script or compiler consulted after the edge first runs.

mod error;
mod node;
mod tsc;

pub use error::RuleError;
pub use node::{NodeRule, NodeTestRule};
pub use tsc::{TscEdge, TscRule, TypecheckRule};

use crate::ninja::RuleSchema;

/// Executable the generated commands invoke.
pub const SHINOBI_PROGRAM: &str = "shinobi";

/// Options shared by every rule factory.
///
/// Implicit and order-only dependencies given here are added to every edge
/// the factory creates.
///
/// # Examples
///
/// ```
/// use shinobi::ninja::NinjaBuilder;
/// use shinobi::rules::{NodeRule, RuleConfig};
///
/// let mut ninja = NinjaBuilder::new();
/// let config = RuleConfig::new()
///     .name("gen")
///     .order_only("$builddir/npm-install.stamp");
/// let r#gen = NodeRule::declare(&mut ninja, &config).expect("rule");
/// assert_eq!(r#gen.rule().name(), "gen");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleConfig {
    name: Option<String>,
    program: Option<String>,
    implicit_deps: Vec<String>,
    order_only: Vec<String>,
}

impl RuleConfig {
    /// Defaults: the factory's own rule name and `shinobi` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the rule under `name`.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Invoke `program` instead of `shinobi`.
    #[must_use]
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Add an implicit dependency to every edge.
    #[must_use]
    pub fn implicit_dep(mut self, path: impl Into<String>) -> Self {
        self.implicit_deps.push(path.into());
        self
    }

    /// Add an order-only dependency to every edge.
    #[must_use]
    pub fn order_only(mut self, path: impl Into<String>) -> Self {
        self.order_only.push(path.into());
        self
    }

    fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }

    fn program_name(&self) -> &str {
        self.program.as_deref().unwrap_or(SHINOBI_PROGRAM)
    }

    fn apply(&self, schema: RuleSchema) -> RuleSchema {
        let with_deps = self
            .implicit_deps
            .iter()
            .fold(schema, |schema, path| schema.implicit_dep(path.as_str()));
        self.order_only
            .iter()
            .fold(with_deps, |schema, path| schema.order_only(path.as_str()))
    }
}
