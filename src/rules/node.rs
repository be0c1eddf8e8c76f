//! Rules running Node.js scripts under dependency capture.

use super::RuleConfig;
use crate::ninja::{Arity, BuildArgs, DepsMode, GraphError, NinjaBuilder, PathList, Rule, RuleSchema};

/// Runs `node $in` and records every module it loads against `$out`.
///
/// The script receives `$out` as its last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRule {
    rule: Rule,
}

impl NodeRule {
    /// Declare the rule, named `node` unless `config` says otherwise.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] if the generated schema is rejected.
    pub fn declare(ninja: &mut NinjaBuilder, config: &RuleConfig) -> Result<Self, GraphError> {
        let command = format!(
            "{} capture --out $out --entry $in -- node $nodeArgs $in $args $out",
            config.program_name()
        );
        let schema = RuleSchema::new(command)
            .description("Creating $out from 'node $in'")
            .output(Arity::One)
            .input(Arity::One)
            .depfile("$out.depfile")
            .deps(DepsMode::Gcc)
            .default("args", "")
            .default("nodeArgs", "");
        let rule = ninja.rule(config.name_or("node"), config.apply(schema))?;
        Ok(Self { rule })
    }

    /// The declared rule.
    #[must_use]
    pub const fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Build one edge; set `args` or `nodeArgs` through [`BuildArgs::var`].
    ///
    /// # Examples
    ///
    /// ```
    /// use shinobi::ninja::{BuildArgs, NinjaBuilder};
    /// use shinobi::rules::{NodeRule, RuleConfig};
    ///
    /// let mut ninja = NinjaBuilder::new();
    /// let node = NodeRule::declare(&mut ninja, &RuleConfig::new()).expect("rule");
    /// let out = node
    ///     .build(&mut ninja, BuildArgs::new("$builddir/out.txt").input("src/gen.mjs").var("args", "--output"))
    ///     .expect("edge");
    /// assert_eq!(out, "$builddir/out.txt");
    /// assert!(ninja.output().contains("build $builddir/out.txt: node src/gen.mjs\n  args = --output\n"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] when the edge breaks the rule's schema.
    pub fn build<O: PathList>(
        &self,
        ninja: &mut NinjaBuilder,
        args: BuildArgs<O>,
    ) -> Result<O, GraphError> {
        ninja.build(&self.rule, args)
    }
}

/// Runs `node --test $in` with the TAP report written to `$out`, recording
/// every module the test loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTestRule {
    rule: Rule,
}

impl NodeTestRule {
    /// Declare the rule, named `test` unless `config` says otherwise.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] if the generated schema is rejected.
    pub fn declare(ninja: &mut NinjaBuilder, config: &RuleConfig) -> Result<Self, GraphError> {
        let command = format!(
            "{} capture --out $out --entry $in -- node --test --test-reporter=tap --test-reporter-destination=$out $nodeArgs $in $args",
            config.program_name()
        );
        let schema = RuleSchema::new(command)
            .description("Running test $in")
            .output(Arity::One)
            .input(Arity::One)
            .depfile("$out.depfile")
            .deps(DepsMode::Gcc)
            .default("args", "")
            .default("nodeArgs", "");
        let rule = ninja.rule(config.name_or("test"), config.apply(schema))?;
        Ok(Self { rule })
    }

    /// The declared rule.
    #[must_use]
    pub const fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Build one test edge.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] when the edge breaks the rule's schema.
    pub fn build<O: PathList>(
        &self,
        ninja: &mut NinjaBuilder,
        args: BuildArgs<O>,
    ) -> Result<O, GraphError> {
        ninja.build(&self.rule, args)
    }
}
