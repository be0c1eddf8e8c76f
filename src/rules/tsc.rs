//! Rules compiling and type-checking TypeScript through `shinobi tsc`.
//!
//! Compile edges name every emitted file up front: the first becomes the
//! explicit output and the rest implicit outputs. The transitive sources are
//! learnt at execution time, either from the depfile the compile writes or,
//! when a dyndep rule is declared, from a dyndep file produced by a listing
//! edge that runs first.

use super::{RuleConfig, RuleError};
use crate::ninja::{
    Arity, BuildArgs, DepsMode, GraphError, Input, NinjaBuilder, PathList, Rule, RuleSchema,
};
use crate::tsc::{Compiler, CompilerOptions, ProcessCompiler, ProjectConfig, declared_outputs};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

type OutputValidations = Box<dyn FnOnce(&[String]) -> Vec<String>>;

enum Sources {
    Entries(Vec<String>),
    Project(Utf8PathBuf),
}

/// One compile edge: what to compile, how, and what else it depends on.
///
/// # Examples
///
/// ```
/// use shinobi::ninja::NinjaBuilder;
/// use shinobi::rules::{RuleConfig, TscEdge, TscRule};
/// use shinobi::tsc::CompilerOptions;
///
/// let mut ninja = NinjaBuilder::new();
/// let tsc = TscRule::declare(&mut ninja, &RuleConfig::new()).expect("rule");
/// let outputs = tsc
///     .build(
///         &mut ninja,
///         TscEdge::entries(["src/index.ts"])
///             .options(CompilerOptions::new().with("outDir", "dist").with("declaration", true)),
///     )
///     .expect("edge");
/// assert_eq!(outputs, ["dist/index.js", "dist/index.d.ts"]);
/// ```
pub struct TscEdge {
    sources: Sources,
    cwd: String,
    options: CompilerOptions,
    implicit_deps: Vec<Input>,
    order_only: Vec<Input>,
    implicit_out: Vec<String>,
    validations: Option<OutputValidations>,
}

impl TscEdge {
    /// Compile the given entry points; imported files are found by the
    /// compiler.
    #[must_use]
    pub fn entries<I>(inputs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::with_sources(Sources::Entries(inputs.into_iter().map(Into::into).collect()))
    }

    /// Compile the project described by a `tsconfig.json`.
    #[must_use]
    pub fn project(path: impl Into<Utf8PathBuf>) -> Self {
        Self::with_sources(Sources::Project(path.into()))
    }

    fn with_sources(sources: Sources) -> Self {
        Self {
            sources,
            cwd: ".".to_owned(),
            options: CompilerOptions::new(),
            implicit_deps: Vec::new(),
            order_only: Vec::new(),
            implicit_out: Vec::new(),
            validations: None,
        }
    }

    /// Run the compiler from `cwd`; option paths are relative to it.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Compiler options passed on the command line.
    #[must_use]
    pub fn options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Append an implicit dependency.
    #[must_use]
    pub fn implicit_dep(mut self, input: impl Into<Input>) -> Self {
        self.implicit_deps.push(input.into());
        self
    }

    /// Append an order-only dependency.
    #[must_use]
    pub fn order_only(mut self, input: impl Into<Input>) -> Self {
        self.order_only.push(input.into());
        self
    }

    /// Append an implicit output the compiler does not report itself.
    #[must_use]
    pub fn implicit_out(mut self, path: impl Into<String>) -> Self {
        self.implicit_out.push(path.into());
        self
    }

    /// Compute validations from the full list of emitted files.
    #[must_use]
    pub fn validations<F>(mut self, validations: F) -> Self
    where
        F: FnOnce(&[String]) -> Vec<String> + 'static,
    {
        self.validations = Some(Box::new(validations));
        self
    }
}

/// Compiles TypeScript and records the sources each compile consulted.
pub struct TscRule {
    compile: Rule,
    dyndep: Option<Rule>,
    compiler: Box<dyn Compiler>,
}

impl TscRule {
    /// Declare the `tsc` rule.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] if the generated schema is rejected.
    pub fn declare(ninja: &mut NinjaBuilder, config: &RuleConfig) -> Result<Self, GraphError> {
        let compile = ninja.rule(config.name_or("tsc"), config.apply(compile_schema(config)))?;
        Ok(Self {
            compile,
            dyndep: None,
            compiler: Box::new(ProcessCompiler::from_env()),
        })
    }

    /// Declare the `tsc` rule and the `tscDyndep` rule that lists each
    /// compile's sources before it is scheduled.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] if either generated schema is rejected.
    pub fn declare_with_dyndep(
        ninja: &mut NinjaBuilder,
        config: &RuleConfig,
        dyndep_config: &RuleConfig,
    ) -> Result<Self, GraphError> {
        let command = format!(
            "{} tsc --cwd $cwd --out $out --dyndep-for $target $args -- $in",
            dyndep_config.program_name()
        );
        let schema = RuleSchema::new(command)
            .description("Getting compilation dependencies for compiling $in")
            .output(Arity::One)
            .input(Arity::Many)
            .require("target")
            .default("cwd", ".")
            .default("args", "");
        let dyndep = ninja.rule(dyndep_config.name_or("tscDyndep"), dyndep_config.apply(schema))?;
        let rule = Self::declare(ninja, config)?;
        Ok(Self {
            dyndep: Some(dyndep),
            ..rule
        })
    }

    /// Resolve projects and name outputs through `compiler` instead of the
    /// `tsc` found via `SHINOBI_TSC` or `PATH`.
    #[must_use]
    pub fn with_compiler(mut self, compiler: impl Compiler + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    /// The declared compile rule.
    #[must_use]
    pub const fn rule(&self) -> &Rule {
        &self.compile
    }

    /// Build a compile edge and return every file it emits.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::NoOutputs`] when nothing would be emitted, a
    /// [`RuleError::Tsc`] when the options or project cannot be resolved,
    /// and a [`RuleError::Graph`] when an edge is rejected.
    pub fn build(&self, ninja: &mut NinjaBuilder, edge: TscEdge) -> Result<Vec<String>, RuleError> {
        let TscEdge {
            sources,
            cwd,
            options,
            implicit_deps,
            order_only,
            implicit_out,
            validations,
        } = edge;
        let (inputs, outputs) = match sources {
            Sources::Entries(inputs) => {
                let outputs =
                    declared_outputs(self.compiler.as_ref(), &inputs, &options, Utf8Path::new(&cwd))?;
                (inputs, outputs)
            }
            Sources::Project(project) => {
                let config = ProjectConfig::resolve(self.compiler.as_ref(), &project, &options)?;
                let outputs = config.declared_outputs(self.compiler.as_ref())?;
                (vec![project.into_string()], outputs)
            }
        };
        let Some((primary, others)) = outputs.split_first() else {
            return Err(RuleError::NoOutputs {
                inputs: inputs.join(" "),
            });
        };
        let args = options.to_args()?.join(" ");

        let mut compile = BuildArgs::new(primary.clone())
            .inputs(&inputs)
            .implicit_deps(implicit_deps)
            .implicit_outs(implicit_out)
            .implicit_outs(others.iter().cloned())
            .order_only_deps(order_only)
            .var("cwd", &cwd)
            .var("args", &args);
        if let Some(rule) = &self.dyndep {
            let dyndep_file = format!("{primary}.dyndep");
            ninja.build(
                rule,
                BuildArgs::new(dyndep_file.clone())
                    .inputs(&inputs)
                    .var("target", primary)
                    .var("cwd", &cwd)
                    .var("args", &args),
            )?;
            compile = compile.dyndep(dyndep_file.clone()).order_only(dyndep_file);
        }
        if let Some(validate) = validations {
            let emitted = outputs.clone();
            compile = compile.validations(move |_| validate(&emitted));
        }
        ninja.build(&self.compile, compile)?;
        debug!(primary = %primary, outputs = outputs.len(), "declared tsc edge");
        Ok(outputs)
    }
}

fn compile_schema(config: &RuleConfig) -> RuleSchema {
    let command = format!(
        "{} tsc --cwd $cwd --out $out $args -- $in",
        config.program_name()
    );
    RuleSchema::new(command)
        .description("Compiling $in")
        .output(Arity::One)
        .input(Arity::Many)
        .depfile("$out.depfile")
        .deps(DepsMode::Gcc)
        .default("cwd", ".")
        .default("args", "")
}

/// Type-checks entry points and touches a stamp file on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypecheckRule {
    rule: Rule,
}

impl TypecheckRule {
    /// Declare the rule, named `typecheck` unless `config` says otherwise.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] if the generated schema is rejected.
    pub fn declare(ninja: &mut NinjaBuilder, config: &RuleConfig) -> Result<Self, GraphError> {
        let command = format!(
            "{} tsc --typecheck --cwd $cwd --out $out $args -- $in",
            config.program_name()
        );
        let schema = RuleSchema::new(command)
            .description("Typechecking $in")
            .output(Arity::One)
            .input(Arity::Many)
            .depfile("$out.depfile")
            .deps(DepsMode::Gcc)
            .default("cwd", ".")
            .require("args");
        let rule = ninja.rule(config.name_or("typecheck"), config.apply(schema))?;
        Ok(Self { rule })
    }

    /// The declared rule.
    #[must_use]
    pub const fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Build a type-check edge for `args` and return its stamp unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] when the options cannot be rendered or the
    /// edge is rejected.
    pub fn build<O: PathList>(
        &self,
        ninja: &mut NinjaBuilder,
        args: BuildArgs<O>,
        options: &CompilerOptions,
    ) -> Result<O, RuleError> {
        let edge = args.var("args", options.to_args()?.join(" "));
        Ok(ninja.build(&self.rule, edge)?)
    }
}
