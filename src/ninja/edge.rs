//! Arguments accepted by [`crate::ninja::NinjaBuilder::build`].
//!
//! Explicit outputs are generic so the builder can hand the caller's value
//! back unchanged, letting output identifiers flow into later edges.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fmt::Display;

/// Values that name one or more build paths.
pub trait PathList {
    /// Borrow every path in declaration order.
    fn paths(&self) -> Vec<&str>;
}

impl PathList for str {
    fn paths(&self) -> Vec<&str> {
        vec![self]
    }
}

impl PathList for String {
    fn paths(&self) -> Vec<&str> {
        vec![self.as_str()]
    }
}

impl PathList for Utf8Path {
    fn paths(&self) -> Vec<&str> {
        vec![self.as_str()]
    }
}

impl PathList for Utf8PathBuf {
    fn paths(&self) -> Vec<&str> {
        vec![self.as_str()]
    }
}

impl<T: PathList + ?Sized> PathList for &T {
    fn paths(&self) -> Vec<&str> {
        (**self).paths()
    }
}

impl<T: AsRef<str>> PathList for [T] {
    fn paths(&self) -> Vec<&str> {
        self.iter().map(AsRef::as_ref).collect()
    }
}

impl<T: AsRef<str>, const N: usize> PathList for [T; N] {
    fn paths(&self) -> Vec<&str> {
        self.iter().map(AsRef::as_ref).collect()
    }
}

impl<T: AsRef<str>> PathList for Vec<T> {
    fn paths(&self) -> Vec<&str> {
        self.iter().map(AsRef::as_ref).collect()
    }
}

/// An input path that carries obligations from the edge that produced it.
///
/// Wrappers that chain tools return one of these so downstream edges pick up
/// the upstream order-only and validation requirements without knowing how
/// the chain was built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedInput {
    /// The path consumed by the downstream edge.
    pub file: String,
    /// Implicit dependencies added to any edge consuming `file`.
    pub implicit_deps: Vec<String>,
    /// Order-only dependencies added to any edge consuming `file`.
    pub order_only: Vec<String>,
    /// Validations added to any edge consuming `file`.
    pub validations: Vec<String>,
}

impl ForwardedInput {
    /// Wrap `file` with no obligations yet.
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    /// Add an implicit dependency.
    #[must_use]
    pub fn implicit_dep(mut self, path: impl Into<String>) -> Self {
        self.implicit_deps.push(path.into());
        self
    }

    /// Add an order-only dependency.
    #[must_use]
    pub fn order_only(mut self, path: impl Into<String>) -> Self {
        self.order_only.push(path.into());
        self
    }

    /// Add a validation.
    #[must_use]
    pub fn validation(mut self, path: impl Into<String>) -> Self {
        self.validations.push(path.into());
        self
    }
}

/// A path in any input slot of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A plain path.
    Path(String),
    /// A path with forwarded obligations.
    Forwarded(ForwardedInput),
}

impl Input {
    /// The path itself, without forwarded metadata.
    #[must_use]
    pub fn file(&self) -> &str {
        match self {
            Self::Path(path) => path,
            Self::Forwarded(forwarded) => &forwarded.file,
        }
    }
}

impl From<&str> for Input {
    fn from(path: &str) -> Self {
        Self::Path(path.to_owned())
    }
}

impl From<String> for Input {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<&String> for Input {
    fn from(path: &String) -> Self {
        Self::Path(path.clone())
    }
}

impl From<&Utf8Path> for Input {
    fn from(path: &Utf8Path) -> Self {
        Self::Path(path.as_str().to_owned())
    }
}

impl From<ForwardedInput> for Input {
    fn from(forwarded: ForwardedInput) -> Self {
        Self::Forwarded(forwarded)
    }
}

/// Boxed validation callback receiving the edge's explicit outputs.
pub type Validations<O> = Box<dyn FnOnce(&O) -> Vec<String>>;

/// Everything one build edge declares.
///
/// Path-typed fields are escaped when written. Variable values are written
/// verbatim.
///
/// # Examples
///
/// ```
/// use shinobi::ninja::BuildArgs;
///
/// let args = BuildArgs::new("dist/app.js")
///     .input("src/app.ts")
///     .order_only("node_modules/.stamp")
///     .var("args", "--minify");
/// assert_eq!(args.out(), &"dist/app.js");
/// ```
pub struct BuildArgs<O> {
    pub(crate) out: O,
    pub(crate) inputs: Vec<Input>,
    pub(crate) implicit_deps: Vec<Input>,
    pub(crate) implicit_out: Vec<String>,
    pub(crate) order_only: Vec<Input>,
    pub(crate) validations: Option<Validations<O>>,
    pub(crate) dyndep: Option<String>,
    pub(crate) pool: Option<String>,
    pub(crate) variables: IndexMap<String, String>,
}

impl<O: PathList> BuildArgs<O> {
    /// Start an edge producing `out`.
    #[must_use]
    pub fn new(out: O) -> Self {
        Self {
            out,
            inputs: Vec::new(),
            implicit_deps: Vec::new(),
            implicit_out: Vec::new(),
            order_only: Vec::new(),
            validations: None,
            dyndep: None,
            pool: None,
            variables: IndexMap::new(),
        }
    }

    /// The explicit outputs.
    #[must_use]
    pub const fn out(&self) -> &O {
        &self.out
    }

    /// Append an explicit input.
    #[must_use]
    pub fn input(mut self, input: impl Into<Input>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Append several explicit inputs.
    #[must_use]
    pub fn inputs<I>(mut self, inputs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Append an implicit dependency.
    #[must_use]
    pub fn implicit_dep(mut self, input: impl Into<Input>) -> Self {
        self.implicit_deps.push(input.into());
        self
    }

    /// Append several implicit dependencies.
    #[must_use]
    pub fn implicit_deps<I>(mut self, inputs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        self.implicit_deps
            .extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Append an implicit output.
    #[must_use]
    pub fn implicit_out(mut self, path: impl Into<String>) -> Self {
        self.implicit_out.push(path.into());
        self
    }

    /// Append several implicit outputs.
    #[must_use]
    pub fn implicit_outs<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.implicit_out.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Append an order-only dependency.
    #[must_use]
    pub fn order_only(mut self, input: impl Into<Input>) -> Self {
        self.order_only.push(input.into());
        self
    }

    /// Append several order-only dependencies.
    #[must_use]
    pub fn order_only_deps<I>(mut self, inputs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        self.order_only.extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Compute validations from the edge's explicit outputs.
    #[must_use]
    pub fn validations<F>(mut self, validations: F) -> Self
    where
        F: FnOnce(&O) -> Vec<String> + 'static,
    {
        self.validations = Some(Box::new(validations));
        self
    }

    /// Bind the edge's `dyndep` file.
    #[must_use]
    pub fn dyndep(mut self, path: impl Into<String>) -> Self {
        self.dyndep = Some(path.into());
        self
    }

    /// Run the edge in `pool`; an empty name removes a rule-level pool.
    #[must_use]
    pub fn pool(mut self, pool: impl Into<String>) -> Self {
        self.pool = Some(pool.into());
        self
    }

    /// Set an edge variable, replacing any earlier value.
    #[must_use]
    pub fn var(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.variables.insert(name.into(), value.to_string());
        self
    }
}
