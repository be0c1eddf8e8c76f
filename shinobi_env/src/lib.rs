#![forbid(unsafe_code)]

//! Shared environment constants used across shinobi crates (library, binary,
//! and test helpers).

/// Environment variable override for the TypeScript compiler executable.
///
/// # Examples
///
/// ```
/// use shinobi_env::TSC_ENV;
/// assert_eq!(TSC_ENV, "SHINOBI_TSC");
/// ```
pub const TSC_ENV: &str = "SHINOBI_TSC";

/// Compiler executable used when [`TSC_ENV`] is unset or not valid UTF-8.
pub const TSC_PROGRAM: &str = "tsc";

/// Environment variable override for the Node.js executable that loads the
/// `typescript` package to name a compile's outputs.
///
/// # Examples
///
/// ```
/// use shinobi_env::NODE_ENV;
/// assert_eq!(NODE_ENV, "SHINOBI_NODE");
/// ```
pub const NODE_ENV: &str = "SHINOBI_NODE";

/// Node.js executable used when [`NODE_ENV`] is unset or not valid UTF-8.
pub const NODE_PROGRAM: &str = "node";
