//! Shinobi core library.
//!
//! Shinobi generates Ninja build files whose edges learn their own inputs.
//! [`ninja::NinjaBuilder`] writes the graph at configure time, and the
//! [`rules`] factories emit edges that run back through the `shinobi` binary.
//! At build time [`capture`] traces the modules a script loads and [`tsc`]
//! asks the TypeScript compiler which files it read; both leave a
//! [`depfile`] for Ninja to consult on the next run.

pub mod canonical;
pub mod capture;
pub mod cli;
pub mod depfile;
pub mod escape;
mod file_io;
pub mod ninja;
pub mod rules;
pub mod runner;
pub mod tsc;
