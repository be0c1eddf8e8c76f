//! Test utilities for shinobi's integration tests.
//!
//! This crate provides fake compiler executables, fixture trees and helpers
//! for running the built `shinobi` binary.

pub mod check_ninja;
pub mod fake_tsc;
pub mod fixture;
pub mod shinobi;

pub use fake_tsc::FakeTsc;
pub use fixture::{Fixture, write_files};
