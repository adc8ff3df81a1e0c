//! Core ruleset handling
//!
//! This module contains the data model and the processing pipeline:
//!
//! - [`ruleset`]: Tables, chains and rules, plus merging and priority sorting
//! - [`decode`]: Turns decoded YAML values into a [`ruleset::Ruleset`]
//! - [`sources`]: Reads rule files and folds them together in input order
//! - [`generate`]: Renders `iptables-restore` input and related formats
//! - [`error`]: Error types for the whole pipeline

pub mod decode;
pub mod error;
pub mod generate;
pub mod ruleset;
pub mod sources;

#[cfg(test)]
pub mod test_helpers;

#[cfg(test)]
mod tests;
