use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Core error types for fwmerge
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A rule file could not be read
    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rule source is not valid YAML
    #[error("Error in file {source_name}:\n{error}")]
    Parse {
        source_name: String,
        #[source]
        error: serde_yaml::Error,
    },

    /// A rule source is valid YAML but does not describe a ruleset
    #[error("Error in file {source_name}:\n{error}")]
    Decode {
        source_name: String,
        #[source]
        error: DecodeError,
    },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested output generator does not exist
    #[error("Unknown generator '{0}'")]
    UnknownGenerator(String),

    /// The configuration file is unusable
    #[error("Config error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

/// Structural errors found while turning a decoded document into a [`Ruleset`].
///
/// Rule indices are 1-based, matching what a user counts in the source file.
///
/// [`Ruleset`]: crate::core::ruleset::Ruleset
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Document must be a mapping of table names to chains")]
    DocumentNotMapping,

    #[error("Table name must be a string or number")]
    InvalidTableName,

    #[error("Table {table} must be a mapping of chain names to chains")]
    TableNotMapping { table: String },

    #[error("Invalid chain name in table {table}")]
    InvalidChainName { table: String },

    #[error("Unknown chain type '{value}' in {table}:{chain}")]
    UnknownChainType {
        table: String,
        chain: String,
        value: String,
    },

    #[error("Could not parse chain {table}:{chain}, wrong type")]
    WrongChainType { table: String, chain: String },

    #[error("Invalid rule format in {table}:{chain}, rule {index}")]
    InvalidRuleFormat {
        table: String,
        chain: String,
        index: usize,
    },

    #[error("Invalid rule name in {table}:{chain}, rule {index}")]
    InvalidRuleName {
        table: String,
        chain: String,
        index: usize,
    },

    #[error("Invalid rule content in {table}:{chain}, rule {index}(\"{key}\")")]
    InvalidRuleContent {
        table: String,
        chain: String,
        index: usize,
        key: String,
    },

    #[error("Empty key in {table}:{chain}, rule {index}")]
    EmptyKey {
        table: String,
        chain: String,
        index: usize,
    },

    #[error("Invalid priority in {table}:{chain}, rule {index}: '{key}': {source}")]
    InvalidPriority {
        table: String,
        chain: String,
        index: usize,
        key: String,
        #[source]
        source: ParseIntError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
