//! Rule file loading
//!
//! Each source is parsed and decoded on its own, then folded into the
//! result with [`Ruleset::merge`] in the order the sources were given. The
//! first failing source aborts the whole batch so no partial ruleset is
//! ever rendered.

use crate::core::decode::decode_ruleset;
use crate::core::error::{Error, Result};
use crate::core::ruleset::Ruleset;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Parses YAML text and decodes it into a ruleset.
///
/// Only the first document of a multi-document stream is used.
/// `source_name` only labels errors.
pub fn parse_str(source_name: &str, text: &str) -> Result<Ruleset> {
    if is_blank(text) {
        debug!("{source_name} has no content");
        return Ok(Ruleset::new());
    }
    let mut documents = serde_yaml::Deserializer::from_str(text);
    let Some(first) = documents.next() else {
        debug!("{source_name} has no documents");
        return Ok(Ruleset::new());
    };
    let doc = serde_yaml::Value::deserialize(first).map_err(|error| Error::Parse {
        source_name: source_name.to_string(),
        error,
    })?;
    if documents.next().is_some() {
        warn!("{source_name} holds more than one YAML document, only the first is used");
    }
    decode_ruleset(&doc).map_err(|error| Error::Decode {
        source_name: source_name.to_string(),
        error,
    })
}

/// True for text holding only whitespace and comment lines.
fn is_blank(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// Reads and decodes a single rule file.
pub fn load_file(path: &Path) -> Result<Ruleset> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let ruleset = parse_str(&path.display().to_string(), &text)?;
    debug!(
        "Loaded {}: {} table(s), {} rule(s)",
        path.display(),
        ruleset.tables.len(),
        ruleset.rule_count()
    );
    Ok(ruleset)
}

/// Merges already-loaded sources in order and sorts the result.
pub fn merge_all(sources: impl IntoIterator<Item = Ruleset>) -> Ruleset {
    let mut merged = Ruleset::new();
    for source in sources {
        merged.merge(source);
    }
    merged.sort();
    merged
}

/// Loads every file in order, merges them and sorts the result.
pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Ruleset> {
    let sources = paths
        .iter()
        .map(|p| load_file(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let merged = merge_all(sources);
    info!(
        "Merged {} file(s) into {} table(s), {} rule(s)",
        paths.len(),
        merged.tables.len(),
        merged.rule_count()
    );
    Ok(merged)
}
