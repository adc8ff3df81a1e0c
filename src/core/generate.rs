//! Output generators for `iptables-restore`
//!
//! All generators read a merged and sorted [`Ruleset`] and never modify it.
//! Tables and chains are emitted in name order so the same input always
//! renders to the same text.
//!
//! - [`GeneratorMode::Iptables`]: declares every chain, then appends rules
//! - [`GeneratorMode::IptablesNoChains`]: flushes managed chains, sets their
//!   policy and appends rules, leaving chain creation to someone else
//! - [`GeneratorMode::IptablesChains`]: lists the non-built-in chains, one
//!   `table chain` pair per line, for pre-creating them
//! - [`GeneratorMode::Json`]: dump of the merged model for debugging

use crate::core::error::{Error, Result};
use crate::core::ruleset::{Chain, Ruleset, Table};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::str::FromStr;
use tracing::warn;

/// Built-in chains that accept a default policy, per table
pub const POLICY_CHAINS: &[(&str, &[&str])] = &[
    ("filter", &["INPUT", "FORWARD", "OUTPUT"]),
    ("nat", &["PREROUTING", "INPUT", "OUTPUT", "POSTROUTING"]),
    (
        "mangle",
        &["PREROUTING", "INPUT", "FORWARD", "OUTPUT", "POSTROUTING"],
    ),
    ("raw", &["PREROUTING", "OUTPUT"]),
];

/// Returns true if `chain` is a built-in chain of `table` that takes a policy.
pub fn chain_has_policy(table: &str, chain: &str) -> bool {
    POLICY_CHAINS
        .iter()
        .find(|(t, _)| *t == table)
        .is_some_and(|(_, chains)| chains.contains(&chain))
}

/// Output format selected on the command line or in the config file
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum GeneratorMode {
    /// Full `iptables-restore` input including chain declarations
    #[default]
    #[strum(serialize = "iptables")]
    #[serde(rename = "iptables")]
    Iptables,
    /// Rules and policies only, for chains that already exist
    #[strum(serialize = "iptables-nochains")]
    #[serde(rename = "iptables-nochains")]
    IptablesNoChains,
    /// `table chain` list of chains that have to be created
    #[strum(serialize = "iptables-chains")]
    #[serde(rename = "iptables-chains")]
    IptablesChains,
    /// Pretty-printed JSON of the merged ruleset
    #[strum(serialize = "json")]
    #[serde(rename = "json")]
    Json,
}

impl GeneratorMode {
    /// Parses a generator name, reporting unknown names as [`Error::UnknownGenerator`].
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name).map_err(|_| Error::UnknownGenerator(name.to_string()))
    }
}

impl Ruleset {
    /// Renders the ruleset in the given format.
    pub fn generate(&self, mode: GeneratorMode) -> Result<String> {
        match mode {
            GeneratorMode::Iptables => Ok(self.to_iptables(true)),
            GeneratorMode::IptablesNoChains => Ok(self.to_iptables(false)),
            GeneratorMode::IptablesChains => Ok(self.to_iptables_chains()),
            GeneratorMode::Json => self.to_json(),
        }
    }

    /// Generates `iptables-restore` input.
    ///
    /// With `with_chains` every chain is declared (which also flushes it).
    /// Without it, managed chains are flushed explicitly and unmanaged chains
    /// are not touched at all.
    pub fn to_iptables(&self, with_chains: bool) -> String {
        let mut out = String::new();
        for (name, table) in &self.tables {
            write_table(&mut out, name, table, with_chains);
        }
        out
    }

    /// Lists every chain that is not a built-in policy chain as `table chain`.
    pub fn to_iptables_chains(&self) -> String {
        let mut out = String::new();
        for (tname, table) in &self.tables {
            for cname in table.keys() {
                // Built-in chains always exist
                if !chain_has_policy(tname, cname) {
                    let _ = writeln!(out, "{tname} {cname}");
                }
            }
        }
        out
    }

    /// Pretty-printed JSON of the merged model.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

fn write_table(out: &mut String, name: &str, table: &Table, with_chains: bool) {
    let _ = writeln!(out, "*{name}");

    if with_chains {
        for (cname, chain) in table {
            let policy = match chain {
                Chain::Managed(body) if chain_has_policy(name, cname) => body.effective_policy(),
                Chain::Unmanaged if chain_has_policy(name, cname) => "ACCEPT".to_string(),
                _ => {
                    warn_ignored_policy(name, cname, chain);
                    "-".to_string()
                }
            };
            let _ = writeln!(out, ":{cname} {policy} [0:0]");
        }
    } else {
        for (cname, chain) in table {
            let Chain::Managed(body) = chain else {
                continue;
            };
            let _ = writeln!(out, "-F {cname}");
            if chain_has_policy(name, cname) {
                let _ = writeln!(out, "-P {cname} {}", body.effective_policy());
            } else {
                warn_ignored_policy(name, cname, chain);
            }
        }
    }

    for (cname, chain) in table {
        let Chain::Managed(body) = chain else {
            continue;
        };
        for rule in &body.rules {
            let _ = writeln!(out, "-A {cname} {}", rule.content);
        }
    }

    let _ = writeln!(out, "COMMIT");
}

fn warn_ignored_policy(table: &str, chain_name: &str, chain: &Chain) {
    if let Some(policy) = chain
        .as_managed()
        .and_then(|body| body.policy.as_deref())
        .filter(|p| !p.is_empty())
    {
        warn!("{table}:{chain_name} is not a built-in chain, ignoring policy '{policy}'");
    }
}
