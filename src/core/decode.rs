//! Conversion of decoded YAML documents into a [`Ruleset`]
//!
//! The expected document shape is `table -> chain -> body`, where a body is
//! either the string `unmanaged` or a sequence of single-entry mappings:
//!
//! ```yaml
//! filter:
//!   INPUT:
//!     - policy: DROP
//!     - 10 allow ICMP: -p icmp -j ACCEPT
//!     - 10: -i lo -j ACCEPT
//!   docker: unmanaged
//! ```
//!
//! Rule keys are `<priority>[ <comment>]`. The key `policy` sets the chain
//! default policy instead of adding a rule.

use crate::core::error::DecodeError;
use crate::core::ruleset::{Chain, ManagedChain, Rule, Ruleset, Table};
use serde_yaml::{Mapping, Value};
use tracing::warn;

/// Key that sets a chain policy instead of declaring a rule
pub const POLICY_KEY: &str = "policy";

/// Chain body marking a chain as owned by another tool
pub const UNMANAGED: &str = "unmanaged";

/// Scalar kinds accepted as rule keys and rule contents
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Integer(i128),
    Float(f64),
    /// Booleans, nulls, collections and tagged values
    Unsupported,
}

impl Scalar {
    /// Textual form used in the ruleset, or `None` for unsupported kinds.
    ///
    /// Finite floats are fixed-point with six decimals, the others render
    /// as `+Inf`, `-Inf` and `NaN`.
    pub fn into_string(self) -> Option<String> {
        match self {
            Scalar::String(s) => Some(s),
            Scalar::Integer(i) => Some(i.to_string()),
            Scalar::Float(f) if f.is_nan() => Some("NaN".to_string()),
            Scalar::Float(f) if f.is_infinite() => {
                Some(if f > 0.0 { "+Inf" } else { "-Inf" }.to_string())
            }
            Scalar::Float(f) => Some(format!("{f:.6}")),
            Scalar::Unsupported => None,
        }
    }
}

impl From<&Value> for Scalar {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => Scalar::String(s.clone()),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Scalar::Integer(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    Scalar::Integer(i128::from(u))
                } else if let Some(f) = n.as_f64() {
                    Scalar::Float(f)
                } else {
                    Scalar::Unsupported
                }
            }
            _ => Scalar::Unsupported,
        }
    }
}

/// Replaces every CRLF, CR and LF with a single space.
pub fn strip_line_breaks(s: &str) -> String {
    s.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Splits a rule key into priority and comment.
///
/// The key is split on its first space; everything before it must be a
/// base-10 integer, everything after it is the comment.
pub fn parse_priority_comment(key: &str) -> Result<(i64, String), std::num::ParseIntError> {
    let (prio, comment) = key.split_once(' ').unwrap_or((key, ""));
    Ok((prio.parse()?, comment.to_string()))
}

/// Decodes one document into a ruleset.
///
/// A `null` document (an empty file) yields an empty ruleset.
pub fn decode_ruleset(doc: &Value) -> Result<Ruleset, DecodeError> {
    let tables = match doc {
        Value::Null => return Ok(Ruleset::new()),
        Value::Mapping(m) => m,
        _ => return Err(DecodeError::DocumentNotMapping),
    };

    let mut ruleset = Ruleset::new();
    for (tkey, tbody) in tables {
        let tname = Scalar::from(tkey)
            .into_string()
            .ok_or(DecodeError::InvalidTableName)?;
        let table = decode_table(&tname, tbody)?;
        ruleset.tables.insert(tname, table);
    }
    Ok(ruleset)
}

fn decode_table(tname: &str, body: &Value) -> Result<Table, DecodeError> {
    let chains = match body {
        Value::Null => return Ok(Table::new()),
        Value::Mapping(m) => m,
        _ => {
            return Err(DecodeError::TableNotMapping {
                table: tname.to_string(),
            });
        }
    };

    let mut table = Table::new();
    for (ckey, cbody) in chains {
        let cname = Scalar::from(ckey)
            .into_string()
            .ok_or_else(|| DecodeError::InvalidChainName {
                table: tname.to_string(),
            })?;
        let chain = decode_chain(tname, &cname, cbody)?;
        table.insert(cname, chain);
    }
    Ok(table)
}

fn decode_chain(tname: &str, cname: &str, body: &Value) -> Result<Chain, DecodeError> {
    match body {
        Value::String(kind) if kind.eq_ignore_ascii_case(UNMANAGED) => Ok(Chain::Unmanaged),
        Value::String(kind) => Err(DecodeError::UnknownChainType {
            table: tname.to_string(),
            chain: cname.to_string(),
            value: kind.clone(),
        }),
        Value::Sequence(elements) => {
            let mut chain = ManagedChain::default();
            for (i, element) in elements.iter().enumerate() {
                let ctx = RuleContext {
                    table: tname,
                    chain: cname,
                    index: i + 1,
                };
                ctx.decode_element(element, &mut chain)?;
            }
            Ok(Chain::Managed(chain))
        }
        _ => Err(DecodeError::WrongChainType {
            table: tname.to_string(),
            chain: cname.to_string(),
        }),
    }
}

/// Position of a rule element, used to build errors
struct RuleContext<'a> {
    table: &'a str,
    chain: &'a str,
    index: usize,
}

impl RuleContext<'_> {
    fn decode_element(
        &self,
        element: &Value,
        chain: &mut ManagedChain,
    ) -> Result<(), DecodeError> {
        let Value::Mapping(entry) = element else {
            return Err(DecodeError::InvalidRuleFormat {
                table: self.table.to_string(),
                chain: self.chain.to_string(),
                index: self.index,
            });
        };

        let Some((key, value)) = self.first_entry(entry) else {
            warn!(
                "{}:{}, rule {} is empty, skipping",
                self.table, self.chain, self.index
            );
            return Ok(());
        };

        let key = Scalar::from(key)
            .into_string()
            .ok_or_else(|| DecodeError::InvalidRuleName {
                table: self.table.to_string(),
                chain: self.chain.to_string(),
                index: self.index,
            })?;

        let value = Scalar::from(value)
            .into_string()
            .ok_or_else(|| DecodeError::InvalidRuleContent {
                table: self.table.to_string(),
                chain: self.chain.to_string(),
                index: self.index,
                key: key.clone(),
            })?;

        match key.trim() {
            "" => Err(DecodeError::EmptyKey {
                table: self.table.to_string(),
                chain: self.chain.to_string(),
                index: self.index,
            }),
            POLICY_KEY => {
                chain.policy = Some(value);
                Ok(())
            }
            key => {
                let (priority, comment) =
                    parse_priority_comment(key).map_err(|source| DecodeError::InvalidPriority {
                        table: self.table.to_string(),
                        chain: self.chain.to_string(),
                        index: self.index,
                        key: key.to_string(),
                        source,
                    })?;
                chain.rules.push(Rule {
                    priority,
                    comment,
                    content: strip_line_breaks(&value),
                });
                Ok(())
            }
        }
    }

    /// First key/value pair in document order; extra pairs are ignored.
    fn first_entry<'m>(&self, entry: &'m Mapping) -> Option<(&'m Value, &'m Value)> {
        if entry.len() > 1 {
            warn!(
                "{}:{}, rule {} has {} keys, only the first is used",
                self.table,
                self.chain,
                self.index,
                entry.len()
            );
        }
        entry.iter().next()
    }
}
