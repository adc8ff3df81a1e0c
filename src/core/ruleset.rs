//! Ruleset data structures, multi-source merging and priority ordering
//!
//! A [`Ruleset`] maps table names to [`Table`]s, which map chain names to
//! [`Chain`]s. Chains are either unmanaged (declared only) or managed
//! (optional default policy plus an ordered list of [`Rule`]s).
//!
//! # Lifecycle
//!
//! One ruleset is decoded per input source, then the sources are folded
//! together with [`Ruleset::merge`] in the order they were supplied, and
//! finally [`Ruleset::sort`] orders every managed chain by priority. After
//! that the ruleset is only read by the generators.
//!
//! # Example
//!
//! ```
//! use fwmerge::core::ruleset::{Chain, ManagedChain, Rule, Ruleset};
//!
//! let mut base = Ruleset::new();
//! base.insert_chain("filter", "INPUT", Chain::Managed(ManagedChain {
//!     policy: None,
//!     rules: vec![Rule::new(10, "allow ICMP", "-p icmp -j ACCEPT")],
//! }));
//!
//! let mut ssh = Ruleset::new();
//! ssh.insert_chain("filter", "INPUT", Chain::Managed(ManagedChain {
//!     policy: Some("DROP".to_string()),
//!     rules: vec![Rule::new(5, "allow SSH", "-p tcp --dport 22 -j ACCEPT")],
//! }));
//!
//! base.merge(ssh);
//! base.sort();
//!
//! let input = base.chain("filter", "INPUT").unwrap().as_managed().unwrap();
//! assert_eq!(input.policy.as_deref(), Some("DROP"));
//! assert_eq!(input.rules[0].priority, 5);
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::debug;

/// A single firewall rule.
///
/// `content` is emitted verbatim as one output line, so it never contains
/// line breaks. `comment` only documents intent in the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub priority: i64,
    pub comment: String,
    pub content: String,
}

impl Rule {
    pub fn new(priority: i64, comment: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            priority,
            comment: comment.into(),
            content: content.into(),
        }
    }
}

/// Body of a chain whose rules are rendered by fwmerge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagedChain {
    /// Default policy; only rendered for built-in chains
    pub policy: Option<String>,
    pub rules: Vec<Rule>,
}

impl ManagedChain {
    /// Orders rules by ascending priority.
    ///
    /// `sort_by_key` is stable: rules sharing a priority keep merge order,
    /// then declaration order.
    pub fn sort_rules(&mut self) {
        self.rules.sort_by_key(|rule| rule.priority);
    }

    /// Policy that actually takes effect for a built-in chain
    pub fn effective_policy(&self) -> String {
        match self.policy.as_deref() {
            Some(policy) if !policy.is_empty() => policy.to_uppercase(),
            _ => "ACCEPT".to_string(),
        }
    }
}

/// A chain is declared to the firewall either way, but only managed chains
/// ever receive rules or a policy from fwmerge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Unmanaged,
    Managed(ManagedChain),
}

impl Chain {
    pub const fn is_unmanaged(&self) -> bool {
        matches!(self, Chain::Unmanaged)
    }

    pub const fn as_managed(&self) -> Option<&ManagedChain> {
        match self {
            Chain::Managed(body) => Some(body),
            Chain::Unmanaged => None,
        }
    }

    /// Folds a later declaration of the same chain into this one.
    ///
    /// The kind of `self` always wins. A managed chain appends the incoming
    /// rules and takes the incoming policy if one is set.
    fn absorb(&mut self, other: Chain, table: &str, chain: &str) {
        match (self, other) {
            (Chain::Managed(dst), Chain::Managed(src)) => {
                dst.rules.extend(src.rules);
                if let Some(policy) = src.policy.filter(|p| !p.is_empty()) {
                    dst.policy = Some(policy);
                }
            }
            (Chain::Unmanaged, Chain::Managed(src)) => {
                debug!(
                    "{table}:{chain} stays unmanaged, dropping {} later rule(s)",
                    src.rules.len()
                );
            }
            (Chain::Managed(_), Chain::Unmanaged) => {
                debug!("{table}:{chain} stays managed, ignoring later 'unmanaged' declaration");
            }
            (Chain::Unmanaged, Chain::Unmanaged) => {}
        }
    }
}

/// Chains of one table, iterated in name order
pub type Table = BTreeMap<String, Chain>;

/// Complete rule description, iterated in table name order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Ruleset {
    pub tables: BTreeMap<String, Table>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn chain(&self, table: &str, chain: &str) -> Option<&Chain> {
        self.tables.get(table).and_then(|t| t.get(chain))
    }

    /// Declares `chain` in `table`, replacing any previous declaration.
    pub fn insert_chain(
        &mut self,
        table: impl Into<String>,
        name: impl Into<String>,
        chain: Chain,
    ) {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(name.into(), chain);
    }

    /// Total number of rules across all managed chains
    pub fn rule_count(&self) -> usize {
        self.tables
            .values()
            .flat_map(BTreeMap::values)
            .filter_map(Chain::as_managed)
            .map(|c| c.rules.len())
            .sum()
    }

    /// Folds `other` into `self`.
    ///
    /// Tables and chains only present in `other` are moved over whole. For
    /// chains present in both, rules of `other` are appended after the
    /// existing ones and a non-empty policy of `other` replaces the existing
    /// one, so calling this once per source in input order gives
    /// last-writer-wins policies and source-ordered rules.
    pub fn merge(&mut self, other: Ruleset) {
        for (tname, table) in other.tables {
            match self.tables.entry(tname) {
                Entry::Vacant(slot) => {
                    slot.insert(table);
                }
                Entry::Occupied(mut slot) => {
                    let (tname, dst) = (slot.key().clone(), slot.get_mut());
                    for (cname, chain) in table {
                        match dst.entry(cname) {
                            Entry::Vacant(c) => {
                                c.insert(chain);
                            }
                            Entry::Occupied(mut c) => {
                                let cname = c.key().clone();
                                c.get_mut().absorb(chain, &tname, &cname);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Stable-sorts the rules of every managed chain by priority.
    pub fn sort(&mut self) {
        for table in self.tables.values_mut() {
            for chain in table.values_mut() {
                if let Chain::Managed(body) = chain {
                    body.sort_rules();
                }
            }
        }
    }
}
