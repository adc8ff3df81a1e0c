//! Shared test utilities for core module tests
//!
//! Provides builders for chains and rules so tests read like the YAML they
//! stand in for. This module is only compiled in test mode.

use crate::core::ruleset::{Chain, ManagedChain, Rule, Ruleset};

/// Creates a rule with an empty comment.
pub fn rule(priority: i64, content: &str) -> Rule {
    Rule::new(priority, "", content)
}

/// Creates a managed chain without a policy.
pub fn managed(rules: Vec<Rule>) -> Chain {
    Chain::Managed(ManagedChain {
        policy: None,
        rules,
    })
}

/// Creates a managed chain with the given policy.
pub fn managed_with_policy(policy: &str, rules: Vec<Rule>) -> Chain {
    Chain::Managed(ManagedChain {
        policy: Some(policy.to_string()),
        rules,
    })
}

/// Contents of `table:chain` in their current order.
///
/// Panics if the chain is missing or unmanaged.
pub fn contents<'a>(ruleset: &'a Ruleset, table: &str, chain: &str) -> Vec<&'a str> {
    ruleset
        .chain(table, chain)
        .and_then(Chain::as_managed)
        .map(|body| body.rules.iter().map(|r| r.content.as_str()).collect())
        .unwrap_or_else(|| panic!("{table}:{chain} is not a managed chain"))
}
