//! fwmerge - firewall ruleset renderer
//!
//! Composes firewall policy from several independently maintained YAML
//! files and renders it as `iptables-restore` input. Rules are opaque
//! strings; fwmerge only merges, orders and templates them.
//!
//! # Architecture
//!
//! - [`core`] - Ruleset model, decoding, merging, sorting and generators
//! - [`config`] - Optional per-user defaults
//! - [`utils`] - Directory lookup, atomic output writes, diffs
//!
//! # Example
//!
//! ```
//! use fwmerge::core::generate::GeneratorMode;
//! use fwmerge::core::sources::{merge_all, parse_str};
//!
//! let base = parse_str("base.yaml", "filter:\n  INPUT:\n    - 10 allow ICMP: -p icmp -j ACCEPT\n")?;
//! let ssh = parse_str(
//!     "ssh.yaml",
//!     "filter:\n  INPUT:\n    - 5 allow SSH: -p tcp --dport 22 -j ACCEPT\n    - policy: DROP\n",
//! )?;
//!
//! let out = merge_all([base, ssh]).generate(GeneratorMode::Iptables)?;
//! assert_eq!(
//!     out,
//!     "*filter\n:INPUT DROP [0:0]\n-A INPUT -p tcp --dport 22 -j ACCEPT\n-A INPUT -p icmp -j ACCEPT\nCOMMIT\n"
//! );
//! # Ok::<(), fwmerge::Error>(())
//! ```

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export commonly used types
pub use core::error::{DecodeError, Error, Result};
pub use core::generate::GeneratorMode;
pub use core::ruleset::{Chain, ManagedChain, Rule, Ruleset};
