//! fwmerge - firewall ruleset renderer
//!
//! Reads one or more YAML rule files, merges them in the order given, sorts
//! every chain by rule priority and prints the result in the selected
//! format.
//!
//! # Usage
//!
//! ```bash
//! fwmerge base.yaml ssh.yaml | iptables-restore
//! fwmerge -g iptables-chains /etc/fwmerge/*.yaml       # chains to pre-create
//! fwmerge -g iptables-nochains /etc/fwmerge/*.yaml     # rules only
//! fwmerge -o /etc/iptables/rules.v4 --diff /etc/fwmerge/*.yaml
//! ```

use clap::{ArgAction, Parser};
use fwmerge::config::{self, AppConfig};
use fwmerge::core::sources::load_files;
use fwmerge::{GeneratorMode, utils};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, info, warn};

const USAGE_TEXT: &str = "\
fwmerge is a firewall ruleset renderer for firewalls that support a table/chain/rule
structure (like iptables). It takes YAML files as inputs and outputs a ruleset that
can be loaded into the given firewall. Each rule is tagged with a priority, allowing
fwmerge to merge chains and sort the rules. fwmerge doesn't know about specific rules
and cannot translate between different firewall syntaxes.

A sample rule file:
  filter:
    INPUT:
      - policy: DROP
      - 10 allow ICMP: -p icmp -j ACCEPT
      - 10 allow all on loopback: -i lo -j ACCEPT
      - 10 allow SSH: -p tcp --dport 22 -j ACCEPT
    testchain: unmanaged

Rules are written as '<priority>: <rule>' or '<priority> <comment>: <rule>'. The
priority is used for sorting, rules with equal priority keep the order of the input
files and of their lines. The comment is ignored and the rule is output verbatim.

'policy' sets the default policy of a built-in chain; the last file setting it wins.
An 'unmanaged' chain is created but never filled, so another tool can own it.

Generators:
  iptables           full iptables-restore input (default)
  iptables-nochains  flush and fill managed chains only, for use with --noflush
  iptables-chains    'table chain' list of non-built-in chains to create first
  json               merged ruleset as JSON";

#[derive(Parser)]
#[command(name = "fwmerge", version)]
#[command(about = "Firewall ruleset renderer", long_about = USAGE_TEXT)]
struct Cli {
    /// Which generator to use [default: iptables]
    #[arg(short, long, value_name = "MODE")]
    generator: Option<String>,

    /// Write the ruleset to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Show changes against the current --output file without writing it
    #[arg(long, requires = "output")]
    diff: bool,

    /// Config file [default: ~/.config/fwmerge/config.json]
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More logging on stderr (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Rule files, merged in this order
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> fwmerge::Result<()> {
    let (config, config_err) = match config::load_config(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) if cli.config.is_none() => (AppConfig::default(), Some(e)),
        Err(e) => return Err(e),
    };

    init_logging(&config, cli.verbose, cli.quiet);
    if let Some(e) = config_err {
        warn!("{e}, using defaults");
    }

    let mode = match &cli.generator {
        Some(name) => GeneratorMode::parse(name)?,
        None => config.generator,
    };

    let ruleset = load_files(&cli.files)?;
    let out = ruleset.generate(mode)?;

    if let Some(text) = emit(cli.output.as_deref(), cli.diff, &out)? {
        print!("{text}");
    }
    Ok(())
}

/// Handles the rendered ruleset and returns what belongs on stdout.
///
/// Without a path the ruleset itself goes to stdout. With `diff` the
/// changes against the file are returned and the file is left alone,
/// otherwise the file is replaced.
fn emit(output: Option<&Path>, diff: bool, out: &str) -> fwmerge::Result<Option<String>> {
    match output {
        Some(path) if diff => {
            let changes = utils::diff_against_file(path, out)?;
            if changes.is_none() {
                eprintln!("No changes to {}", path.display());
            }
            Ok(changes)
        }
        Some(path) => {
            utils::write_atomic(path, out)?;
            info!("Wrote ruleset to {}", path.display());
            Ok(None)
        }
        None => Ok(Some(out.to_string())),
    }
}

/// Logs go to stderr; stdout carries the ruleset.
fn init_logging(config: &AppConfig, verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        let base = config.log_level.parse().unwrap_or(Level::WARN);
        raise_level(base, verbose)
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .init();
}

fn raise_level(base: Level, steps: u8) -> Level {
    const ORDER: [Level; 5] = [
        Level::ERROR,
        Level::WARN,
        Level::INFO,
        Level::DEBUG,
        Level::TRACE,
    ];
    let start = ORDER.iter().position(|l| *l == base).unwrap_or(1);
    ORDER[(start + usize::from(steps)).min(ORDER.len() - 1)]
}
