#![forbid(unsafe_code)]

//! Command-line argument parsing for the walkthrough binary.
//!
//! Parses args manually. Environment variables (`REVTRACK_DEMO_SCENARIO`,
//! `REVTRACK_LOG`, then `RUST_LOG`) set defaults that flags override.

use std::env;
use std::fmt;
use std::process;
use std::str::FromStr;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
revtrack walkthrough: change tracking on a friend, its address and emails

USAGE:
    revtrack-demo [OPTIONS]

OPTIONS:
    --scenario=NAME   Scenario to run: basic, nested, collection or all (default: all)
    --log=FILTER      Log filter directive, e.g. 'debug' or 'revtrack_core=trace' (default: info)
    --help, -h        Show this help message
    --version, -V     Show version

SCENARIOS:
    basic        Edit a field, inspect the original, set it back, reject
    nested       Edit the address and watch the friend flip once
    collection   Add and remove emails, then reject the membership edits

ENVIRONMENT VARIABLES:
    REVTRACK_DEMO_SCENARIO   Override --scenario
    REVTRACK_LOG             Override --log (falls back to RUST_LOG)";

/// Which walkthrough to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Basic,
    Nested,
    Collection,
    All,
}

impl Scenario {
    /// The concrete scenarios `self` expands to.
    #[must_use]
    pub fn expand(self) -> &'static [Scenario] {
        match self {
            Self::Basic => &[Self::Basic],
            Self::Nested => &[Self::Nested],
            Self::Collection => &[Self::Collection],
            Self::All => &[Self::Basic, Self::Nested, Self::Collection],
        }
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "nested" => Ok(Self::Nested),
            "collection" => Ok(Self::Collection),
            "all" => Ok(Self::All),
            other => Err(format!("unknown scenario: {other}")),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Nested => "nested",
            Self::Collection => "collection",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    pub scenario: Scenario,
    /// `EnvFilter` directive string.
    pub log: String,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            scenario: Scenario::All,
            log: "info".into(),
        }
    }
}

/// Outcome of parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse the process arguments and environment, exiting on `--help`,
    /// `--version` or a bad argument.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Action::Run(opts)) => opts,
            Ok(Action::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Action::Version) => {
                println!("revtrack-demo {VERSION}");
                process::exit(0);
            }
            Err(message) => {
                eprintln!("{message}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with environment lookups through `var`.
    pub fn parse_from<I, F>(args: I, var: F) -> Result<Action, String>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Environment first; flags override.
        if let Some(val) = var("REVTRACK_DEMO_SCENARIO") {
            opts.scenario = val
                .parse()
                .map_err(|e| format!("Invalid REVTRACK_DEMO_SCENARIO: {e}"))?;
        }
        if let Some(val) = var("REVTRACK_LOG").or_else(|| var("RUST_LOG")) {
            opts.log = val;
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Action::Help),
                "--version" | "-V" => return Ok(Action::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--scenario=") {
                        opts.scenario = val
                            .parse()
                            .map_err(|e| format!("Invalid --scenario value: {e}"))?;
                    } else if let Some(val) = other.strip_prefix("--log=") {
                        opts.log = val.to_owned();
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }

        Ok(Action::Run(opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn default_opts() {
        let opts = Opts::default();
        assert_eq!(opts.scenario, Scenario::All);
        assert_eq!(opts.log, "info");
    }

    #[test]
    fn flags_parse() {
        let action = Opts::parse_from(args(&["--scenario=nested", "--log=debug"]), no_env).unwrap();
        assert_eq!(
            action,
            Action::Run(Opts {
                scenario: Scenario::Nested,
                log: "debug".into(),
            })
        );
    }

    #[test]
    fn flags_override_env() {
        let env = |key: &str| match key {
            "REVTRACK_DEMO_SCENARIO" => Some("collection".to_owned()),
            "RUST_LOG" => Some("warn".to_owned()),
            _ => None,
        };
        let Ok(Action::Run(opts)) = Opts::parse_from(args(&[]), env) else {
            panic!("expected run");
        };
        assert_eq!(opts.scenario, Scenario::Collection);
        assert_eq!(opts.log, "warn");

        let Ok(Action::Run(opts)) = Opts::parse_from(args(&["--scenario=basic"]), env) else {
            panic!("expected run");
        };
        assert_eq!(opts.scenario, Scenario::Basic);
    }

    #[test]
    fn revtrack_log_wins_over_rust_log() {
        let env = |key: &str| match key {
            "REVTRACK_LOG" => Some("trace".to_owned()),
            "RUST_LOG" => Some("warn".to_owned()),
            _ => None,
        };
        let Ok(Action::Run(opts)) = Opts::parse_from(args(&[]), env) else {
            panic!("expected run");
        };
        assert_eq!(opts.log, "trace");
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(
            Opts::parse_from(args(&["-h", "--bogus"]), no_env),
            Ok(Action::Help)
        );
        assert_eq!(Opts::parse_from(args(&["-V"]), no_env), Ok(Action::Version));
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(Opts::parse_from(args(&["--scenario=loud"]), no_env).is_err());
        assert!(Opts::parse_from(args(&["--frobnicate"]), no_env).is_err());
        let env = |_: &str| Some("nope".to_owned());
        assert!(Opts::parse_from(args(&[]), env).is_err());
    }

    #[test]
    fn all_expands_in_order() {
        assert_eq!(
            Scenario::All.expand(),
            &[Scenario::Basic, Scenario::Nested, Scenario::Collection]
        );
        assert_eq!("Nested".parse::<Scenario>(), Ok(Scenario::Nested));
        assert_eq!(Scenario::Collection.to_string(), "collection");
    }

    #[test]
    fn help_text_lists_scenarios() {
        for scenario in Scenario::All.expand() {
            assert!(HELP_TEXT.contains(&scenario.to_string()));
        }
        assert!(!VERSION.is_empty());
    }
}
