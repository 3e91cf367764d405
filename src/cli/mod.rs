//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// End-to-end IBC test harness for CosmWasm contracts
#[derive(Parser, Debug)]
#[command(name = "ibc-harness")]
#[command(version)]
#[command(about = "Deploy CosmWasm contracts on two chains and check IBC acknowledgements")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run end-to-end scenarios
    Run(RunArgs),

    /// List available scenarios
    List(ListArgs),

    /// Decode an acknowledgement
    Decode(DecodeArgs),

    /// Query a live chain through its LCD endpoint
    Query(QueryArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// View stored results
    Results(ResultsArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenario to run, by number or name (repeatable; default all)
    #[arg(short, long)]
    pub scenario: Vec<String>,

    /// Skip specific scenarios (comma-separated numbers or names)
    #[arg(long)]
    pub skip: Option<String>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Store the run in the results directory
    #[arg(long)]
    pub save: bool,

    /// Write results to file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Show per-stage timings
    #[arg(long)]
    pub stages: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show scenario descriptions
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for decode command
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Acknowledgement as JSON text or base64 of the JSON bytes
    pub ack: String,

    /// Path of nested base64 fields to follow, e.g. `results.0.ok`
    #[arg(short, long)]
    pub path: Option<String>,

    /// Keep unwrapping payloads that are result/error envelopes themselves
    #[arg(long, conflicts_with = "path")]
    pub nested: bool,

    /// Maximum envelope nesting to unwrap
    #[arg(long, default_value = "8")]
    pub max_depth: usize,
}

/// Arguments for query command
#[derive(Parser, Debug)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub action: QueryAction,

    /// LCD endpoint (defaults to chain A's configured endpoint)
    #[arg(long, global = true)]
    pub lcd: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum QueryAction {
    /// Show contract info
    Contract {
        /// Contract address
        address: String,
    },

    /// Run a smart query
    Smart {
        /// Contract address
        address: String,

        /// Query message as JSON
        query: String,
    },

    /// Show an account balance
    Balance {
        /// Account address
        address: String,

        /// Denomination
        #[arg(short, long)]
        denom: String,
    },
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./ibc-harness.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment overrides instead
        #[arg(long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the discovered file)
        file: Option<String>,
    },

    /// List supported environment variables
    Env,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    #[command(subcommand)]
    pub action: ResultsAction,

    /// Results directory (defaults to the configured one)
    #[arg(long, global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ResultsAction {
    /// List stored runs
    List,

    /// Show a stored run
    Show {
        /// Run ID (defaults to the latest run)
        id: Option<String>,

        /// Output format (table, json, json-pretty, csv, summary)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Export a stored run to JSON or CSV
    Export {
        /// Run ID
        id: String,

        /// Destination file; format follows the extension
        output: String,
    },

    /// Delete a stored run
    Delete {
        /// Run ID
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["ibc-harness", "list", "--detailed"]);
        match args.command {
            Command::List(list_args) => {
                assert!(list_args.detailed);
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "ibc-harness",
            "run",
            "--scenario",
            "1",
            "-s",
            "handshake-rejected",
            "--format",
            "json",
            "--save",
            "-v",
        ]);
        assert!(args.verbose);
        match args.command {
            Command::Run(run_args) => {
                assert_eq!(run_args.scenario, vec!["1", "handshake-rejected"]);
                assert_eq!(run_args.format.as_deref(), Some("json"));
                assert!(run_args.save);
                assert!(!run_args.stages);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_decode_args() {
        let args = Args::parse_from([
            "ibc-harness",
            "decode",
            "eyJlcnJvciI6ImJvb20ifQ==",
            "-p",
            "results.0",
        ]);
        match args.command {
            Command::Decode(decode_args) => {
                assert_eq!(decode_args.path.as_deref(), Some("results.0"));
                assert_eq!(decode_args.max_depth, 8);
                assert!(!decode_args.nested);
            }
            _ => panic!("Expected Decode command"),
        }

        let args =
            Args::parse_from(["ibc-harness", "decode", "{}", "--nested", "--max-depth", "3"]);
        match args.command {
            Command::Decode(decode_args) => {
                assert!(decode_args.nested);
                assert_eq!(decode_args.max_depth, 3);
            }
            _ => panic!("Expected Decode command"),
        }

        let conflict =
            Args::try_parse_from(["ibc-harness", "decode", "{}", "--nested", "-p", "ok"]);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_query_args() {
        let args = Args::parse_from([
            "ibc-harness",
            "query",
            "balance",
            "osmo1abc",
            "--denom",
            "uosmo",
            "--lcd",
            "http://localhost:1318",
        ]);
        match args.command {
            Command::Query(query_args) => {
                assert_eq!(query_args.lcd.as_deref(), Some("http://localhost:1318"));
                assert!(matches!(
                    query_args.action,
                    QueryAction::Balance { ref denom, .. } if denom == "uosmo"
                ));
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_results_args() {
        let args = Args::parse_from([
            "ibc-harness",
            "results",
            "export",
            "20260101_000000_0001",
            "out.csv",
        ]);
        match args.command {
            Command::Results(results_args) => match results_args.action {
                ResultsAction::Export { id, output } => {
                    assert_eq!(id, "20260101_000000_0001");
                    assert_eq!(output, "out.csv");
                }
                _ => panic!("Expected Export action"),
            },
            _ => panic!("Expected Results command"),
        }
    }
}
