//! IBC Harness - end-to-end testing for IBC-enabled CosmWasm contracts
//!
//! Deploys contracts on two chains, opens channels between their ports,
//! relays packets and checks the acknowledgements that come back.
//!
//! ## Features
//!
//! - Contract registry: upload and instantiate a named set of contracts
//! - Channel bring-up with version negotiation checks
//! - Acknowledgement decoding through nested base64 envelopes
//! - Relay assertions on packet counts and ack polarity
//! - Multiple output formats (Table, JSON, CSV) and stored runs
//!
//! ## Usage
//!
//! ```bash
//! # Run every scenario against the in-memory network
//! ibc-harness run
//!
//! # Run one scenario with stage timings
//! ibc-harness run --scenario counter-sync --stages
//!
//! # Decode an acknowledgement
//! ibc-harness decode '{"result":"eyJjb3VudCI6MX0="}'
//!
//! # Query a live chain
//! ibc-harness query smart wasm1... '{"get_count":{}}' --lcd http://localhost:1317
//! ```

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Parser;
use std::path::Path;
use tracing::info;

mod chain;
mod cli;
mod config;
mod executor;
mod harness;
mod models;
mod output;
mod relayer;
mod results;
mod scenarios;
mod utils;

use chain::{ChainQuery, LcdClient};
use cli::Args;
use config::{ConfigFile, EnvConfig};
use executor::ScenarioRunner;
use harness::{AckDecoder, PathStep};
use models::{AckRecord, Scenario};
use output::{OutputFormat, ResultFormatter};
use results::{ExportFormat, ResultsStorage, StoredRun};
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    init_logger(LogLevel::resolve(args.verbose, env.log.as_deref()));

    match args.command {
        cli::Command::Run(run_args) => {
            let passed = run_scenarios(run_args, &env).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        cli::Command::List(list_args) => {
            list_scenarios(list_args);
        }
        cli::Command::Decode(decode_args) => {
            decode_ack(decode_args)?;
        }
        cli::Command::Query(query_args) => {
            query_chain(query_args, &env).await?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, &env)?;
        }
        cli::Command::Results(results_args) => {
            show_results(results_args, &env)?;
        }
    }

    Ok(())
}

fn parse_scenarios(values: &[String]) -> Result<Vec<Scenario>> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            Scenario::from_str(value).ok_or_else(|| anyhow::anyhow!("Unknown scenario: {value}"))
        })
        .collect()
}

/// Returns whether every selected scenario passed
async fn run_scenarios(args: cli::RunArgs, env: &EnvConfig) -> Result<bool> {
    let config = ConfigFile::resolve(args.config.as_deref(), env)?;

    let selected = parse_scenarios(&args.scenario)?;
    let skip = parse_scenarios(args.skip.as_slice())?;

    let format_name = args.format.clone().unwrap_or_else(|| env.format_or("table"));
    let format = OutputFormat::from_str(&format_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {format_name}"))?;

    info!(
        "Testing {} with channel version {} ({})",
        config.network_name(),
        config.ibc.version,
        config.ibc.ordering
    );

    let runner = ScenarioRunner::new(config).with_skip(skip);
    let summary = if selected.is_empty() {
        runner.run_all().await
    } else {
        runner.run_scenarios(&selected).await
    };

    let mut formatter = ResultFormatter::new(format);
    if args.stages {
        formatter = formatter.with_stages();
    }
    match summary.results.as_slice() {
        [single] if selected.len() == 1 => println!("{}", formatter.format_result(single)),
        _ => println!("{}", formatter.format_summary(&summary)),
    }

    if let Some(path) = &args.output {
        output::write_results_to_file(path, &summary, format)?;
        println!("✓ Results written to: {path}");
    }

    let passed = summary.is_all_passed();

    if args.save {
        let storage = ResultsStorage::from_config(runner.config());
        let run = StoredRun::new(runner.config(), summary);
        let path = storage.save(&run)?;
        println!("✓ Run {} saved to: {}", run.id, path.display());
    }

    Ok(passed)
}

fn list_scenarios(args: cli::ListArgs) {
    let scenarios = Scenario::all();
    println!("\nIBC Scenarios ({} total)\n", scenarios.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut current_category = "";

    for scenario in scenarios {
        let category = scenario.category();
        if category != current_category {
            println!("\n{category}:");
            println!("──────────────────────────────────────────────────────────────────────");
            current_category = category;
        }

        if args.detailed {
            println!(
                "  {:2}. {:24} {}",
                scenario.number(),
                scenario.name(),
                scenario.description()
            );
        } else {
            println!("  {:2}. {}", scenario.number(), scenario.name());
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

/// Raw ack bytes from JSON text or base64 of the JSON bytes
fn ack_bytes(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.as_bytes().to_vec());
    }
    STANDARD
        .decode(trimmed)
        .context("Acknowledgement is neither JSON nor base64")
}

fn decode_ack(args: cli::DecodeArgs) -> Result<()> {
    let ack = AckRecord::from_bytes(ack_bytes(&args.ack)?);
    let decoder = AckDecoder::new().max_depth(args.max_depth);

    let decoded = match &args.path {
        Some(path) => decoder.decode_path(&ack, &PathStep::parse_path(path))?,
        None if args.nested => decoder.decode_nested(ack.as_bytes())?,
        None => decoder.decode(&ack)?,
    };

    if decoded.is_success() {
        println!("✓ Success acknowledgement");
    } else {
        println!("✗ Error acknowledgement");
    }
    println!("{}", serde_json::to_string_pretty(&decoded.to_json())?);
    Ok(())
}

async fn query_chain(args: cli::QueryArgs, env: &EnvConfig) -> Result<()> {
    let lcd_url = match args.lcd {
        Some(url) => url,
        None => ConfigFile::resolve(None, env)?.chains.a.lcd_url,
    };
    let client = LcdClient::with_timeout(&lcd_url, args.timeout)?;
    info!("Querying {}", client.base_url());

    match args.action {
        cli::QueryAction::Contract { address } => {
            let info = client.contract_info(&address).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        cli::QueryAction::Smart { address, query } => {
            let query: serde_json::Value =
                serde_json::from_str(&query).context("Query is not valid JSON")?;
            let response = client.query_contract_smart(&address, &query).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        cli::QueryAction::Balance { address, denom } => {
            let coin = client.balance(&address, &denom).await?;
            println!("{coin}");
        }
    }

    Ok(())
}

fn manage_config(args: cli::ConfigArgs, env: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            let config = ConfigFile::example()?;
            ConfigFile::save(&config, path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to point at your chains and contract artifacts.");
        }

        cli::ConfigAction::Show { env: show_env, format } => {
            if show_env {
                if !env.has_any() {
                    println!("No IBC_HARNESS_* variables are set.\n");
                }
                env.print_summary();
            } else {
                let config = ConfigFile::resolve(None, env)?;
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| ConfigFile::find().map(|p| p.to_string_lossy().to_string()))
                .unwrap_or_else(|| "./ibc-harness.yaml".to_string());

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {path}");
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Env => {
            config::env::print_env_help();
        }
    }

    Ok(())
}

fn show_results(args: cli::ResultsArgs, env: &EnvConfig) -> Result<()> {
    let storage = match &args.dir {
        Some(dir) => ResultsStorage::new(dir),
        None => ResultsStorage::from_config(&ConfigFile::resolve(None, env)?),
    };

    match args.action {
        cli::ResultsAction::List => {
            let runs = storage.list_runs()?;

            if runs.is_empty() {
                println!("\n📭 No stored results in {}.", storage.base_dir().display());
                println!("   Run scenarios with: ibc-harness run --save");
                return Ok(());
            }

            let rule = "─".repeat(85);
            println!("\n┌{rule}┐");
            println!("│ {:83} │", "Stored Runs");
            println!("├{rule}┤");

            for run in &runs {
                println!(
                    "│ {:20} │ {} │ {:22} │ {:>7} │ {:5.1}% │",
                    run.id,
                    run.timestamp.format("%Y-%m-%d %H:%M"),
                    run.network,
                    format!("{}/{}", run.passed, run.total),
                    run.pass_rate
                );
            }

            println!("└{rule}┘");
            println!("\nUse 'results show <id>' to view a run.\n");
        }

        cli::ResultsAction::Show { id, format } => {
            let run = match id {
                Some(id) => storage.load(&id)?,
                None => match storage.latest()? {
                    Some(run) => run,
                    None => {
                        println!("No stored results found.");
                        return Ok(());
                    }
                },
            };

            let format = OutputFormat::from_str(&format)
                .ok_or_else(|| anyhow::anyhow!("Unknown output format: {format}"))?;

            println!(
                "Run {} | {} | {} | channel version {}",
                run.id,
                run.timestamp.to_rfc3339(),
                run.network,
                run.ibc_version
            );
            println!(
                "{}",
                ResultFormatter::new(format)
                    .with_stages()
                    .format_summary(&run.summary)
            );
        }

        cli::ResultsAction::Export { id, output } => {
            let path = Path::new(&output);
            let format = ExportFormat::from_extension(path).ok_or_else(|| {
                anyhow::anyhow!("Cannot infer export format from {output}; use .json or .csv")
            })?;

            let run = storage.load(&id)?;
            storage.export(&run, path, format)?;
            println!("✓ Run {id} exported to: {output}");
        }

        cli::ResultsAction::Delete { id } => {
            storage.delete(&id)?;
            println!("✓ Run {id} deleted");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_bytes_accepts_json_and_base64() {
        let json = r#"{"error":"boom"}"#;
        assert_eq!(ack_bytes(json).unwrap(), json.as_bytes());
        assert_eq!(ack_bytes(&STANDARD.encode(json)).unwrap(), json.as_bytes());
        assert!(ack_bytes("not base64!").is_err());
    }

    #[test]
    fn test_parse_scenarios() {
        let scenarios =
            parse_scenarios(&["1,handshake-rejected".to_string(), "3".to_string()]).unwrap();
        assert_eq!(
            scenarios,
            vec![
                Scenario::CounterSync,
                Scenario::HandshakeRejected,
                Scenario::ErrorAcknowledgement
            ]
        );
        assert!(parse_scenarios(&["9".to_string()]).is_err());
        assert!(parse_scenarios(&[]).unwrap().is_empty());
    }
}
