//! SQLab command-line sandbox
//!
//! Explore the sample datasets and run SQL against a fresh in-memory copy.

mod explorer;
mod repl;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sqlab_engine::export::{to_csv, to_csv_quoted, to_json, write_csv};
use sqlab_engine::{EngineConfig, QueryEngine};
use sqlab_schema::{sample_query, DATASETS};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    Command::new("sqlab")
        .version(sqlab_engine::VERSION)
        .about("SQL practice sandbox over seeded sample datasets")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration file (TOML)"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .global(true)
                .value_parser(value_parser!(u64).range(1..))
                .help("Abort a query after this many milliseconds"),
        )
        .subcommand(
            Command::new("datasets")
                .about("List sample datasets, tables and columns")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("sample")
                .about("Print the sample query for a table")
                .arg(Arg::new("table").required(true)),
        )
        .subcommand(
            Command::new("query")
                .about("Run SQL against a freshly seeded database")
                .arg(Arg::new("sql").required(true))
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("table")
                        .value_parser(["table", "csv", "json"])
                        .help("Output format"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the result set as CSV to this file"),
                )
                .arg(
                    Arg::new("quoted")
                        .long("quoted")
                        .action(ArgAction::SetTrue)
                        .help("Quote CSV fields (RFC 4180)"),
                ),
        )
        .subcommand(
            Command::new("repl")
                .about("Interactive session; statements end with ';'")
                .arg(
                    Arg::new("quoted")
                        .long("quoted")
                        .action(ArgAction::SetTrue)
                        .help("Quote CSV fields on .export"),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<EngineConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(ms) = matches.get_one::<u64>("timeout-ms") {
        config.query_timeout_ms = Some(*ms);
    }
    Ok(config)
}

/// Started engine, or `None` after reporting the startup failure
async fn open_engine(config: EngineConfig) -> Option<QueryEngine> {
    let engine = QueryEngine::new(config);
    match engine.start().await {
        Ok(report) => {
            tracing::info!(
                "Provisioned {} datasets, {} tables, {} rows",
                report.datasets,
                report.tables,
                report.rows
            );
            Some(engine)
        }
        Err(err) => {
            tracing::error!("{}", err);
            eprintln!("{}", err.user_message());
            None
        }
    }
}

async fn run(matches: ArgMatches) -> anyhow::Result<ExitCode> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match matches.subcommand() {
        Some(("datasets", args)) => {
            if args.get_flag("json") {
                writeln!(out, "{}", serde_json::to_string_pretty(DATASETS)?)?;
            } else {
                write!(out, "{}", explorer::render_datasets(DATASETS))?;
            }
        }
        Some(("sample", args)) => {
            let table = args
                .get_one::<String>("table")
                .context("missing table argument")?;
            match sample_query(table) {
                Some(query) => writeln!(out, "{query}")?,
                None => {
                    eprintln!("Unknown table: {table}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Some(("query", args)) => {
            let config = load_config(args)?;
            let Some(engine) = open_engine(config).await else {
                return Ok(ExitCode::FAILURE);
            };
            let sql = args.get_one::<String>("sql").context("missing sql argument")?;
            let quoted = args.get_flag("quoted");
            let result = engine.execute(sql)?;

            match args.get_one::<String>("format").map(String::as_str) {
                Some("json") => writeln!(out, "{}", serde_json::to_string_pretty(&to_json(&result))?)?,
                Some("csv") => match result.result_set() {
                    Some(set) if quoted => writeln!(out, "{}", to_csv_quoted(set)?)?,
                    Some(set) => writeln!(out, "{}", to_csv(set))?,
                    None => repl::write_result(&mut out, &result)?,
                },
                _ => repl::write_result(&mut out, &result)?,
            }

            if let Some(path) = args.get_one::<PathBuf>("output") {
                write_csv(&result, path, quoted)?;
            }
            if !result.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(("repl", args)) => {
            let config = load_config(args)?;
            let Some(engine) = open_engine(config).await else {
                return Ok(ExitCode::FAILURE);
            };
            let mut session = repl::Repl::new(&engine, args.get_flag("quoted"));
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                writeln!(out, "SQLab {} (.quit to exit)", sqlab_engine::VERSION)?;
                session.run_interactive(&mut out)?;
            } else {
                session.run(stdin.lock(), &mut out)?;
            }
        }
        _ => {}
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli().get_matches()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
