//! ClassLedger command line
//!
//! Runs one named operation against a persistent ledger directory and
//! prints the JSON result.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use classledger::storage::open_world_state;
use classledger::{AssignmentContract, Invocation, LedgerConfig, LedgerResult, Operation};

/// Parsed command line.
struct Cli {
    /// Ledger settings after env and flag overrides.
    config: LedgerConfig,
    /// Function to run.
    function: String,
    /// Positional arguments for the function.
    args: Vec<String>,
}

fn print_usage() {
    println!("classledger - classroom assignment ledger");
    println!();
    println!("USAGE:");
    println!("    classledger [OPTIONS] <FUNCTION> [ARGS...]");
    println!();
    println!("OPTIONS:");
    println!("    -d, --data-dir <DIR>      Ledger directory [default: ./ledger]");
    println!("        --no-sync             Do not fsync after every write");
    println!("    -h, --help                Print help information");
    println!();
    println!("FUNCTIONS:");
    for name in Operation::function_names() {
        let params = Operation::parameters(name).unwrap_or_default();
        println!("    {name} {}", params.join(" "));
    }
    println!();
    println!("ENVIRONMENT:");
    println!("    CLASSLEDGER_DATA_DIR, CLASSLEDGER_SYNC_ON_WRITE, CLASSLEDGER_MAX_WAL_SIZE");
    println!("    RUST_LOG                  Log filter [default: info]");
}

fn parse_args(mut config: LedgerConfig) -> Cli {
    let args: Vec<String> = std::env::args().collect();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" | "-d" => {
                if i + 1 < args.len() {
                    config.data_dir = PathBuf::from(&args[i + 1]);
                    i += 2;
                } else {
                    eprintln!("error: --data-dir requires a value");
                    std::process::exit(2);
                }
            }
            "--no-sync" => {
                config.persistent.sync_on_write = false;
                i += 1;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("error: unknown argument: {arg}");
                std::process::exit(2);
            }
            _ => break,
        }
    }

    let Some(function) = args.get(i).cloned() else {
        eprintln!("error: missing function name (see --help)");
        std::process::exit(2);
    };

    Cli {
        config,
        function,
        // Everything after the function name is positional, including
        // values such as a negative grade.
        args: args[i + 1..].to_vec(),
    }
}

fn run(cli: Cli) -> LedgerResult<String> {
    let config = cli.config.validate()?;
    let state = open_world_state(&config.data_dir, Some(config.persistent))?;
    tracing::debug!(data_dir = %config.data_dir.display(), keys = state.len()?, "ledger opened");

    let contract = AssignmentContract::new(Arc::new(state));
    let invocation = Invocation::new(cli.function, cli.args);
    let response = contract.invoke(&invocation)?;
    Ok(response.to_json_pretty()?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let config = match LedgerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let cli = parse_args(config);

    match run(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
