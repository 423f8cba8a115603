//! semfora-rts CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use semfora_rts::cli::{Cli, Commands};
use semfora_rts::commands::{
    run_analyze, run_baseline, run_graph, run_init, run_instrument, run_select, CommandContext,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// Logs go to stderr so stdout stays parseable in json/toon formats.
/// `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "semfora_rts=debug"
    } else {
        "semfora_rts=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> semfora_rts::Result<String> {
    let ctx = CommandContext::from_cli(cli.format, cli.verbose, cli.config.clone());

    match &cli.command {
        Commands::Analyze(args) => run_analyze(args, &ctx),
        Commands::Instrument(args) => run_instrument(args, &ctx),
        Commands::Baseline(args) => run_baseline(args, &ctx),
        Commands::Graph(args) => run_graph(args, &ctx),
        Commands::Select(args) => run_select(args, &ctx),
        Commands::Init(args) => run_init(args, &ctx),
    }
}
