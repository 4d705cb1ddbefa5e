//! kubechart CLI - turn plain Kubernetes manifests into Helm charts

use clap::{Parser, Subcommand};
use std::env;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod display;
mod error;
mod exit_codes;
mod extractor;
mod pipeline;
mod writer;

#[derive(Parser)]
#[command(name = "kubechart")]
#[command(author = "kubechart Contributors")]
#[command(version)]
#[command(about = "Convert Kubernetes manifests into Helm charts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert manifests into one or more Helm charts
    Convert(commands::convert::ConvertArgs),
}

fn init_logging(debug: bool, quiet: bool) {
    let level = if debug {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let mut filter = EnvFilter::from_default_env();
    if env::var("RUST_LOG").is_err()
        && let Ok(directive) = format!("kubechart={}", level).parse()
    {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug, cli.quiet);

    let result = match cli.command {
        Commands::Convert(args) => commands::convert::run(args, cli.quiet),
    };

    let code = match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}
