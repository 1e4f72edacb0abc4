use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod parsing;
mod registry;
mod resolve;
mod services;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("onto_match=debug,info")
    } else {
        EnvFilter::new("onto_match=warn")
    };

    // Results may go to stdout, so logs stay on stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Convert(args) => {
            cli::convert::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Idtypes(args) => {
            cli::idtypes::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Template(args) => {
            cli::template::run(args, cli.verbose)?;
        }
    }

    Ok(())
}
