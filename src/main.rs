use clap::Parser;
use tracing_subscriber::EnvFilter;
use vaultgate::cli::{Cli, Commands};

/// Environment variable holding the log filter (e.g. `vaultgate=debug`).
const LOG_ENV: &str = "VAULTGATE_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => vaultgate::cli::commands::init::execute(&cli),
        Commands::Get { ref name } => vaultgate::cli::commands::get::execute(&cli, name),
        Commands::Set {
            ref name,
            prompt,
            ref recipe,
        } => vaultgate::cli::commands::set::execute(&cli, name, prompt, recipe.as_deref()),
        Commands::List { ref filter, long } => {
            vaultgate::cli::commands::list::execute(&cli, filter, long)
        }
        Commands::Unset { ref name, force } => {
            vaultgate::cli::commands::unset::execute(&cli, name, force)
        }
        Commands::Delete { ref name, force } => {
            vaultgate::cli::commands::delete::execute(&cli, name, force)
        }
        Commands::Merge { ref path } => vaultgate::cli::commands::merge::execute(&cli, path),
        Commands::Passwd => vaultgate::cli::commands::passwd::execute(&cli),
        Commands::Generate { ref recipe } => {
            vaultgate::cli::commands::generate::execute(&cli, recipe.as_deref())
        }
    };

    if let Err(e) = result {
        vaultgate::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
