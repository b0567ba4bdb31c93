//! Arbor CLI entry point.

use clap::Parser;

use arbor::cli::{commands, handle_error, Cli, Commands};
use arbor::infrastructure::config::ConfigLoader;
use arbor::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    // Held for the process lifetime so file output is flushed.
    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::List(args) => commands::list::execute(args, &config, cli.json).await,
        Commands::Show(args) => commands::show::execute(args, &config, cli.json).await,
        Commands::Path(args) => commands::path::execute(args, &config, cli.json).await,
        Commands::Note(args) => commands::note::execute(args, &config, cli.json).await,
        Commands::Exec(args) => commands::exec::execute(args, &config, cli.json).await,
        Commands::Remove(args) => commands::remove::execute(args, &config, cli.json).await,
        Commands::Prune(args) => commands::prune::execute(args, &config, cli.json).await,
        Commands::Pr(args) => commands::pr::execute(args, &config, cli.json).await,
        Commands::Label(args) => commands::label::execute(args, &config, cli.json).await,
        Commands::Sync => commands::sync::execute(&config, cli.json).await,
        Commands::Gc(args) => commands::gc::execute(args, &config, cli.json).await,
        Commands::Reset(args) => commands::reset::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
