mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "d2ref=info,d2kv=info,d2ref_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Configure {
            archive,
            database,
            languages,
            show,
        } => {
            commands::configure::handle(archive, database, languages, show)?;
        }

        Commands::Ingest {
            archive,
            database,
            languages,
            hero_lore,
            dry_run,
        } => {
            let config = Config::load()?;
            let archive = config.resolve_archive(archive)?;
            let database = config.resolve_database(database);
            let languages = config.resolve_languages(languages);
            commands::ingest::handle(&archive, &database, languages, hero_lore, dry_run).await?;
        }

        Commands::Patches { archive, format } => {
            let archive = Config::load()?.resolve_archive(archive)?;
            commands::patches::handle(&archive, format)?;
        }

        Commands::SpecialValue { values, format } => {
            commands::special_value::handle(&values, format)?;
        }
    }

    Ok(())
}
