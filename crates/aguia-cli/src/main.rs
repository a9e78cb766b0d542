//! Aguia CLI - operator tool for stored accessibility preferences
//!
//! Works against the local preference database, or against a running
//! aguia-api through `aguia remote`.

mod cli;
mod commands;
mod error;
mod remote;
#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, RemoteCommands};
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::export::run_export;
use crate::commands::remote::{run_remote_get, run_remote_save};
use crate::commands::set::run_set;
use crate::commands::show::run_show;
use crate::commands::users::run_users;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::from_default_env();
    let filter = match "aguia=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Show { user, json } => run_show(&user, json, &db_path).await?,
        Commands::Set { user, values } => run_set(&user, values, &db_path).await?,
        Commands::Delete { user } => {
            run_delete(&user, &db_path).await?;
        }
        Commands::Export {
            user,
            format,
            output,
        } => run_export(&user, format, output.as_deref(), &db_path).await?,
        Commands::Users { json } => run_users(json, &db_path).await?,
        Commands::Remote { command } => match command {
            RemoteCommands::Get { target, json } => run_remote_get(&target, json).await?,
            RemoteCommands::Save { target, values } => run_remote_save(&target, values).await?,
        },
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
