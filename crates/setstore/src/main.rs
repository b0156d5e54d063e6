mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::debug;
use setstore_core::settings::{from_entries, plain_text};
use setstore_core::{build_storage, LogSelectionLogger, Result, SettingsStorage};

use crate::cli::{parse_default, parse_value, CliArgs, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let env = env_logger::Env::default().default_filter_or(args.log_level());
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let config = args.storage_config()?;
    debug!("Storage configuration: {:?}", config);
    let storage = build_storage(&config, Arc::new(LogSelectionLogger)).await;

    match args.command {
        Commands::Get { key, default } => {
            let value = storage.get(&key, parse_default(default.as_deref()), None).await?;
            if !value.is_null() {
                println!("{}", plain_text(&value));
            }
        }
        Commands::Store { key, value, json } => {
            storage.store(&key, parse_value(&value, json)?, None).await?;
        }
        Commands::Delete { key } => storage.delete(&key, None).await?,
        Commands::Has { key } => println!("{}", storage.has(&key, None).await?),
        Commands::List { all_modules } => list(storage.as_ref(), all_modules).await?,
        Commands::Clear { all_modules } => {
            if all_modules {
                storage.delete_all_modules().await?;
            } else {
                storage.delete_all(None).await?;
            }
        }
        Commands::Export { format } => {
            let settings = from_entries(storage.get_all_modules().await?);
            println!("{}", format.serialize(&settings)?.trim_end());
        }
    }
    Ok(())
}

async fn list(storage: &dyn SettingsStorage, all_modules: bool) -> Result<()> {
    if all_modules {
        for entry in storage.get_all_modules().await? {
            println!("{}.{}={}", entry.module, entry.key, plain_text(&entry.value));
        }
    } else {
        for entry in storage.get_all(None).await? {
            println!("{}={}", entry.key, plain_text(&entry.value));
        }
    }
    Ok(())
}
