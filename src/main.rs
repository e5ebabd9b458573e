mod category_screen;
mod cli;
mod config;
mod models;
mod storage;
mod task_screen;

use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use thiserror::Error;

use category_screen::{CategoryScreen, CategoryScreenError};
use cli::{CategoryCommand, Cli, Commands, ConfigCommand, TaskCommand};
use config::{ConfigError, ConfigManager};
use task_screen::{TaskScreen, TaskScreenError};

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    CategoryScreen(#[from] CategoryScreenError),
    #[error("{0}")]
    TaskScreen(#[from] TaskScreenError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() {
    let _logger = init_logging();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

/// Logging goes to stderr so rendered views stay clean on stdout. RUST_LOG
/// overrides the default level.
fn init_logging() -> Option<flexi_logger::LoggerHandle> {
    flexi_logger::Logger::try_with_env_or_str("warn")
        .ok()?
        .log_to_stderr()
        .start()
        .ok()
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config_path = resolve_config_path(cli.config);
    let mut manager = ConfigManager::new(config_path.as_deref())?;

    match cli.command {
        Commands::Category { command } => run_category(&manager, command),
        Commands::Task { command } => run_task(&manager, command),
        Commands::Config { command } => run_config(&mut manager, command),
    }
}

/// --config wins over $CATODO_CONFIG; with neither, the config manager
/// falls back to its default location.
fn resolve_config_path(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| std::env::var_os("CATODO_CONFIG").map(PathBuf::from))
}

fn run_category(manager: &ConfigManager, command: CategoryCommand) -> Result<(), AppError> {
    let storage = manager.create_storage()?;
    let mut screen = CategoryScreen::open(storage.as_ref())?;

    match command {
        CategoryCommand::Add { name } => {
            screen.add_category(&name);
            print!("{}", screen.render());
        }
        CategoryCommand::List => {
            print!("{}", screen.render());
        }
        CategoryCommand::Delete { position } => {
            let deleted = screen.delete_category(position)?;
            println!("Deleted category {} and its tasks.", deleted.name);
            print!("{}", screen.render());
        }
        CategoryCommand::Use { selector } => {
            let selected = screen.select_category(&selector)?;
            println!("Opened category {}.", selected.name);
            let tasks = TaskScreen::open(storage.as_ref())?;
            print!("{}", tasks.render());
        }
    }
    Ok(())
}

fn run_task(manager: &ConfigManager, command: TaskCommand) -> Result<(), AppError> {
    let storage = manager.create_storage()?;
    let mut screen = TaskScreen::open(storage.as_ref())?;

    match command {
        TaskCommand::Add { title } => {
            screen.add_task(&title);
            print!("{}", screen.render());
        }
        TaskCommand::List => {
            print!("{}", screen.render());
        }
        TaskCommand::Delete { position } => {
            let deleted = screen.delete_task(position)?;
            println!("Deleted task {}.", deleted.title);
            print!("{}", screen.render());
        }
    }
    Ok(())
}

fn run_config(manager: &mut ConfigManager, command: ConfigCommand) -> Result<(), AppError> {
    match command {
        ConfigCommand::Get { key } => match manager.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(unset)"),
        },
        ConfigCommand::Set { key, value } => {
            manager.set(&key, &value)?;
        }
        ConfigCommand::Unset { key } => {
            manager.unset(&key)?;
        }
        ConfigCommand::List => {
            for (key, value, is_default) in manager.list() {
                if is_default {
                    println!("{} = {} (default)", key, value);
                } else {
                    println!("{} = {}", key, value);
                }
            }
        }
        ConfigCommand::Reset => {
            reset_with_confirmation(manager)?;
        }
    }
    Ok(())
}

fn reset_with_confirmation(manager: &ConfigManager) -> Result<(), AppError> {
    println!("Warning: This will delete all tasks and categories.");
    print!("Continue? [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    if answer.trim().eq_ignore_ascii_case("y") {
        manager.reset_data()?;
        println!("Database has been reset to an empty state.");
    } else {
        println!("Operation cancelled.");
    }
    Ok(())
}
