use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Category-scoped task tracker with two views: the category list and the
/// task list of whichever category is currently open.
#[derive(Parser)]
#[command(name = "catodo", version, about = "Category-scoped task tracker")]
pub struct Cli {
    /// Path to the config file. Falls back to $CATODO_CONFIG, then to
    /// ~/.config/catodo/config.json.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Work with the category list.
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },

    /// Work with the tasks of the currently open category.
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Inspect or change configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommand {
    /// Add a category. Names that trim to nothing are ignored.
    Add {
        /// Name of the new category.
        name: String,
    },

    /// List categories with their task counts.
    List,

    /// Delete the category at a position, together with its tasks.
    Delete {
        /// Position in the list, counted from 1.
        position: usize,
    },

    /// Open a category so task commands apply to it.
    Use {
        /// Position in the list, or a category name.
        selector: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Add a task to the open category, due immediately.
    Add {
        /// Title of the new task. Titles that trim to nothing are ignored.
        title: String,
    },

    /// List the open category's tasks.
    List,

    /// Delete the task at a position.
    Delete {
        /// Position in the list, counted from 1.
        position: usize,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print one config value.
    Get {
        /// Config key, e.g. storage.type.
        key: String,
    },

    /// Set a config value.
    Set {
        /// Config key, e.g. storage.type.
        key: String,
        /// New value.
        value: String,
    },

    /// Clear a config value, falling back to its default.
    Unset {
        /// Config key, e.g. storage.type.
        key: String,
    },

    /// List config keys with defaults and overrides.
    List,

    /// Delete all tasks and categories.
    Reset,
}
