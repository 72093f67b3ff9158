use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookmarks")]
#[command(about = "Bookmark manager with metadata extraction and remote storage")]
#[command(version)]
pub struct Cli {
    /// Path to the collections config file
    #[arg(long, global = true, env = "BOOKMARKS_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a single bookmark
    Show {
        /// Collection name from the config file
        collection: String,
        /// Bookmark id
        id: String,
    },

    /// Add a bookmark, extracting title and description from the URL
    Add {
        /// Collection name from the config file
        collection: String,
        /// URL to bookmark
        url: String,

        /// Display name (defaults to the extracted title)
        #[arg(short, long)]
        name: Option<String>,

        /// Category; must be one of the collection's categories
        #[arg(short, long)]
        category: Option<String>,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,

        /// Description to store instead of the extracted one
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a bookmark
    Delete {
        /// Collection name from the config file
        collection: String,
        /// Bookmark id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List bookmarks in a collection
    List {
        /// Collection name from the config file
        collection: String,

        /// Oldest first instead of newest first
        #[arg(long)]
        ascending: bool,

        /// Walk every page instead of showing only the first
        #[arg(long)]
        all: bool,
    },

    /// Fetch full text (transcript or article body) and store it on the bookmark
    Crawl {
        /// Collection name from the config file
        collection: String,
        /// Bookmark id
        id: String,
    },
}
