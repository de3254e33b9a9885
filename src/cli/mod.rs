//! CLI module - Command-line interface for cinesearch
//!
//! `serve` runs the API server; the other commands are a terminal client
//! talking to a running server.

mod commands;

use clap::{Parser, Subcommand};

/// Cinesearch - movie discovery server and terminal client
#[derive(Parser)]
#[command(name = "cinesearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Server URL for client commands (overrides config)
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    Init,

    /// Search movies by title
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
        /// Only keep movies in this genre (see `genres`)
        #[arg(long)]
        genre: Option<i64>,
    },

    /// List movie genres
    Genres,

    /// Show full details for a movie
    #[command(alias = "i", alias = "info")]
    Details {
        /// TMDB movie ID
        id: i64,
    },

    /// Recent searches
    #[command(alias = "h")]
    History {
        #[command(subcommand)]
        command: Option<HistoryCommands>,
    },

    /// Liked movies and watchlist
    #[command(alias = "fav")]
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Show recent searches
    #[command(alias = "ls")]
    List,
    /// Forget one search term
    #[command(alias = "rm")]
    Remove {
        #[arg(required = true)]
        term: Vec<String>,
    },
    /// Forget all searches
    Clear,
}

#[derive(Subcommand)]
pub enum FavoritesCommands {
    /// Show saved movies
    #[command(alias = "ls")]
    List {
        /// Show the watchlist instead of liked movies
        #[arg(long, short)]
        watchlist: bool,
        /// Only show titles containing this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Save a movie
    Add {
        id: i64,
        #[arg(long, short)]
        watchlist: bool,
    },
    /// Remove a saved movie
    #[command(alias = "rm")]
    Remove {
        id: i64,
        #[arg(long, short)]
        watchlist: bool,
    },
}

pub use commands::*;
