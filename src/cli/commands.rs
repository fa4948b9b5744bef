use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "company-research")]
#[command(author, version, about = "Chat with the Company Research Assistant", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides api.base_url)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory for offline chat history (overrides storage.dir)
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive research chat
    Chat {
        /// Resume an existing chat instead of starting a new one
        #[arg(short, long)]
        chat_id: Option<String>,
    },

    /// Ask a single question and print the answer
    Ask { prompt: String },

    /// Manage saved conversations
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Stock prices and comparisons
    Stocks {
        #[command(subcommand)]
        action: StockAction,
    },

    /// Check whether the backend is reachable
    Health {
        /// Keep polling, refreshing every N seconds
        #[arg(short, long)]
        watch: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List saved chats, most recent first
    List,

    /// Print every message of a chat
    Show { chat_id: String },

    /// Create an empty chat
    New,

    Rename { chat_id: String, title: String },

    Delete { chat_id: String },
}

#[derive(Subcommand)]
pub enum StockAction {
    /// Compare comma-separated symbols, e.g. AAPL,MSFT,GOOGL
    Compare { symbols: String },

    /// Latest price for one symbol
    Price { symbol: String },
}
