mod commands;

pub use commands::{Cli, Commands, HistoryAction, StockAction};
