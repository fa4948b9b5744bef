use crate::models::{Chat, ChatSummary, Role, StockComparison};
use crate::session::BackendStatus;
use colored::*;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.chars().count()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_prompt(text: &str) {
    use std::io::Write;

    print!("{}", text.yellow().bold());
    let _ = std::io::stdout().flush();
}

pub fn print_status(status: BackendStatus) {
    let label = format!("Backend: {}", status);
    match status {
        BackendStatus::Online => println!("{} {}", "●".green(), label),
        BackendStatus::Checking => println!("{} {}", "●".yellow(), label),
        BackendStatus::Offline => println!("{} {}", "●".red(), label),
    }
}

pub fn print_history(chats: &[ChatSummary]) {
    if chats.is_empty() {
        print_info("No chat history yet");
        return;
    }

    for chat in chats {
        println!(
            "{}  {}  {}",
            chat.id.dimmed(),
            chat.updated_at.format("%b %d").to_string().bright_black(),
            chat.title.bold()
        );
    }
}

pub fn print_chat(chat: &Chat) {
    print_header(&chat.title);
    for message in &chat.messages {
        match message.role {
            Role::User => println!("{} {}", "You:".yellow().bold(), message.content),
            Role::Assistant => println!("{} {}", "Assistant:".blue().bold(), message.content),
        }
    }
}

pub fn print_comparison(comparison: &StockComparison) {
    print_header("Comparison Results");
    if let Some(summary) = &comparison.summary {
        println!("{}\n", summary);
    }

    let rows = comparison.rows();
    if rows.is_empty() {
        return;
    }

    println!("{:<10} {:>12} {:>12}", "Symbol".bold(), "Price".bold(), "Change".bold());
    for (symbol, price, change) in rows {
        println!("{:<10} {:>12} {:>12}", symbol, price, change);
    }
}
