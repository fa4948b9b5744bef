use anyhow::{Context, Result};
use clap::Parser;
use company_research::cli::{Cli, Commands, HistoryAction, StockAction};
use company_research::session::{
    ChatController, ControllerError, HealthMonitor, HealthMonitorHandle,
};
use company_research::{utils, ChatService, ResearchClient, Settings};
use std::time::Duration;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::new()
        .context("Failed to load settings")?
        .with_base_url(cli.base_url)
        .with_storage_dir(cli.storage_dir);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let client = ResearchClient::new(&settings.api).context("Invalid API configuration")?;

    match cli.command {
        Commands::Chat { chat_id } => handle_chat(&settings, client, chat_id).await,
        Commands::Ask { prompt } => handle_ask(&settings, client, prompt).await,
        Commands::History { action } => handle_history(&settings, action).await,
        Commands::Stocks { action } => handle_stocks(client, action).await,
        Commands::Health { watch } => handle_health(client, watch).await,
    }
}

async fn controller(settings: &Settings, client: ResearchClient) -> Result<ChatController> {
    let service = ChatService::from_settings(settings)
        .await
        .context("Failed to open chat history")?;
    let mut controller = ChatController::new(service, client);
    controller.start().await?;
    Ok(controller)
}

async fn handle_ask(settings: &Settings, client: ResearchClient, prompt: String) -> Result<()> {
    let mut controller = controller(settings, client).await?;
    utils::print_status(controller.status());

    let reply = controller.send_message(&prompt).await?;
    println!("\n{}", reply.content);
    Ok(())
}

async fn handle_chat(
    settings: &Settings,
    client: ResearchClient,
    chat_id: Option<String>,
) -> Result<()> {
    let mut controller = controller(settings, client.clone()).await?;
    let monitor = HealthMonitor::new(client, settings.api.health_interval()).spawn();

    let result = chat_loop(&mut controller, &monitor, chat_id).await;
    monitor.shutdown().await;
    result
}

async fn chat_loop(
    controller: &mut ChatController,
    monitor: &HealthMonitorHandle,
    chat_id: Option<String>,
) -> Result<()> {
    match chat_id {
        Some(id) => {
            let chat = controller.select_chat(&id).await?;
            utils::print_chat(chat);
        }
        None => {
            utils::print_header("Company Research Assistant");
            utils::print_info(
                "Ask me anything about companies, their financials, news, or stock performance.",
            );
            utils::print_info("Type /help for commands, Ctrl+C to exit\n");
        }
    }
    utils::print_status(controller.status());

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        controller.apply_health_report(&monitor.latest());

        utils::print_prompt("You: ");
        let mut input = String::new();
        if reader.read_line(&mut input).await? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/exit" | "/quit" => break,
            "/help" => {
                println!("Special commands:");
                println!("  /new     - Start a new chat");
                println!("  /history - List saved chats");
                println!("  /status  - Re-check the backend");
                println!("  /exit    - Leave");
                continue;
            }
            "/new" => {
                controller.new_chat().await?;
                utils::print_success("New chat started");
                continue;
            }
            "/history" => {
                controller.refresh_history().await?;
                utils::print_history(controller.chats());
                continue;
            }
            "/status" => {
                let status = controller.check_backend().await;
                utils::print_status(status);
                continue;
            }
            _ => {}
        }

        match controller.send_message(input).await {
            Ok(reply) => {
                utils::print_info("Assistant: ");
                println!("{}\n", reply.content);
            }
            Err(ControllerError::BackendUnavailable(status)) => {
                utils::print_error(&format!(
                    "Backend connection error ({}). Use /status to retry.",
                    status
                ));
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

async fn handle_history(settings: &Settings, action: HistoryAction) -> Result<()> {
    let service = ChatService::from_settings(settings)
        .await
        .context("Failed to open chat history")?;

    match action {
        HistoryAction::List => {
            let mut chats: Vec<_> = service
                .get_chats()
                .await?
                .iter()
                .map(|c| c.summary())
                .collect();
            chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            utils::print_history(&chats);
        }
        HistoryAction::Show { chat_id } => match service.get_chat(&chat_id).await? {
            Some(chat) => utils::print_chat(&chat),
            None => utils::print_error(&format!("Chat '{}' not found", chat_id)),
        },
        HistoryAction::New => {
            let chat = service.create_chat().await?;
            utils::print_success(&format!("Created chat {}", chat.id));
        }
        HistoryAction::Rename { chat_id, title } => {
            if title.trim().is_empty() {
                utils::print_error("Title cannot be empty");
            } else {
                service.update_chat_title(&chat_id, &title).await?;
                utils::print_success("Chat renamed");
            }
        }
        HistoryAction::Delete { chat_id } => {
            service.delete_chat(&chat_id).await?;
            utils::print_success("Chat deleted");
        }
    }

    Ok(())
}

async fn handle_stocks(client: ResearchClient, action: StockAction) -> Result<()> {
    match action {
        StockAction::Compare { symbols } => match client.compare_stocks(&symbols).await {
            Ok(comparison) => utils::print_comparison(&comparison),
            Err(e) => {
                tracing::error!("Stock comparison failed: {}", e);
                utils::print_error(
                    "Failed to fetch stock data. Please check the symbols and try again.",
                );
            }
        },
        StockAction::Price { symbol } => {
            let quote = client
                .fetch_stock_price(&symbol)
                .await
                .context("Failed to fetch stock price")?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
    }

    Ok(())
}

async fn handle_health(client: ResearchClient, watch: Option<u64>) -> Result<()> {
    let Some(interval) = watch else {
        let status = company_research::session::health_monitor::probe(&client).await;
        utils::print_status(status);
        return Ok(());
    };

    let monitor = HealthMonitor::new(client, Duration::from_secs(interval)).spawn();
    let mut reports = monitor.subscribe();

    loop {
        tokio::select! {
            changed = reports.changed() => {
                if changed.is_err() {
                    break;
                }
                let report = reports.borrow_and_update().clone();
                if let Some(checked) = report.last_checked {
                    // Clear screen (works on most terminals)
                    print!("\x1B[2J\x1B[1;1H");
                    utils::print_status(report.status);
                    println!(
                        "Last checked: {}",
                        checked.with_timezone(&chrono::Local).format("%H:%M:%S")
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    monitor.shutdown().await;
    Ok(())
}
