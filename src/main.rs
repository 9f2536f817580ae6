use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

mod domain;
mod application;
mod infrastructure;

use application::dispatcher::{Dispatcher, Reply, CONFIRM_CALLBACK};
use application::messaging::MessageParser;
use domain::entities::{Content, MessageType, User};
use domain::traits::Bot;
use infrastructure::adapters::console::ConsoleAdapter;
use infrastructure::adapters::telegram::{TelegramAdapter, Update};
use infrastructure::config::Config;
use infrastructure::payment::CeloRpcChecker;
use infrastructure::session::InMemorySessionStore;

#[derive(Parser)]
#[command(name = "goodmarket-bot")]
#[command(about = "A Telegram shop bot paid in G$ on Celo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot
    Run,
    /// Start an interactive console session (dev mode)
    Console,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(cli.config, cli.token);
        }
        Commands::Console => {
            run_console(cli.config);
        }
        Commands::Version => {
            println!("goodmarket-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn load_config(config_path: &str) -> Config {
    if std::path::Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    }
}

/// Build the dispatcher from config, or exit on fatal misconfiguration
fn build_dispatcher(config: &Config) -> Arc<Dispatcher> {
    let receiver = config.receiver_address().unwrap_or_else(|e| {
        tracing::error!("{}", e);
        std::process::exit(1);
    });

    let checker = CeloRpcChecker::new(
        config.payment.rpc_endpoint.as_str(),
        config.payment.token_contract.as_str(),
        Duration::from_secs(config.payment.rpc_timeout_seconds),
    )
    .unwrap_or_else(|e| {
        tracing::error!("Failed to build RPC client: {}", e);
        std::process::exit(1);
    });

    Arc::new(Dispatcher::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(checker),
        receiver,
        config.payment.price,
        config.payment.min_amount,
    ))
}

fn run_bot(config_path: String, token_override: Option<String>) {
    let config = load_config(&config_path);
    tracing::info!("Starting {}", config.bot.name);

    let token = token_override
        .or_else(|| config.telegram_token())
        .unwrap_or_else(|| {
            tracing::error!("Missing required setting: bot token (use --token, config, or BOT_TOKEN)");
            std::process::exit(1);
        });

    let dispatcher = build_dispatcher(&config);
    let parser = Arc::new(MessageParser::new(config.bot.prefix.as_str()));

    let rt = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
    rt.block_on(async {
        let mut bot = TelegramAdapter::new(token);

        if let Err(e) = bot.register_commands().await {
            tracing::warn!("Failed to register commands: {}", e);
        }

        run_telegram_bot(bot, dispatcher, parser).await;
    });
}

async fn run_telegram_bot(mut bot: TelegramAdapter, dispatcher: Arc<Dispatcher>, parser: Arc<MessageParser>) {
    if let Err(e) = bot.fetch_bot_info().await {
        tracing::error!("Failed to fetch bot info: {}", e);
        return;
    }

    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let bot = Arc::new(bot);
    let mut offset: i64 = 0;
    let timeout_seconds = 30;

    tracing::info!("Starting message loop...");

    loop {
        match bot.get_updates(offset, timeout_seconds).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::debug!("Received {} updates", updates.len());
                    offset = TelegramAdapter::get_next_offset(&updates);
                }
                for update in updates {
                    // One task per update; a slow payment check must not
                    // stall other users' events
                    let bot = Arc::clone(&bot);
                    let dispatcher = Arc::clone(&dispatcher);
                    let parser = Arc::clone(&parser);
                    tokio::spawn(async move {
                        handle_update(bot, dispatcher, parser, update).await;
                    });
                }
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

async fn handle_update(
    bot: Arc<TelegramAdapter>,
    dispatcher: Arc<Dispatcher>,
    parser: Arc<MessageParser>,
    update: Update,
) {
    if let Some(msg) = &update.message {
        let chat_id = msg.chat.id.to_string();
        let Some(text) = msg.text.as_deref() else {
            return;
        };

        let sender = msg.from.as_ref().map(|u| {
            let mut user = User::new(u.id.to_string());
            if let Some(ref username) = u.username {
                user = user.with_username(username.clone());
            }
            if let Some(ref first) = u.first_name {
                user = user.with_first_name(first.clone());
            }
            user
        });

        let parsed = parser.parse(chat_id.as_str(), text, sender).with_platform("telegram");
        let reply = match &parsed.content {
            Content::Command { name, args } => match name.as_str() {
                "start" => dispatcher.start(),
                "wallet" => match dispatcher.set_wallet(parsed.session_key(), args).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::error!("Failed to store wallet: {}", e);
                        Reply::Text("⚠️ Something went wrong, please try again.".to_string())
                    }
                },
                "buy" => dispatcher.buy(),
                other => dispatcher.unknown(other),
            },
            _ => {
                tracing::debug!("Ignoring non-command {} message in {}", parsed.message_type.as_str(), chat_id);
                return;
            }
        };

        send_reply(bot.as_ref(), &chat_id, reply).await;
    }

    if let Some(cb) = &update.callback_query {
        let _ = bot.answer_callback(&cb.id, None).await;

        if cb.data.as_deref() != Some(CONFIRM_CALLBACK) {
            tracing::debug!("Ignoring unknown callback data: {:?}", cb.data);
            return;
        }

        let Some(prompt) = &cb.message else {
            return;
        };
        let chat_id = prompt.chat.id.to_string();
        let message_id = prompt.message_id.to_string();
        let user_id = cb.from.id.to_string();

        match dispatcher.confirm_payment(&user_id).await {
            Ok(reply) => {
                if let Err(e) = bot.edit_message(&chat_id, &message_id, &reply.edit).await {
                    tracing::warn!("Failed to edit prompt message: {}", e);
                }
                if let Some(followup) = reply.followup {
                    if let Err(e) = bot.send_message(&chat_id, &followup).await {
                        tracing::error!("Failed to send message: {}", e);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Confirm flow failed: {}", e);
                let _ = bot
                    .send_message(&chat_id, "⚠️ Something went wrong, please try again.")
                    .await;
            }
        }
    }
}

async fn send_reply(bot: &dyn Bot, chat_id: &str, reply: Reply) {
    let result = match reply {
        Reply::Text(text) => bot.send_message(chat_id, &text).await,
        Reply::WithKeyboard { text, buttons } => bot.send_with_keyboard(chat_id, &text, buttons).await,
    };
    if let Err(e) = result {
        tracing::error!("Failed to send message: {}", e);
    }
}

fn run_console(config_path: String) {
    let config = load_config(&config_path);
    let dispatcher = build_dispatcher(&config);
    let parser = MessageParser::new(config.bot.prefix.as_str());

    let rt = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
    rt.block_on(async {
        run_console_bot(ConsoleAdapter::new(), dispatcher, parser).await;
    });
}

async fn run_console_bot(bot: ConsoleAdapter, dispatcher: Arc<Dispatcher>, parser: MessageParser) {
    if let Err(e) = bot.start().await {
        tracing::error!("Failed to start bot: {}", e);
        return;
    }

    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let chat_id = "console";

    loop {
        let Some(input) = bot.read_line("> ").await else {
            break;
        };
        if input.is_empty() {
            continue;
        }

        // Simulated "I Paid" button press
        if input.eq_ignore_ascii_case("paid") {
            match dispatcher.confirm_payment(chat_id).await {
                Ok(reply) => {
                    let _ = bot.edit_message(chat_id, "console_msg", &reply.edit).await;
                    if let Some(followup) = reply.followup {
                        let _ = bot.send_message(chat_id, &followup).await;
                    }
                }
                Err(e) => {
                    let _ = bot.send_message(chat_id, &format!("Error: {}", e)).await;
                }
            }
            continue;
        }

        let parsed = parser.parse(chat_id, input, None).with_platform("console");
        let reply = match &parsed.content {
            Content::Command { name, args } => match name.as_str() {
                "start" => dispatcher.start(),
                "wallet" => match dispatcher.set_wallet(chat_id, args).await {
                    Ok(reply) => reply,
                    Err(e) => Reply::Text(format!("Error: {}", e)),
                },
                "buy" => dispatcher.buy(),
                other => dispatcher.unknown(other),
            },
            _ => {
                if parsed.message_type == MessageType::Text {
                    Reply::Text("Type /start to begin.".to_string())
                } else {
                    continue;
                }
            }
        };

        send_reply(&bot, chat_id, reply).await;
    }
}

fn init_config() {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).expect("default config serializes");
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
}
