//! Interactive chat client built on the chatlink communication core.
//!
//! Connects, logs in, prints incoming chat and reads commands from a prompt:
//! `@<userid> <text>` sends a direct message, `#<groupid> <text>` posts to a
//! group and `/quit` logs out.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chatlink-client -- --user-id 42 --password secret
//! ```

use std::sync::Arc;
use std::time::Duration;

use chatlink_client::client::config::DEFAULT_URL;
use chatlink_client::infrastructure::dto::{GroupChat, OneToOneChat};
use chatlink_client::usecase::{LoginUseCase, LogoutUseCase, SendChatUseCase};
use chatlink_client::{
    ClientConfig, Connection, ConnectionEvent, Envelope, GroupId, MsgIdGenerator, MsgType, UserId,
};
use chatlink_shared::logger::setup_logger;
use chatlink_shared::time::{current_unix_millis, timestamp_to_local_rfc3339};
use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::{broadcast, mpsc};

#[derive(Debug, Parser)]
#[command(name = "chatlink-client", about = "Chat from the terminal")]
struct Args {
    /// WebSocket endpoint of the chat server
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Your user id
    #[arg(long)]
    user_id: i64,

    /// Your password
    #[arg(long)]
    password: String,

    #[arg(long, default_value_t = 3000)]
    reconnect_interval_ms: u64,

    #[arg(long, default_value_t = 5)]
    max_reconnect_attempts: u32,

    #[arg(long, default_value_t = 30000)]
    heartbeat_interval_ms: u64,

    /// Answer requests locally when the server is unreachable
    #[arg(long)]
    offline: bool,
}

impl Args {
    fn config(&self) -> ClientConfig {
        ClientConfig::new(self.url.clone())
            .with_reconnect_interval(Duration::from_millis(self.reconnect_interval_ms))
            .with_max_reconnect_attempts(self.max_reconnect_attempts)
            .with_heartbeat_interval(Duration::from_millis(self.heartbeat_interval_ms))
            .with_offline_fallback(self.offline)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Direct(UserId, String),
    Group(GroupId, String),
    Quit,
    Empty,
    Invalid(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if line == "/quit" {
        return Command::Quit;
    }

    let (target, text) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let text = text.trim();
    let parsed = if let Some(id) = target.strip_prefix('@') {
        id.parse().ok().map(|id| Command::Direct(UserId::new(id), text.to_string()))
    } else if let Some(id) = target.strip_prefix('#') {
        id.parse().ok().map(|id| Command::Group(GroupId::new(id), text.to_string()))
    } else {
        None
    };

    match parsed {
        Some(Command::Direct(_, ref text) | Command::Group(_, ref text)) if text.is_empty() => {
            Command::Invalid("message text is empty".to_string())
        }
        Some(command) => command,
        None => Command::Invalid(format!("unknown command: {line}")),
    }
}

fn print_chat(envelope: &Envelope) -> chatlink_client::client::HandlerResult {
    let at = timestamp_to_local_rfc3339(current_unix_millis());
    match envelope.msg_type {
        MsgType::OneToOneChat => {
            let chat = envelope.decode::<OneToOneChat>()?;
            println!("[{at}] @{}: {}", chat.fromid, chat.content);
        }
        MsgType::GroupChat => {
            let chat = envelope.decode::<GroupChat>()?;
            println!("[{at}] #{} @{}: {}", chat.groupid, chat.fromid, chat.content);
        }
        _ => {}
    }
    Ok(())
}

fn spawn_event_logger(mut events: broadcast::Receiver<ConnectionEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ConnectionEvent::ReconnectExhausted { attempts }) => {
                    println!("connection lost for good after {attempts} attempts; type /quit");
                }
                Ok(ConnectionEvent::OfflineMode) => {
                    println!("server unreachable, running against the offline responder");
                }
                Ok(event) => tracing::debug!(?event, "connection event"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "connection events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Read prompt lines on a plain thread; rustyline blocks.
fn spawn_prompt() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                tracing::error!("Failed to start prompt: {}", e);
                return;
            }
        };
        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    let _ = tx.send("/quit".to_string());
                    break;
                }
                Err(e) => {
                    tracing::error!("Prompt error: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let connection = Connection::new(args.config());
    let ids = Arc::new(MsgIdGenerator::new());
    let user = UserId::new(args.user_id);

    spawn_event_logger(connection.subscribe());
    connection.connect().await?;
    connection.register_global_handler(print_chat);

    let login = LoginUseCase::new(connection.clone(), ids.clone())
        .execute(user, args.password.as_str())
        .await?;
    if !login.success {
        connection.disconnect();
        return Err(format!("login rejected (error {})", login.response.error).into());
    }
    let name = login.response.name.as_deref().unwrap_or("?");
    println!("logged in as {name} (@{user})");
    for friend in &login.response.friends {
        let status = if friend.online_status { "online" } else { "offline" };
        println!("  friend @{} {} [{status}]", friend.userid, friend.name);
    }
    for group in &login.response.groups {
        println!("  group #{} {}", group.groupid, group.name);
    }

    let chat = SendChatUseCase::new(connection.clone(), ids.clone());
    let mut lines = spawn_prompt();
    while let Some(line) = lines.recv().await {
        let sent = match parse_command(&line) {
            Command::Direct(to, text) => chat.one_to_one(user, to, text),
            Command::Group(group, text) => chat.group(user, group, text),
            Command::Quit => break,
            Command::Empty => continue,
            Command::Invalid(reason) => {
                println!("{reason} (use @<userid> <text>, #<groupid> <text> or /quit)");
                continue;
            }
        };
        if let Err(e) = sent {
            println!("not sent: {e}");
        }
    }

    LogoutUseCase::new(connection, ids).execute(user);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
