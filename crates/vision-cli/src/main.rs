//! vision - streaming chat client with image attachments

mod commands;
mod config;
mod printer;
mod ui;

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use vision_ai::HttpBackend;
use vision_chat::ChatController;

/// vision - chat with a vision-capable backend
#[derive(Parser, Debug)]
#[command(name = "vision")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend base URL (default: http://127.0.0.1:8000)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Run in non-interactive mode with a single prompt
    #[arg(short = 'c', long, value_name = "PROMPT")]
    command: Option<String>,

    /// Attach an image to the first message (repeatable)
    #[arg(short, long = "image", value_name = "IMAGE")]
    images: Vec<PathBuf>,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

/// Install the tracing subscriber.
///
/// With no log file, TUI mode logs nowhere so the screen stays intact.
fn init_logging(verbose: bool, log_file: Option<&Path>, use_tui: bool) -> anyhow::Result<()> {
    let default_directive = if verbose { "warn,vision=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None if use_tui => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let use_tui = args.command.is_none() && !args.no_tui && cfg.tui.unwrap_or(true);
    let log_file = args.log_file.clone().or(cfg.log_file.clone());
    init_logging(args.verbose, log_file.as_deref(), use_tui)?;

    let api_url = cfg.api_url(args.api_url.as_deref());
    let backend = HttpBackend::new(&api_url)?;
    tracing::debug!(endpoint = %backend.endpoint(), "Using backend");

    let mut controller = ChatController::new(Arc::new(backend));

    for path in &args.images {
        controller
            .attach_file(path)
            .await
            .with_context(|| format!("Failed to attach {}", path.display()))?;
    }

    if let Some(prompt) = args.command {
        return run_command(&mut controller, &prompt).await;
    }

    if use_tui {
        ui::run_tui(&mut controller, &api_url).await
    } else {
        run_interactive(&mut controller, &api_url).await
    }
}

/// Send one message, printing the reply as it streams
async fn send_and_print(controller: &mut ChatController, text: &str) -> vision_chat::Result<()> {
    let printer = tokio::spawn(printer::print_cycle(controller.subscribe()));
    let result = controller.send(text).await;
    // Rejected input never starts a cycle, so no CycleEnd will arrive
    if matches!(
        result,
        Err(vision_chat::Error::EmptyMessage | vision_chat::Error::Busy)
    ) {
        printer.abort();
    }
    let _ = printer.await;
    result.map(|_| ())
}

async fn run_command(controller: &mut ChatController, prompt: &str) -> anyhow::Result<()> {
    send_and_print(controller, prompt).await?;
    Ok(())
}

async fn run_interactive(controller: &mut ChatController, api_url: &str) -> anyhow::Result<()> {
    use commands::{CommandResult, attachments_message, execute_command};
    use std::io::{self, Write};

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("vision ({})", api_url);
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        let queued = controller.attachments().len();
        if queued > 0 {
            print!("[{} attached] > ", queued);
        } else {
            print!("> ");
        }
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(result) = execute_command(input) {
            match result {
                CommandResult::Attach(path) => match controller.attach_file(&path).await {
                    Ok(name) => println!("Attached {}", name),
                    Err(e) => eprintln!("Error: {}", e),
                },
                CommandResult::ListAttachments => {
                    println!("{}", attachments_message(&controller.attachments().names()));
                }
                CommandResult::Message(msg) => println!("{}", msg),
                CommandResult::Exit => break,
                CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            println!();
            continue;
        }

        println!();
        if let Err(e) = send_and_print(controller, input).await {
            eprintln!("Error: {}", e);
        }
        println!();
    }

    Ok(())
}
