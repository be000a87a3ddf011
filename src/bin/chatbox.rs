//! Interactive terminal front end for a chat backend.
//!
//! Every line typed at the prompt is submitted as one exchange with the
//! backend's `/api/chat` endpoint.  Answers arrive asynchronously and are
//! printed above the prompt, so the next question can be typed while the
//! previous one is still `Thinking...`.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on the default address
//! chatbox
//!
//! # Talk to a backend elsewhere, giving up on requests after 30 seconds
//! chatbox --url http://chat.internal:8080 --timeout-secs 30
//!
//! # Show backend answers verbatim instead of interpreting markup
//! chatbox --escape-markup --no-color
//! ```
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/stats` - Show session statistics
//! - `/config` - Show current configuration
//! - `/quit` - Exit the application

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use chatbox::chat::{
    ChatArgs, ChatCommand, ChatConfig, DEFAULT_LOG_FILTER, help_text, parse_command,
};
use chatbox::render::TerminalSink;
use chatbox::surface::{ChannelForm, MemoryInput, MemoryPage};
use chatbox::transform::MarkupPolicy;
use chatbox::{ChatController, ChatTransport};

/// Main entry point for the chatbox application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("chatbox [OPTIONS]");
    let config = ChatConfig::from(args);
    init_tracing(&config);

    let client = config.client()?;
    let endpoint = client.endpoint().to_string();
    let transport: Arc<dyn ChatTransport> = Arc::new(client);

    let mut rl = DefaultEditor::new()?;
    let printer = rl.create_external_printer()?;
    let sink = Arc::new(TerminalSink::with_printer(config.use_color, printer));
    let input = Arc::new(MemoryInput::new());
    let (form_handle, form) = ChannelForm::new(input.clone());

    let ids = &config.element_ids;
    let mut page = MemoryPage::new()
        .with_message_list(&ids.container, sink.clone())
        .with_input_field(&ids.input, input.clone())
        .with_form(&ids.form, Box::new(form));
    let (controller, form) = match ChatController::initialize(&mut page, ids, transport) {
        Ok(wired) => wired,
        Err(err) => {
            tracing::error!(error = %err, "could not start chat");
            return Err(err.into());
        }
    };
    let controller = controller.with_markup_policy(config.markup);

    let runner = controller.clone();
    let run = tokio::spawn(async move { runner.run(form).await });

    println!("Chatbox ({endpoint})");
    println!("Type /help for commands, /quit to exit\n");

    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&controller, &sink);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&config, &endpoint);
                        }
                        ChatCommand::Invalid(message) => {
                            eprintln!("Error: {message}");
                        }
                    }
                    continue;
                }

                input.set_value(line);
                if !form_handle.submit() {
                    tracing::error!("form closed; submissions are no longer handled");
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Input error: {}", err);
                break;
            }
        }
    }

    drop(form_handle);
    let in_flight = run.await?;
    let pending = in_flight.pending();
    if pending > 0 {
        tracing::info!(pending, "abandoning unanswered submissions");
        in_flight.abort();
    } else {
        in_flight.settle().await;
    }

    Ok(())
}

fn init_tracing(config: &ChatConfig) {
    let directive = config.effective_log_filter();
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("Ignoring log filter {directive:?}: {err}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_stats(controller: &ChatController, sink: &TerminalSink) {
    let stats = controller.stats();
    println!("    Session Statistics:");
    println!("      Submissions: {}", stats.submissions);
    println!("      Blank inputs ignored: {}", stats.empty_inputs);
    println!("      Answered: {}", stats.answered);
    println!("      Without result: {}", stats.no_result);
    println!("      Server errors: {}", stats.http_failures);
    println!("      Transport errors: {}", stats.transport_failures);
    println!("      In flight: {}", stats.in_flight);
    println!("      Pending placeholders: {}", sink.pending_count());
}

fn print_config(config: &ChatConfig, endpoint: &str) {
    println!("    Current Configuration:");
    println!("      Endpoint: {endpoint}");
    match config.timeout {
        Some(timeout) => println!("      Timeout: {}s", timeout.as_secs()),
        None => println!("      Timeout: (none)"),
    }
    let markup = match config.markup {
        MarkupPolicy::Trusted => "trusted",
        MarkupPolicy::Escaped => "escaped",
    };
    println!("      Markup: {markup}");
    println!(
        "      Color: {}",
        if config.use_color {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!("      Log filter: {}", config.effective_log_filter());
}
