//! Line-based interactive mode.
//!
//! Every line is treated as the new content of the active input, so results
//! follow the debounce just like keystrokes would. Lines starting with `:`
//! are commands.

use super::{App, render};
use anyhow::Result;
use colored::Colorize;
use lexi_core::query::{DisplayState, QueryCoordinator, QueryMode};
use lexi_core::save::EntrySaver;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

enum Command {
    Switch(QueryMode),
    Save,
    Status,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let command = line.strip_prefix(':')?.trim();
    Some(match command {
        "word" | "w" => Command::Switch(QueryMode::Word),
        "sentence" | "s" => Command::Switch(QueryMode::Sentence),
        "save" => Command::Save,
        "status" => Command::Status,
        "help" | "h" => Command::Help,
        "quit" | "q" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    })
}

/// What `:save` reports back.
#[derive(Debug, PartialEq, Eq)]
enum SaveFeedback {
    Saved(String),
    /// Transient; shown as a notification.
    Notice(String),
    /// The user has to link or select a database first.
    Redirect(String),
}

/// Saves the word result currently on display.
async fn save_displayed(saver: &EntrySaver, display: &DisplayState) -> SaveFeedback {
    let word = display.word_query.trim();
    if word.is_empty() {
        return SaveFeedback::Notice("Look up a word first.".to_string());
    }
    match saver.save_word(word, &display.word).await {
        Ok(()) => SaveFeedback::Saved(word.to_string()),
        Err(e) if e.is_recoverable() => SaveFeedback::Notice(e.to_string()),
        Err(e) => SaveFeedback::Redirect(format!("{:#}", render::with_guidance(e))),
    }
}

fn print_help() {
    println!("{}", "Type a word or a sentence. Commands:".bold());
    println!("  {}      switch to word lookup", ":word".cyan());
    println!("  {}  switch to sentence correction", ":sentence".cyan());
    println!("  {}      save the shown word to your database", ":save".cyan());
    println!("  {}    show link status", ":status".cyan());
    println!("  {}      exit", ":quit".cyan());
}

fn render_display(state: &DisplayState) {
    match state.active {
        QueryMode::Word if !state.word.is_empty() => {
            render::word_result(&state.word_query, &state.word)
        }
        QueryMode::Sentence if !state.correction.is_empty() => {
            render::correction(&state.correction)
        }
        _ => {}
    }
}

fn prompt(mode: QueryMode) {
    println!("{}", format!("[{}]", mode).bright_magenta());
}

pub async fn run(app: &App) -> Result<()> {
    app.session.initialize().await;
    render::session(&app.session.snapshot().await);

    let notifier = app.notifier();
    let coordinator = app.coordinator(notifier.clone());
    let saver = app.saver();

    let display_printer = spawn_display_printer(&coordinator);
    let notification_printer = {
        let mut notifications = notifier.subscribe();
        tokio::spawn(async move {
            while notifications.changed().await.is_ok() {
                let current = notifications.borrow_and_update().clone();
                if let Some(notification) = current {
                    render::notification(&notification.message);
                }
            }
        })
    };

    print_help();
    prompt(coordinator.active_mode().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Some(Command::Switch(mode)) => {
                coordinator.set_active_mode(mode).await;
                prompt(mode);
            }
            Some(Command::Save) => match save_displayed(&saver, &coordinator.display()).await {
                SaveFeedback::Saved(word) => {
                    println!("{}", format!("Saved '{}'.", word).green());
                }
                SaveFeedback::Notice(message) => {
                    notifier.notify(message);
                }
                SaveFeedback::Redirect(message) => eprintln!("{}", message.red()),
            },
            Some(Command::Status) => render::session(&app.session.snapshot().await),
            Some(Command::Help) => print_help(),
            Some(Command::Quit) => break,
            Some(Command::Unknown(other)) => {
                println!("{}", format!("Unknown command ':{}'", other).bright_black());
            }
            None => {
                let mode = coordinator.active_mode().await;
                coordinator.on_input(mode, &line).await;
            }
        }
    }

    display_printer.abort();
    notification_printer.abort();
    Ok(())
}

fn spawn_display_printer(coordinator: &QueryCoordinator) -> JoinHandle<()> {
    let mut display = coordinator.subscribe();
    tokio::spawn(async move {
        while display.changed().await.is_ok() {
            let state = display.borrow_and_update().clone();
            render_display(&state);
        }
    })
}
