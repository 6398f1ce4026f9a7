use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "lexi")]
#[command(about = "Lexi - word lookup, grammar correction and workspace sync", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, global = true)]
    api_base_url: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = logging::DEFAULT_LOG_LEVEL)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current link state
    Status,
    /// Print the URL that starts account linking
    Link,
    /// Finish linking with the code (or full callback URL) from the redirect
    Callback {
        /// Authorization code or callback URL
        code_or_url: String,
    },
    /// Choose the destination database
    Select {
        /// Database id
        #[arg(required_unless_present = "none", conflicts_with = "none")]
        database_id: Option<String>,
        /// Clear the selection instead
        #[arg(long)]
        none: bool,
    },
    /// Forget the local identity
    Unlink,
    /// Look up a word
    Lookup { word: String },
    /// Correct a sentence
    Correct {
        #[arg(required = true, num_args = 1..)]
        sentence: Vec<String>,
    },
    /// Look up a word and save it to the selected database
    Save { word: String },
    /// Type words or sentences and see results as you go
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level)?;

    let app = commands::App::load(cli.config.as_deref(), cli.api_base_url.as_deref()).await?;

    match cli.command {
        Commands::Status => commands::account::status(&app).await?,
        Commands::Link => commands::account::link(&app).await?,
        Commands::Callback { code_or_url } => commands::account::callback(&app, &code_or_url).await?,
        Commands::Select { database_id, none } => {
            let selection = if none { None } else { database_id };
            commands::account::select(&app, selection).await?
        }
        Commands::Unlink => commands::account::unlink(&app).await?,
        Commands::Lookup { word } => commands::query::lookup(&app, &word).await?,
        Commands::Correct { sentence } => commands::query::correct(&app, &sentence.join(" ")).await?,
        Commands::Save { word } => commands::query::save(&app, &word).await?,
        Commands::Interactive => commands::interactive::run(&app).await?,
    }

    Ok(())
}
