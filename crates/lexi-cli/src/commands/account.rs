use super::{App, render};
use anyhow::Result;
use colored::Colorize;
use lexi_core::oauth::CallbackOutcome;
use lexi_core::session::LinkState;

pub async fn status(app: &App) -> Result<()> {
    app.session.initialize().await;
    render::session(&app.session.snapshot().await);
    Ok(())
}

pub async fn link(app: &App) -> Result<()> {
    app.session.initialize().await;
    let redirect = app.linker().begin_link().await;

    println!("{}", "Open this URL to connect your workspace:".bold());
    println!("  {}", redirect.url.bright_blue().underline());
    if redirect.reuses_identity {
        println!(
            "{}",
            "The new connection will attach to your existing identity.".bright_black()
        );
    }
    println!(
        "Then run {} with the URL you were redirected to.",
        "lexi callback <url>".cyan()
    );
    Ok(())
}

pub async fn callback(app: &App, code_or_url: &str) -> Result<()> {
    app.session.initialize().await;
    let linker = app.linker();
    let outcome = linker
        .handle_callback_url(code_or_url)
        .await
        .map_err(render::with_guidance)?;

    match outcome {
        CallbackOutcome::ProceedToMain => {
            println!("{}", "Linked. You can start saving words.".green());
        }
        CallbackOutcome::SelectResource { choices } => {
            println!("{}", "Linked. Choose a database for your words:".green());
            match choices {
                Some(choices) if choices.is_empty() => println!(
                    "{}",
                    "No databases are shared with this integration yet.".yellow()
                ),
                Some(choices) => {
                    for choice in &choices {
                        println!("  {}  {}", choice.id.cyan(), choice.title);
                    }
                }
                None => println!(
                    "{}",
                    "The database list is not available; use an id from your workspace."
                        .bright_black()
                ),
            }
            println!("Run {} to pick one.", "lexi select <database-id>".cyan());
        }
    }
    Ok(())
}

pub async fn select(app: &App, database_id: Option<String>) -> Result<()> {
    app.session.initialize().await;
    let state = app
        .session
        .select_resource(database_id)
        .await
        .map_err(render::with_guidance)?;

    match state {
        LinkState::ResourceSelected => println!("{}", "Database selected.".green()),
        _ => println!("{}", "Database selection cleared.".yellow()),
    }
    Ok(())
}

pub async fn unlink(app: &App) -> Result<()> {
    app.session.initialize().await;
    app.session.unlink().await;
    println!("{}", "Local identity removed.".yellow());
    Ok(())
}
