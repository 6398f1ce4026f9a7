use super::{App, render};
use anyhow::Result;
use colored::Colorize;
use lexi_core::query::{CorrectionService, LookupService};

pub async fn lookup(app: &App, word: &str) -> Result<()> {
    let word = word.trim();
    if word.is_empty() {
        return Ok(());
    }
    let result = app.api.lookup(word).await?;
    render::word_result(word, &result);
    Ok(())
}

pub async fn correct(app: &App, sentence: &str) -> Result<()> {
    let sentence = sentence.trim();
    if sentence.is_empty() {
        return Ok(());
    }
    let corrected = app.api.correct(sentence).await?;
    render::correction(&corrected);
    Ok(())
}

pub async fn save(app: &App, word: &str) -> Result<()> {
    app.session.initialize().await;
    let word = word.trim();
    if word.is_empty() {
        anyhow::bail!("Nothing to save: the word is empty");
    }
    let result = app.api.lookup(word).await?;
    render::word_result(word, &result);

    app.saver()
        .save_word(word, &result)
        .await
        .map_err(render::with_guidance)?;
    println!("{}", format!("Saved '{}'.", word).green());
    Ok(())
}
