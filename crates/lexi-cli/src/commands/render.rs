use colored::Colorize;
use lexi_core::query::{NO_CORRECTION_TEXT, WordResult};
use lexi_core::session::{LinkState, Session};
use lexi_core::{LexiError, LinkGuidance};

pub fn session(session: &Session) {
    let state = session.link_state();
    let label = match state {
        LinkState::Unlinked => state.to_string().yellow(),
        LinkState::ResourceSelected => state.to_string().green(),
        _ => state.to_string().cyan(),
    };
    println!("{} {}", "Status:".bold(), label);

    if let Some(profile) = session.account_profile() {
        println!("{} {}", "Account:".bold(), profile.display_name);
    }
    if let Some(resource_id) = session.resource_id() {
        println!("{} {}", "Database:".bold(), resource_id);
    }
    if let Some(identity) = session.local_identity() {
        println!(
            "{} {}",
            "Identity:".bold(),
            identity.fingerprint().bright_black()
        );
    }
}

pub fn word_result(word: &str, result: &WordResult) {
    if result.is_empty() {
        println!("{}", format!("No entry for '{}'", word).bright_black());
        return;
    }

    println!("{}", word.bold().bright_blue());
    for phonetic in &result.phonetics {
        if let Some(text) = &phonetic.text {
            println!("  {}", text.bright_black());
        }
    }
    if !result.definitions.is_empty() {
        println!("{}", "Definitions".underline());
        for (i, definition) in result.definitions.iter().enumerate() {
            println!("  {}. {}", i + 1, definition);
        }
    }
    if !result.synonyms.is_empty() {
        println!("{} {}", "Synonyms:".underline(), result.synonyms.join(", "));
    }
    if !result.examples.is_empty() {
        println!("{}", "Examples".underline());
        for example in &result.examples {
            println!("  - {}", example.italic());
        }
    }
}

pub fn correction(corrected: &str) {
    if corrected.is_empty() || corrected == NO_CORRECTION_TEXT {
        println!("{}", NO_CORRECTION_TEXT.green());
    } else {
        println!("{} {}", "Corrected:".bold(), corrected.bright_blue());
    }
}

pub fn notification(message: &str) {
    eprintln!("{}", message.bright_yellow());
}

/// What the user should run next after `err`, if anything.
///
/// Recoverable errors carry no hint except duplicate callbacks, which settle
/// on their own. The rest send the user back to linking or selection.
pub fn next_step(err: &LexiError) -> Option<&'static str> {
    if err.is_duplicate_code() {
        return Some("wait a moment and run `lexi status`");
    }
    if err.is_recoverable() {
        return None;
    }
    match err {
        LexiError::Unauthenticated {
            guidance: LinkGuidance::SelectResource,
        } => Some("run `lexi select <database-id>` to choose a database"),
        LexiError::Unauthenticated { .. } | LexiError::TerminalLink(_) => {
            Some("run `lexi link` to connect your account")
        }
        _ => None,
    }
}

/// Turns a core error into one that tells the user what to run next.
pub fn with_guidance(err: LexiError) -> anyhow::Error {
    match next_step(&err) {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_step() {
        assert_eq!(
            next_step(&LexiError::unauthenticated(LinkGuidance::SelectResource)),
            Some("run `lexi select <database-id>` to choose a database")
        );
        assert_eq!(
            next_step(&LexiError::terminal_link("denied")),
            Some("run `lexi link` to connect your account")
        );
        assert!(next_step(&LexiError::DuplicateCallback).is_some());
        assert!(next_step(&LexiError::network("offline")).is_none());
    }

    #[test]
    fn test_with_guidance_keeps_cause() {
        let err = with_guidance(LexiError::unauthenticated(LinkGuidance::ConnectAccount));
        let text = format!("{:#}", err);
        assert!(text.starts_with("run `lexi link`"));
        assert!(text.contains("connect your workspace account first"));
    }
}
