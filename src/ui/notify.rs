//! Terminal implementations of the list controller's collaborators.

use async_trait::async_trait;
use console::style;
use dialoguer::Confirm;
use tracing::debug;

use super::icons::{CHECK, CROSS};
use crate::list::{ConfirmPrompt, Confirmer, Notifier};

/// Prints notifications: errors to stderr, info to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show_error(&self, message: &str) {
        eprintln!("{}{}", CROSS, style(message).red());
    }

    fn show_info(&self, message: &str) {
        println!("{}{}", CHECK, style(message).green());
    }
}

/// Asks on the terminal. A closed or non-interactive terminal answers `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialoguerConfirmer {
    /// Answer `true` without prompting (`--yes`).
    pub assume_yes: bool,
}

impl DialoguerConfirmer {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

pub fn prompt_text(prompt: &ConfirmPrompt) -> String {
    format!("{}: {} [{}]", prompt.title, prompt.content, prompt.action)
}

#[async_trait]
impl Confirmer for DialoguerConfirmer {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        if self.assume_yes {
            debug!(title = %prompt.title, "Confirmation assumed");
            return true;
        }
        let text = prompt_text(prompt);
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(text)
                .default(false)
                .interact()
                .unwrap_or(false)
        })
        .await;

        match answer {
            Ok(confirmed) => confirmed,
            Err(e) => {
                debug!(error = %e, "Confirmation prompt did not complete");
                false
            }
        }
    }
}
