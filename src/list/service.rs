//! Collaborator contracts consumed by the list controller.

use std::str::FromStr;

use async_trait::async_trait;

use super::labels::ConfirmPrompt;
use crate::errors::ApiError;
use crate::models::{Entity, PagesInfo};

/// Opaque navigation token for page-by-key fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKey {
    First,
    Prev,
    Next,
    Last,
}

impl PageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Prev => "prev",
            Self::Next => "next",
            Self::Last => "last",
        }
    }
}

impl std::fmt::Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "prev" | "previous" => Ok(Self::Prev),
            "next" => Ok(Self::Next),
            "last" => Ok(Self::Last),
            _ => Err(format!(
                "Invalid page key '{}'. Valid values: first, prev, next, last",
                s
            )),
        }
    }
}

/// Remote paginated collection of one entity kind.
///
/// The service owns the current page; fetches replace it and the controller
/// reads it back through [`PageService::page_items`].
#[async_trait]
pub trait PageService: Send + Sync {
    type Item: Entity;

    async fn fetch_page(&self, max_items: u32, skip_count: u32) -> Result<(), ApiError>;

    async fn fetch_page_by_key(&self, key: PageKey) -> Result<(), ApiError>;

    async fn delete_by_id(&self, id: &str) -> Result<(), ApiError>;

    fn page_items(&self) -> Vec<Self::Item>;

    fn pages_info(&self) -> PagesInfo;
}

/// User-visible notifications.
pub trait Notifier: Send + Sync {
    fn show_error(&self, message: &str);

    fn show_info(&self, message: &str);
}

/// Confirmation dialog.
///
/// Declined, dismissed and failed prompts all answer `false`.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Answers every prompt the same way. Backs `--yes` and tests.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_key_parses_known_tokens() {
        assert_eq!("next".parse::<PageKey>().unwrap(), PageKey::Next);
        assert_eq!("Previous".parse::<PageKey>().unwrap(), PageKey::Prev);
        assert_eq!(PageKey::Last.to_string(), "last");
        assert!("middle".parse::<PageKey>().is_err());
    }

    #[tokio::test]
    async fn auto_confirm_answers_fixed_value() {
        let prompt = ConfirmPrompt {
            title: "t".into(),
            content: "c".into(),
            action: "a".into(),
        };
        assert!(AutoConfirm(true).confirm(&prompt).await);
        assert!(!AutoConfirm(false).confirm(&prompt).await);
    }
}
