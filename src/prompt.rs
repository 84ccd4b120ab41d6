//! Operator selection prompt

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Asks the operator to pick one candidate owner
#[async_trait]
pub trait SelectionPrompt: Send + Sync {
    /// Present `candidates` in order and return the chosen one
    async fn choose(&self, candidates: &[String]) -> Result<String>;
}

/// Numbered terminal list rendered with `dialoguer`
#[derive(Clone, Debug)]
pub struct TerminalPrompt {
    message: String,
    page_size: usize,
}

impl TerminalPrompt {
    /// Create a prompt with a custom message and page size
    pub fn new(message: impl Into<String>, page_size: usize) -> Self {
        Self {
            message: message.into(),
            page_size,
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new("Choose a folder to download", 10)
    }
}

#[async_trait]
impl SelectionPrompt for TerminalPrompt {
    async fn choose(&self, candidates: &[String]) -> Result<String> {
        if candidates.is_empty() {
            return Err(Error::Prompt("no candidates to choose from".to_string()));
        }

        let items = candidates.to_vec();
        let message = self.message.clone();
        let page_size = self.page_size;

        // dialoguer blocks on terminal input
        let index = tokio::task::spawn_blocking(move || {
            dialoguer::Select::with_theme(&dialoguer::theme::ColorfulTheme::default())
                .with_prompt(message)
                .items(&items)
                .default(0)
                .max_length(page_size)
                .interact()
        })
        .await
        .map_err(|e| Error::Prompt(format!("prompt task failed: {e}")))?
        .map_err(|e| Error::Prompt(e.to_string()))?;

        candidates
            .get(index)
            .cloned()
            .ok_or_else(|| Error::Prompt(format!("selection {index} is out of range")))
    }
}
