//! User interaction capability: confirmations and text input.
//!
//! Destructive operations (reload from scope files, overwriting a scope file on
//! export) suspend on a [`Prompter`] before doing anything.

use async_trait::async_trait;
use std::io::{self, BufRead, Write};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question; `false` means declined
    async fn confirm(&self, message: &str) -> bool;

    /// Ask for a line of text; `None` means dismissed
    async fn input(&self, prompt: &str, default: &str) -> Option<String>;
}

/// Interactive prompter on stdin/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line(question: String) -> Option<String> {
        let mut stderr = io::stderr();
        // A closed terminal reads as a dismissal
        write!(stderr, "{question}").ok()?;
        stderr.flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn confirm(&self, message: &str) -> bool {
        let question = format!("{message} [y/N] ");
        let answer = tokio::task::spawn_blocking(move || Self::read_line(question))
            .await
            .ok()
            .flatten();

        matches!(
            answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        )
    }

    async fn input(&self, prompt: &str, default: &str) -> Option<String> {
        let question = format!("{prompt} [{default}]: ");
        let answer = tokio::task::spawn_blocking(move || Self::read_line(question))
            .await
            .ok()
            .flatten()?;

        if answer.is_empty() {
            Some(default.to_string())
        } else {
            Some(answer)
        }
    }
}

/// Non-interactive prompter: confirms everything and answers input with a
/// preset value (or the offered default).
#[derive(Debug, Default, Clone)]
pub struct AssumeYes {
    answer: Option<String>,
}

impl AssumeYes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
        }
    }
}

#[async_trait]
impl Prompter for AssumeYes {
    async fn confirm(&self, message: &str) -> bool {
        tracing::debug!("Assuming yes: {}", message);
        true
    }

    async fn input(&self, _prompt: &str, default: &str) -> Option<String> {
        Some(self.answer.clone().unwrap_or_else(|| default.to_string()))
    }
}
