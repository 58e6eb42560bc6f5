//! Interactive prompts.
//!
//! Every prompt blocks the run until a line of input arrives. There is no
//! timeout.

use dialoguer::{Confirm, Input};

use crate::error::{BuildError, Result};

/// Source of human answers.
pub trait Prompter: Send + Sync {
    /// Ask for a free-form answer; an empty answer yields `default`.
    fn input(&self, message: &str, default: &str) -> Result<String>;

    /// Ask a yes/no question.
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

/// [`Prompter`] reading from the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&self, message: &str, default: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(message)
            .default(default.to_string())
            .interact_text()
            .map_err(|e| BuildError::Prompt(e.to_string()))
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|e| BuildError::Prompt(e.to_string()))
    }
}
