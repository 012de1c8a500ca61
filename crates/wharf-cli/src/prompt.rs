//! Terminal confirmation prompts.
//!
//! Uses dialoguer for the two pipeline confirmation points. Both prompts
//! default to "no": plain Enter declines, and so does a non-interactive
//! stdin, so unattended runs never auto-confirm.

use dialoguer::{Confirm, theme::ColorfulTheme};

use wharf_core::pipeline::DecisionSource;

pub struct TerminalDecisions {
    theme: ColorfulTheme,
}

impl TerminalDecisions {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalDecisions {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionSource for TerminalDecisions {
    fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool> {
        // A failed prompt (no TTY) counts as an unanswered one: decline.
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false))
    }
}
