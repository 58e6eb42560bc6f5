//! The `.shifter.json` sidecar and the combo-loader confirmation.
//!
//! The sidecar is only rewritten right after the developer confirmed a
//! toggle, or when the request carries an explicit combo value and prompting
//! is off.

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, warn};
use wria2_exec::Flow;

use crate::error::{BuildError, Result};
use crate::prompt::Prompter;

/// Key holding the combo-loader flag.
pub const COMBO_KEY: &str = "replace-wf2_combine";

/// File name of the sidecar inside the source root.
pub const SHIFTER_JSON: &str = ".shifter.json";

/// Flat, ordered key/value configuration read by shifter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShifterConfig {
    entries: Map<String, Value>,
}

impl ShifterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| BuildError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&raw).map_err(|reason| BuildError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn parse(raw: &str) -> std::result::Result<Self, String> {
        match serde_json::from_str::<Value>(raw).map_err(|e| e.to_string())? {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(format!("expected a JSON object, found {other}")),
        }
    }

    /// Write the configuration back, pretty printed with two-space indent.
    pub fn save(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, body).map_err(|e| BuildError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// `"true"` and `true` both mean enabled.
    pub fn combo_enabled(&self) -> bool {
        match self.entries.get(COMBO_KEY) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }

    /// Store the flag as a string, the way shifter reads it.
    pub fn set_combo(&mut self, enabled: bool) {
        self.entries
            .insert(COMBO_KEY.to_string(), Value::String(enabled.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
}

/// Answer to the combo prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboChoice {
    Continue,
    Abort,
    Toggle,
}

impl ComboChoice {
    const CONTINUE: &'static str = "c";
    const ABORT: &'static str = "a";
    const DISABLE: &'static str = "d";
    const ENABLE: &'static str = "e";

    /// Parse an answer given the current flag. Only the toggle letter that
    /// flips the current state is accepted.
    pub fn parse(answer: &str, enabled: bool) -> Option<Self> {
        let answer = answer.trim().to_lowercase();
        match answer.as_str() {
            Self::CONTINUE => Some(ComboChoice::Continue),
            Self::ABORT => Some(ComboChoice::Abort),
            Self::DISABLE if enabled => Some(ComboChoice::Toggle),
            Self::ENABLE if !enabled => Some(ComboChoice::Toggle),
            _ => None,
        }
    }

    fn question(enabled: bool) -> (&'static str, &'static str) {
        if enabled {
            (
                "Do you want to continue [c], abort [a] or disable it [D]?",
                Self::DISABLE,
            )
        } else {
            (
                "Do you want to continue [C], abort [a] or enable it [e]?",
                Self::CONTINUE,
            )
        }
    }
}

/// What happened to the combo flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboDecision {
    /// Left as it was.
    Unchanged { enabled: bool },
    /// Rewritten to the new value.
    Set { enabled: bool },
}

impl ComboDecision {
    pub fn enabled(self) -> bool {
        match self {
            ComboDecision::Unchanged { enabled } | ComboDecision::Set { enabled } => enabled,
        }
    }
}

/// Mediates changes to the combo flag in a `.shifter.json` file.
pub struct ConfigMutator<'a> {
    prompter: &'a dyn Prompter,
}

impl<'a> ConfigMutator<'a> {
    pub fn new(prompter: &'a dyn Prompter) -> Self {
        Self { prompter }
    }

    /// Show the current flag and ask whether to continue, abort or toggle.
    ///
    /// Invalid answers repeat the question. Aborting yields
    /// [`Flow::Cancelled`] and leaves the file untouched.
    pub fn confirm(&self, path: &Path) -> Result<Flow<ComboDecision>> {
        let mut config = ShifterConfig::load(path)?;
        let enabled = config.combo_enabled();

        if enabled {
            warn!("With the current configuration, the build WILL use the Combo Loader");
        } else {
            warn!("With the current configuration, the build will NOT use the Combo Loader");
        }

        let (question, default) = ComboChoice::question(enabled);
        let choice = loop {
            let answer = self.prompter.input(question, default)?;
            match ComboChoice::parse(&answer, enabled) {
                Some(choice) => break choice,
                None => warn!(answer = %answer, "Invalid answer"),
            }
        };

        match choice {
            ComboChoice::Continue => Ok(Flow::Continue(ComboDecision::Unchanged { enabled })),
            ComboChoice::Abort => {
                info!("Bye then...");
                Ok(Flow::Cancelled)
            }
            ComboChoice::Toggle => {
                config.set_combo(!enabled);
                config.save(path)?;
                info!(combo = !enabled, "Updated {}", path.display());
                Ok(Flow::Continue(ComboDecision::Set { enabled: !enabled }))
            }
        }
    }

    /// Apply an explicit flag without asking. `None` leaves the file alone.
    pub fn apply_override(path: &Path, combo: Option<bool>) -> Result<ComboDecision> {
        let mut config = ShifterConfig::load(path)?;
        match combo {
            Some(enabled) => {
                config.set_combo(enabled);
                config.save(path)?;
                info!(combo = enabled, "Updated {}", path.display());
                Ok(ComboDecision::Set { enabled })
            }
            None => Ok(ComboDecision::Unchanged {
                enabled: config.combo_enabled(),
            }),
        }
    }
}
