//! Output-pattern triggers for watched processes.

use regex::Regex;
use std::sync::Arc;

/// Callback fired with the matching output line.
pub type TriggerAction = Arc<dyn Fn(&str) + Send + Sync>;

/// A pattern scanned against every output line of a watched process.
#[derive(Clone)]
pub struct TriggerRule {
    pattern: Regex,
    only_once: bool,
    spent: bool,
    action: TriggerAction,
}

impl TriggerRule {
    pub fn new<F>(pattern: Regex, action: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            pattern,
            only_once: false,
            spent: false,
            action: Arc::new(action),
        }
    }

    /// Disable the rule after its first match.
    pub fn once(mut self) -> Self {
        self.only_once = true;
        self
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }

    fn try_fire(&mut self, line: &str) -> bool {
        if self.spent || !self.pattern.is_match(line) {
            return false;
        }
        (self.action)(line);
        if self.only_once {
            self.spent = true;
        }
        true
    }
}

impl std::fmt::Debug for TriggerRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerRule")
            .field("pattern", &self.pattern.as_str())
            .field("only_once", &self.only_once)
            .field("spent", &self.spent)
            .finish()
    }
}

/// The rules attached to one watched process.
#[derive(Debug, Clone, Default)]
pub struct TriggerSet {
    rules: Vec<TriggerRule>,
}

impl TriggerSet {
    pub fn new(rules: Vec<TriggerRule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Scan one line, firing every live rule that matches. Returns how many fired.
    pub fn scan(&mut self, line: &str) -> usize {
        self.rules
            .iter_mut()
            .map(|rule| rule.try_fire(line))
            .filter(|fired| *fired)
            .count()
    }

    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }
}
