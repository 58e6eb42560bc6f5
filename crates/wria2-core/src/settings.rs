//! Tool names and locations used by a run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wria2_exec::ExecContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub shifter: String,
    pub compass: String,
    pub node: String,
    pub npm: String,

    /// Directory searched before the inherited `PATH` (e.g. a bundled
    /// `node_modules/.bin`).
    pub tool_bin: Option<PathBuf>,

    /// External packaging command for War requests.
    pub packager: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shifter: "shifter".to_string(),
            compass: "compass".to_string(),
            node: "node".to_string(),
            npm: "npm".to_string(),
            tool_bin: None,
            packager: None,
        }
    }
}

impl Settings {
    /// The execution context every subprocess of the run receives.
    pub fn exec_context(&self) -> ExecContext {
        ExecContext::new(self.tool_bin.as_deref())
    }
}
