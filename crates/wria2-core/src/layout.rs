//! Paths a run works with, resolved once when the plan is chosen.

use std::path::{Path, PathBuf};

use crate::locate::checkout_root;
use crate::shifter::SHIFTER_JSON;

/// Name of the seed component every component sits next to.
pub const SEED_DIR: &str = "wf2";

/// Layout around a single component directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoloPaths {
    /// The component being built.
    pub component: PathBuf,
    /// The sibling seed component (`<component>/../wf2`).
    pub seed: PathBuf,
    /// Full-build checksum file bypassed for component builds.
    pub md5sum: PathBuf,
}

impl SoloPaths {
    pub fn new(component: &Path) -> Self {
        Self {
            component: component.to_path_buf(),
            seed: component.join("..").join(SEED_DIR),
            md5sum: component.join("..").join("..").join("build").join("md5sum"),
        }
    }

    /// Directory name of the component, for messages.
    pub fn component_name(&self) -> String {
        self.component
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.component.display().to_string())
    }
}

/// Layout of a whole checkout, anchored at its `wf2/src` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullPaths {
    /// `<root>/wf2/src`.
    pub src_root: PathBuf,
    /// `<root>/build`, home of the build scripts and their npm packages.
    pub build_root: PathBuf,
    /// `<root>/build/lib`.
    pub build_lib: PathBuf,
    /// `<root>/wf2/build`, the generated output.
    pub output: PathBuf,
    /// `<root>/wf2/src/.shifter.json`.
    pub shifter_json: PathBuf,
    /// `<root>/wf2/src/yui/js/yui.js`.
    pub yui_js: PathBuf,
    /// `<root>/wf2/src/wt2-base-css/templates`.
    pub base_css_templates: PathBuf,
    /// `<root>/wf2/src/wf2`.
    pub seed: PathBuf,
}

impl FullPaths {
    pub fn new(src_root: &Path) -> Self {
        let root = checkout_root(src_root);
        let build_root = root.join("build");
        Self {
            src_root: src_root.to_path_buf(),
            build_lib: build_root.join("lib"),
            build_root,
            output: src_root.join("..").join("build"),
            shifter_json: src_root.join(SHIFTER_JSON),
            yui_js: src_root.join("yui").join("js").join("yui.js"),
            base_css_templates: src_root.join("wt2-base-css").join("templates"),
            seed: src_root.join(SEED_DIR),
        }
    }
}

/// `<root>/build/lib` for a checkout root, where the Soy compiler lives.
pub fn soy_build_dir(checkout_root: &Path) -> PathBuf {
    checkout_root.join("build").join("lib")
}
