//! Full-tree source root resolution.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BuildError, Result};

/// Relative location of the source root inside a wria2 checkout.
pub const SOURCE_ROOT: [&str; 2] = ["wf2", "src"];

/// Finds the `wf2/src` directory a full build runs against.
pub trait SourceLocator: Send + Sync {
    fn locate(&self, dir: &Path) -> Result<PathBuf>;
}

/// Walks up from the starting directory to the nearest checkout containing
/// `wf2/src`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AncestorLocator;

impl SourceLocator for AncestorLocator {
    fn locate(&self, dir: &Path) -> Result<PathBuf> {
        for ancestor in dir.ancestors() {
            let candidate = SOURCE_ROOT.iter().fold(ancestor.to_path_buf(), |p, c| p.join(c));
            if candidate.is_dir() {
                debug!(src = %candidate.display(), "Located wria2 source root");
                return Ok(candidate);
            }
        }
        Err(BuildError::InvalidSourcePath(dir.to_path_buf()))
    }
}

/// Checkout root of a source root (`<root>/wf2/src` -> `<root>`).
pub fn checkout_root(src_root: &Path) -> PathBuf {
    src_root
        .ancestors()
        .nth(SOURCE_ROOT.len())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| src_root.join("..").join(".."))
}
