//! Component-path classification.
//!
//! A component directory carries a `build.json` descriptor, a `meta`
//! directory and has the `wf2` seed component as a sibling. Anything else is
//! handed to the full-tree resolution.

use std::path::Path;

/// Marker artifacts, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingArtifact {
    BuildDescriptor = 1,
    MetaDir = 2,
    AggregateDir = 3,
}

impl MissingArtifact {
    /// Ordinal of the artifact (1, 2 or 3).
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn describe(self) -> &'static str {
        match self {
            MissingArtifact::BuildDescriptor => "build.json",
            MissingArtifact::MetaDir => "meta directory",
            MissingArtifact::AggregateDir => "../wf2 directory",
        }
    }
}

/// Verdict for a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Component,
    /// Not a component; carries the first missing artifact.
    Missing(MissingArtifact),
}

impl Classification {
    pub fn is_component(self) -> bool {
        matches!(self, Classification::Component)
    }

    /// `None` for a component, the missing artifact's ordinal otherwise.
    pub fn code(self) -> Option<u8> {
        match self {
            Classification::Component => None,
            Classification::Missing(artifact) => Some(artifact.code()),
        }
    }
}

/// Classify `dir`. Checks stop at the first missing artifact.
pub fn classify(dir: &Path) -> Classification {
    let checks = [
        (dir.join("build.json"), MissingArtifact::BuildDescriptor),
        (dir.join("meta"), MissingArtifact::MetaDir),
        (dir.join("..").join("wf2"), MissingArtifact::AggregateDir),
    ];

    checks
        .into_iter()
        .find(|(path, _)| !path.exists())
        .map_or(Classification::Component, |(_, artifact)| {
            Classification::Missing(artifact)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Lay out `<tmp>/src/comp` with the chosen artifacts present.
    fn layout(descriptor: bool, meta: bool, aggregate: bool) -> (tempfile::TempDir, std::path::PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let comp = tmp.path().join("src").join("comp");
        fs::create_dir_all(&comp).unwrap();
        if descriptor {
            fs::write(comp.join("build.json"), "{}").unwrap();
        }
        if meta {
            fs::create_dir(comp.join("meta")).unwrap();
        }
        if aggregate {
            fs::create_dir(tmp.path().join("src").join("wf2")).unwrap();
        }
        (tmp, comp)
    }

    #[test]
    fn test_complete_component() {
        let (_tmp, comp) = layout(true, true, true);
        let verdict = classify(&comp);
        assert!(verdict.is_component());
        assert_eq!(verdict.code(), None);
    }

    #[test]
    fn test_every_incomplete_combination_reports_first_missing() {
        for mask in 0u8..7 {
            let descriptor = mask & 0b001 != 0;
            let meta = mask & 0b010 != 0;
            let aggregate = mask & 0b100 != 0;
            let (_tmp, comp) = layout(descriptor, meta, aggregate);

            let expected = if !descriptor {
                1
            } else if !meta {
                2
            } else {
                3
            };
            assert_eq!(
                classify(&comp).code(),
                Some(expected),
                "descriptor={descriptor} meta={meta} aggregate={aggregate}"
            );
        }
    }

    #[test]
    fn test_classification_is_deterministic() {
        let (_tmp, comp) = layout(true, false, true);
        assert_eq!(classify(&comp), classify(&comp));
        assert_eq!(
            classify(&comp),
            Classification::Missing(MissingArtifact::MetaDir)
        );
    }

    #[test]
    fn test_missing_directory_reports_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(
            classify(&tmp.path().join("does-not-exist")),
            Classification::Missing(MissingArtifact::BuildDescriptor)
        );
    }

    #[test]
    fn test_artifact_descriptions() {
        assert_eq!(MissingArtifact::BuildDescriptor.describe(), "build.json");
        assert_eq!(MissingArtifact::AggregateDir.code(), 3);
    }
}
