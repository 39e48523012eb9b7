//! Provisioning for the face-analysis model artifacts.
//!
//! Readiness of the analyzer is defined over the full artifact set: all
//! five must resolve to local files before analysis may start, and any
//! single failure keeps the system not-ready (no retry).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use thiserror::Error;

use crate::shared::constants::{
    AGE_GENDER_MODEL_NAME, DETECTOR_MODEL_NAME, EXPRESSION_MODEL_NAME, LANDMARK_MODEL_NAME,
    MODEL_BASE_URL, RECOGNITION_MODEL_NAME,
};
use crate::shared::model_resolver::{self, ModelResolveError, ResolveLocations};

/// The five model artifacts face analysis is provisioned with.
///
/// The recognition artifact gates readiness like the others but the demo
/// pipeline never executes it; it ships with the set so a provisioned
/// install is complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelArtifact {
    Detector,
    Landmarks,
    Recognition,
    Expression,
    AgeGender,
}

impl ModelArtifact {
    pub const ALL: [ModelArtifact; 5] = [
        ModelArtifact::Detector,
        ModelArtifact::Landmarks,
        ModelArtifact::Recognition,
        ModelArtifact::Expression,
        ModelArtifact::AgeGender,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ModelArtifact::Detector => DETECTOR_MODEL_NAME,
            ModelArtifact::Landmarks => LANDMARK_MODEL_NAME,
            ModelArtifact::Recognition => RECOGNITION_MODEL_NAME,
            ModelArtifact::Expression => EXPRESSION_MODEL_NAME,
            ModelArtifact::AgeGender => AGE_GENDER_MODEL_NAME,
        }
    }

    pub fn url(&self) -> String {
        format!("{}/{}", MODEL_BASE_URL, self.file_name())
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelArtifact::Detector => "detector",
            ModelArtifact::Landmarks => "landmarks",
            ModelArtifact::Recognition => "recognition",
            ModelArtifact::Expression => "expression",
            ModelArtifact::AgeGender => "age/gender",
        }
    }
}

impl fmt::Display for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Error, Debug)]
pub enum ModelSetError {
    #[error("model artifact '{artifact}' failed to load: {source}")]
    Artifact {
        artifact: &'static str,
        #[source]
        source: ModelResolveError,
    },
    #[error("model artifact '{artifact}' worker panicked")]
    Worker { artifact: &'static str },
}

/// Progress callback: `(artifact, bytes_downloaded, total_bytes)`.
/// Only fires while an artifact is actually downloading; cache and
/// bundled hits complete without progress events.
pub type SetProgressFn = Arc<dyn Fn(ModelArtifact, u64, u64) + Send + Sync>;

/// Local paths for the fully resolved artifact set.
#[derive(Clone, Debug)]
pub struct ModelSet {
    paths: HashMap<ModelArtifact, PathBuf>,
}

impl ModelSet {
    /// Resolves all five artifacts concurrently, one worker per artifact.
    ///
    /// Order-independent and all-or-nothing: the first failure is returned
    /// after every worker has finished, and no partial set is produced.
    pub fn resolve_all(
        locations: &ResolveLocations<'_>,
        progress: Option<SetProgressFn>,
    ) -> Result<ModelSet, ModelSetError> {
        let pairs: Vec<(ModelArtifact, String)> = ModelArtifact::ALL
            .iter()
            .map(|&a| (a, a.url()))
            .collect();
        Self::resolve_set(&pairs, locations, progress)
    }

    /// Resolution over an explicit `(artifact, url)` table; `resolve_all`
    /// supplies the production table.
    fn resolve_set(
        pairs: &[(ModelArtifact, String)],
        locations: &ResolveLocations<'_>,
        progress: Option<SetProgressFn>,
    ) -> Result<ModelSet, ModelSetError> {
        let (tx, rx) = crossbeam_channel::unbounded();

        thread::scope(|scope| {
            for (artifact, url) in pairs {
                let tx = tx.clone();
                let progress = progress.clone();
                let artifact = *artifact;
                scope.spawn(move || {
                    let per_artifact = progress.map(|cb| {
                        Box::new(move |done, total| cb(artifact, done, total)) as _
                    });
                    let result = model_resolver::resolve(
                        artifact.file_name(),
                        url,
                        locations,
                        per_artifact,
                    );
                    // Receiver outlives the scope; a send can only fail if
                    // resolve_set itself already panicked.
                    let _ = tx.send((artifact, result));
                });
            }
        });
        drop(tx);

        let mut paths = HashMap::new();
        let mut first_error: Option<ModelSetError> = None;
        let mut completed = std::collections::HashSet::new();
        for (artifact, result) in rx.iter() {
            completed.insert(artifact);
            match result {
                Ok(path) => {
                    log::info!("model artifact '{artifact}' resolved to {}", path.display());
                    paths.insert(artifact, path);
                }
                Err(e) => {
                    log::error!("model artifact '{artifact}' failed to load: {e}");
                    first_error.get_or_insert(ModelSetError::Artifact {
                        artifact: artifact.label(),
                        source: e,
                    });
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        // A worker that panicked never reported; surface it as its own case
        // rather than returning a set with holes.
        for (artifact, _) in pairs {
            if !completed.contains(artifact) {
                return Err(ModelSetError::Worker {
                    artifact: artifact.label(),
                });
            }
        }
        Ok(ModelSet { paths })
    }

    pub fn path(&self, artifact: ModelArtifact) -> &Path {
        self.paths
            .get(&artifact)
            .expect("resolve_all populates every artifact")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[test]
    fn test_artifact_table_is_complete_and_distinct() {
        assert_eq!(ModelArtifact::ALL.len(), 5);
        let mut names: Vec<&str> = ModelArtifact::ALL.iter().map(|a| a.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
        for artifact in ModelArtifact::ALL {
            assert!(artifact.url().starts_with(MODEL_BASE_URL));
            assert!(artifact.url().ends_with(artifact.file_name()));
        }
    }

    #[test]
    fn test_resolve_all_from_override_dir() {
        let tmp = TempDir::new().unwrap();
        for artifact in ModelArtifact::ALL {
            fs::write(tmp.path().join(artifact.file_name()), b"stub weights").unwrap();
        }

        let locations = ResolveLocations {
            override_dir: Some(tmp.path()),
            bundled_dir: None,
        };
        let set = ModelSet::resolve_all(&locations, None).unwrap();
        for artifact in ModelArtifact::ALL {
            assert_eq!(set.path(artifact), tmp.path().join(artifact.file_name()));
        }
    }

    #[test]
    fn test_local_hits_fire_no_progress() {
        let tmp = TempDir::new().unwrap();
        for artifact in ModelArtifact::ALL {
            fs::write(tmp.path().join(artifact.file_name()), b"stub weights").unwrap();
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let progress: SetProgressFn = Arc::new(move |_, _, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let locations = ResolveLocations {
            override_dir: Some(tmp.path()),
            bundled_dir: None,
        };
        ModelSet::resolve_all(&locations, Some(progress)).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_unresolvable_artifact_fails_the_set() {
        // Name chosen so no user cache can satisfy it; the download step
        // then fails fast on an unresolvable host.
        let pairs = vec![(
            ModelArtifact::Detector,
            "http://invalid.nonexistent.example.com/lenslab-test-absent.onnx".to_string(),
        )];
        let tmp = TempDir::new().unwrap();
        let locations = ResolveLocations {
            override_dir: Some(tmp.path()),
            bundled_dir: None,
        };
        let result = ModelSet::resolve_set(&pairs, &locations, None);
        match result {
            Err(ModelSetError::Artifact { artifact, .. }) => assert_eq!(artifact, "detector"),
            other => panic!("expected artifact failure, got {other:?}"),
        }
    }
}
