//! Per-job workspace for local media artifacts.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use vox_models::JobId;

use crate::error::WorkerResult;

/// Scoped directory owning every local artifact of one job run.
///
/// Lives at `{work_dir}/{job_id}`. Callers release it with
/// [`JobWorkspace::cleanup`] on every exit path; `Drop` removes the
/// directory synchronously as a last resort if cleanup was bypassed (e.g.
/// an unwind).
#[derive(Debug)]
pub struct JobWorkspace {
    root: PathBuf,
    cleaned: bool,
}

impl JobWorkspace {
    /// Create the workspace directory for a job.
    pub async fn create(work_dir: &str, job_id: &JobId) -> WorkerResult<Self> {
        let root = PathBuf::from(work_dir).join(job_id.as_str());
        tokio::fs::create_dir_all(&root).await?;
        debug!("Created job workspace at {}", root.display());
        Ok(Self {
            root,
            cleaned: false,
        })
    }

    /// Workspace root directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Directory for sampled frames.
    pub fn frames_dir(&self) -> PathBuf {
        self.root.join("frames")
    }

    /// Scratch directory for audio merge parts.
    pub fn audio_parts_dir(&self) -> PathBuf {
        self.root.join("audio_parts")
    }

    /// Remove the workspace and everything in it.
    pub async fn cleanup(mut self) {
        self.cleaned = true;
        if let Err(e) = tokio::fs::remove_dir_all(&self.root).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to clean up job workspace {}: {}",
                    self.root.display(),
                    e
                );
            }
        } else {
            debug!("Cleaned up job workspace {}", self.root.display());
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if !self.cleaned {
            // Unwind fallback: cleanup() was never awaited
            if let Err(e) = std::fs::remove_dir_all(&self.root) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        "Drop-path cleanup of {} failed: {}",
                        self.root.display(),
                        e
                    );
                }
            }
        }
    }
}
