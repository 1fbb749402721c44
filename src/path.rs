// ============================================================================
// File: src/path.rs
// ----------------------------------------------------------------------------
// Deterministic RAM disk locations derived from job/step identity
// ============================================================================

use std::path::{Path, PathBuf};

use log::error;

use crate::error::{RamdiskError, RamdiskResult};
use crate::step::{JobStepIdentity, StepId};

/// Root directory every RAM disk lives under unless configured otherwise
pub const DEFAULT_ROOT: &str = "/ramdisks";

/// Maps job/step identities to RAM disk paths under one root
///
/// The path is recomputed at every hook instead of being stored, so the
/// create and teardown hooks always agree on the location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the RAM disk path for `identity`
    ///
    /// # Errors
    /// `InvalidState` for the pending step and for reserved step ids this
    /// plugin does not know.
    pub fn resolve(&self, identity: &JobStepIdentity) -> RamdiskResult<PathBuf> {
        let job = identity.job_id;
        let name = match identity.step_id {
            StepId::Normal(step) => format!("{job}.{step}.ramdisk"),
            StepId::Batch => format!("{job}.batch.ramdisk"),
            StepId::Extern => format!("{job}.extern.ramdisk"),
            StepId::Interactive => format!("{job}.interactive.ramdisk"),
            StepId::Pending => {
                error!("ramdisk: cannot create ramdisk for pending step");
                return Err(RamdiskError::InvalidState {
                    step_id: identity.step_id.as_raw(),
                    reason: "a pending step has no ramdisk",
                });
            }
            StepId::Reserved(raw) => {
                error!("ramdisk: invalid job step id: {}", raw);
                return Err(RamdiskError::InvalidState {
                    step_id: raw,
                    reason: "unknown reserved step id",
                });
            }
        };
        Ok(self.root.join(name))
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}
