// ============================================================================
// File: src/controller.rs
// ----------------------------------------------------------------------------
// Idempotent creation and teardown of job step RAM disks.
//
// Mount state is never recorded: an existing directory at the resolved path
// means the RAM disk is mounted, a missing one means it is gone.
// ============================================================================

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::error::{RamdiskError, RamdiskResult};
use crate::escalation::NodeDrainer;
use crate::platform::{PathState, RamdiskPlatform, TmpfsOptions};
use crate::size::Megabytes;

/// Everything `ensure` needs, captured before the filesystem is touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRequest {
    pub path: PathBuf,
    pub capacity: Megabytes,
    /// Memory allocated to the step
    pub allocation: Megabytes,
    pub owner: u32,
    /// `None` when the job's group could not be read
    pub group: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    AlreadyMounted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    AlreadyReleased,
}

/// Creates and tears down RAM disks on one platform
#[derive(Debug)]
pub struct MountController<P, D> {
    platform: P,
    drainer: D,
    drain_on_unmount_failure: bool,
}

impl<P: RamdiskPlatform, D: NodeDrainer> MountController<P, D> {
    pub fn new(platform: P, drainer: D) -> Self {
        Self {
            platform,
            drainer,
            drain_on_unmount_failure: true,
        }
    }

    /// Enable or disable the node drain on unmount failure
    pub fn with_drain(mut self, enabled: bool) -> Self {
        self.drain_on_unmount_failure = enabled;
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn drainer(&self) -> &D {
        &self.drainer
    }

    /// Make sure a RAM disk of the requested size is mounted at the path
    ///
    /// # Errors
    /// * `CapacityExceedsAllocation` - capacity is not below the allocation
    /// * `PathConflict` - a non-directory occupies the path
    /// * `CreateFailed` - the directory could not be created
    /// * `MountFailed` - tmpfs could not be mounted; the directory stays
    pub fn ensure(&self, request: &MountRequest) -> RamdiskResult<EnsureOutcome> {
        if request.capacity >= request.allocation {
            error!(
                "ramdisk: cannot create ramdisk of size {} when allocated {}",
                request.capacity, request.allocation
            );
            return Err(RamdiskError::CapacityExceedsAllocation {
                requested_mb: request.capacity.get(),
                allocated_mb: request.allocation.get(),
            });
        }

        let path = request.path.as_path();
        info!(
            "ramdisk: creating a ramdisk - {} at {}",
            request.capacity,
            path.display()
        );

        match self.platform.probe(path) {
            PathState::Directory => {
                self.warn_if_not_mounted(path);
                debug!("ramdisk: directory path exists, assuming we've already mounted it");
                return Ok(EnsureOutcome::AlreadyMounted);
            }
            PathState::Other => {
                error!("ramdisk: {} exists but is not a directory", path.display());
                return Err(RamdiskError::PathConflict {
                    path: path.to_path_buf(),
                });
            }
            PathState::Missing => {}
        }

        self.platform
            .create_dir(path)
            .map_err(|source| RamdiskError::CreateFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let options = TmpfsOptions::new(request.capacity, request.owner, request.group);
        self.platform.mount_tmpfs(path, &options).map_err(|source| {
            error!("ramdisk: failed to mount tmpfs at {}: {}", path.display(), source);
            RamdiskError::MountFailed {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Ok(EnsureOutcome::Created)
    }

    /// Unmount and remove the RAM disk at `path` if it is there
    ///
    /// An unmount failure drains the node before the error is returned. A
    /// failure to remove the emptied directory is only logged.
    pub fn release(&self, path: &Path) -> RamdiskResult<ReleaseOutcome> {
        info!("ramdisk: deleting the ramdisk - {}", path.display());

        if self.platform.probe(path) == PathState::Missing {
            debug!("ramdisk: directory path missing, assuming we've already deleted it");
            return Ok(ReleaseOutcome::AlreadyReleased);
        }

        if let Err(source) = self.platform.unmount(path) {
            error!(
                "ramdisk: failed to unmount tmpfs at {}: {}",
                path.display(),
                source
            );
            self.escalate(path);
            return Err(RamdiskError::UnmountFailed {
                path: path.to_path_buf(),
                source,
            });
        }

        if let Err(e) = self.platform.remove_dir(path) {
            error!(
                "ramdisk: failed to delete tmpfs directory {}: {}",
                path.display(),
                e
            );
        }

        Ok(ReleaseOutcome::Released)
    }

    fn escalate(&self, path: &Path) {
        if !self.drain_on_unmount_failure {
            warn!("ramdisk: node drain disabled, leaving {} for operators", path.display());
            return;
        }

        error!("ramdisk: attempting to drain node");
        let reason = drain_reason(path);
        if let Err(e) = self.drainer.drain(&reason) {
            error!("ramdisk: failed to drain node: {}", e);
        }
    }

    fn warn_if_not_mounted(&self, path: &Path) {
        match self.platform.is_mount_point(path) {
            Ok(true) => {}
            Ok(false) => warn!(
                "ramdisk: {} exists but nothing is mounted on it",
                path.display()
            ),
            Err(e) => debug!("ramdisk: cannot check mount at {}: {}", path.display(), e),
        }
    }
}

/// Reason recorded on the node when it is drained
pub fn drain_reason(path: &Path) -> String {
    format!("failed to unmount ramdisk {}", path.display())
}
