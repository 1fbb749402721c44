use std::fs::{self, DirBuilder};
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use log::{debug, error, info};

use crate::platform::PathState;

/// Utilities for RAM disk mount point directories.
pub struct DirectoryManager;

impl DirectoryManager {
    /// Look up `path` the way `stat(2)` does.
    ///
    /// Any failed lookup counts as missing; a later create reports the real
    /// cause.
    pub fn probe(path: &Path) -> PathState {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => PathState::Directory,
            Ok(_) => PathState::Other,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!("ramdisk: stat {} failed: {}", path.display(), e);
                }
                PathState::Missing
            }
        }
    }

    /// Create the mount point directory with mode 0700.
    ///
    /// Only the last component is created; a missing root is an error.
    pub fn create_mount_point(mount_point: &Path) -> io::Result<()> {
        info!("ramdisk: creating mount point at {}", mount_point.display());
        DirBuilder::new()
            .mode(0o700)
            .create(mount_point)
            .inspect_err(|e| {
                error!(
                    "ramdisk: failed to create directory {}: {}",
                    mount_point.display(),
                    e
                );
            })
    }

    /// Remove an empty mount point directory.
    pub fn remove_mount_point(mount_point: &Path) -> io::Result<()> {
        fs::remove_dir(mount_point)
    }
}
