use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use log::{debug, error};
use nix::mount::{MsFlags, mount, umount};

use crate::platform::TmpfsOptions;

/// Mount a tmpfs filesystem at `mount_point`.
pub fn mount_tmpfs(mount_point: &Path, options: &TmpfsOptions) -> io::Result<()> {
    let data = options.data();
    debug!(
        "ramdisk: mounting tmpfs with options {} at {}",
        data,
        mount_point.display()
    );

    mount(
        Some("none"),
        mount_point,
        Some("tmpfs"),
        MsFlags::empty(),
        Some(data.as_str()),
    )
    .map_err(|errno| {
        error!("ramdisk: mount failed at {}: {}", mount_point.display(), errno);
        io::Error::from(errno)
    })
}

/// Detach the filesystem mounted at `mount_point`.
pub fn unmount_tmpfs(mount_point: &Path) -> io::Result<()> {
    debug!("ramdisk: unmounting {}", mount_point.display());
    umount(mount_point).map_err(io::Error::from)
}

/// Utilities for detecting mount points.
pub struct MountDetector;

impl MountDetector {
    /// Check if a path is a mount point by comparing device IDs.
    ///
    /// A directory is a mount point if its device ID differs from its parent's device ID.
    pub fn is_mount_point(path: &Path) -> io::Result<bool> {
        let metadata = fs::metadata(path)?;
        let parent_metadata = fs::metadata(path.parent().unwrap_or(Path::new("/")))?;
        Ok(metadata.dev() != parent_metadata.dev())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_directory_is_not_a_mount_point() {
        let dir = tempfile::tempdir().unwrap();
        let child = dir.path().join("plain");
        fs::create_dir(&child).unwrap();
        assert!(!MountDetector::is_mount_point(&child).unwrap());
    }

    #[test]
    fn missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MountDetector::is_mount_point(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn unmounting_a_plain_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(unmount_tmpfs(dir.path()).is_err());
    }
}
