use std::io;
use std::path::Path;

mod directory;
mod mount;

pub use directory::DirectoryManager;
pub use mount::MountDetector;

use crate::platform::{PathState, RamdiskPlatform, TmpfsOptions};

/// Linux ramdisk implementation using tmpfs.
///
/// Runs inside slurmstepd as root, so every operation is a direct system
/// call with no privilege fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxRamdisk;

impl LinuxRamdisk {
    /// Create a new LinuxRamdisk instance.
    pub fn new() -> Self {
        Self
    }
}

impl RamdiskPlatform for LinuxRamdisk {
    fn probe(&self, path: &Path) -> PathState {
        DirectoryManager::probe(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        DirectoryManager::create_mount_point(path)
    }

    fn mount_tmpfs(&self, path: &Path, options: &TmpfsOptions) -> io::Result<()> {
        mount::mount_tmpfs(path, options)
    }

    fn unmount(&self, path: &Path) -> io::Result<()> {
        mount::unmount_tmpfs(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        DirectoryManager::remove_mount_point(path)
    }

    fn is_mount_point(&self, path: &Path) -> io::Result<bool> {
        MountDetector::is_mount_point(path)
    }
}
