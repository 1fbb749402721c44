// ============================================================================
// File: src/platform/ramdisk.rs
// ----------------------------------------------------------------------------
// Platform-specific ramdisk operations trait.
//
// The mount controller drives these primitives; implementations provide
// the actual directory and tmpfs handling for the node they run on.
// ============================================================================

use std::io;
use std::path::Path;

use crate::size::Megabytes;

/// What currently occupies a RAM disk path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    Missing,
    Directory,
    /// A file, socket or other non-directory entry
    Other,
}

/// Options for a tmpfs mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TmpfsOptions {
    pub size: Megabytes,
    pub uid: u32,
    /// `None` leaves the group unrestricted
    pub gid: Option<u32>,
    pub mode: u32,
}

impl TmpfsOptions {
    pub fn new(size: Megabytes, uid: u32, gid: Option<u32>) -> Self {
        Self {
            size,
            uid,
            gid,
            mode: 0o700,
        }
    }

    /// Render the mount data string passed to the kernel
    pub fn data(&self) -> String {
        let mut data = format!("size={}M,uid={}", self.size.get(), self.uid);
        if let Some(gid) = self.gid {
            data.push_str(&format!(",gid={gid}"));
        }
        data.push_str(&format!(",mode={:o}", self.mode));
        data
    }
}

/// Platform-specific ramdisk operations trait
///
/// Every method acts on exactly one path and leaves idempotence to the
/// caller.
pub trait RamdiskPlatform {
    /// Inspect what occupies `path`
    fn probe(&self, path: &Path) -> PathState;

    /// Create the mount point directory, owner-only
    ///
    /// # Arguments
    /// * `path` - Directory to create; its parent must already exist
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Attach a tmpfs at `path`
    ///
    /// # Arguments
    /// * `path` - Existing mount point directory
    /// * `options` - Size and ownership of the new filesystem
    fn mount_tmpfs(&self, path: &Path, options: &TmpfsOptions) -> io::Result<()>;

    /// Detach the filesystem mounted at `path`
    fn unmount(&self, path: &Path) -> io::Result<()>;

    /// Remove the empty mount point directory
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Whether a filesystem is mounted at `path`
    fn is_mount_point(&self, path: &Path) -> io::Result<bool>;
}
