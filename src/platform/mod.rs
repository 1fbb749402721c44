// ============================================================================
// File: src/platform/mod.rs
// ----------------------------------------------------------------------------
// Filesystem seam between the mount controller and the node
// ============================================================================

mod ramdisk;

pub use ramdisk::{PathState, RamdiskPlatform, TmpfsOptions};

#[cfg(target_os = "linux")]
pub use crate::linux::LinuxRamdisk;
