// ============================================================================
// File: src/error.rs
// ----------------------------------------------------------------------------
// Error types for RAM disk lifecycle operations
// ============================================================================

use std::io;
use std::path::PathBuf;

/// Errors raised while preparing or tearing down a job step RAM disk
///
/// Every variant except `Metadata` for the owning group aborts the current
/// hook; the host scheduler decides what happens to the job step.
#[derive(Debug, thiserror::Error)]
pub enum RamdiskError {
    /// The `--ramdisk` argument could not be turned into a size
    #[error("invalid --ramdisk value '{value}': {reason}")]
    InvalidArgument { value: String, reason: &'static str },

    /// The step identity cannot own a RAM disk
    #[error("invalid job step id {step_id}: {reason}")]
    InvalidState { step_id: u32, reason: &'static str },

    /// The RAM disk would consume the whole step allocation
    #[error("cannot create ramdisk of size {requested_mb}M when allocated {allocated_mb}M")]
    CapacityExceedsAllocation { requested_mb: u64, allocated_mb: u64 },

    /// Something other than a directory occupies the target path
    #[error("{} exists but is not a directory", path.display())]
    PathConflict { path: PathBuf },

    /// The mount point directory could not be created
    #[error("failed to create directory {}: {source}", path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// tmpfs could not be attached to the mount point
    #[error("failed to mount tmpfs at {}: {source}", path.display())]
    MountFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// tmpfs could not be detached; memory may still be pinned on the node
    #[error("failed to unmount tmpfs at {}: {source}", path.display())]
    UnmountFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The host scheduler could not supply a job item
    #[error("failed to get {item}")]
    Metadata { item: &'static str },

    /// A call into the host scheduler returned an error code
    #[error("{call} failed with code {code}")]
    HostCall { call: &'static str, code: i32 },

    /// A plugin stack argument was malformed
    #[error("invalid plugin argument '{arg}': {reason}")]
    Config { arg: String, reason: String },
}

/// Fieldless discriminant of [`RamdiskError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidState,
    CapacityExceedsAllocation,
    PathConflict,
    CreateFailed,
    MountFailed,
    UnmountFailed,
    Metadata,
    HostCall,
    Config,
}

impl RamdiskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::CapacityExceedsAllocation { .. } => ErrorKind::CapacityExceedsAllocation,
            Self::PathConflict { .. } => ErrorKind::PathConflict,
            Self::CreateFailed { .. } => ErrorKind::CreateFailed,
            Self::MountFailed { .. } => ErrorKind::MountFailed,
            Self::UnmountFailed { .. } => ErrorKind::UnmountFailed,
            Self::Metadata { .. } => ErrorKind::Metadata,
            Self::HostCall { .. } => ErrorKind::HostCall,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    pub(crate) fn invalid_argument(value: &str, reason: &'static str) -> Self {
        Self::InvalidArgument {
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn config<A: Into<String>, R: Into<String>>(arg: A, reason: R) -> Self {
        Self::Config {
            arg: arg.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for RAM disk operations
pub type RamdiskResult<T> = Result<T, RamdiskError>;
