// ============================================================================
// File: src/lib.rs
// ----------------------------------------------------------------------------
// spank-ramdisk: per-job-step tmpfs RAM disks for Slurm.
//
// `srun --ramdisk 2G ...` makes slurmstepd mount a 2048 MB tmpfs at
// `/ramdisks/<job>.<step>.ramdisk`, owned by the job's user, before the
// step's tasks start, and tear it down when the step exits. The RAM disk is
// debited from the step's own memory allocation and published to the tasks
// as `SLURM_JOB_RAMDISK`.
// ============================================================================

pub mod config;
pub mod controller;
pub mod error;
pub mod escalation;
pub mod gate;
pub mod host;
pub mod logging;
pub mod path;
pub mod platform;
pub mod plugin;
pub mod size;
pub mod step;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "linux")]
pub mod spank;

pub use config::PluginConfig;
pub use controller::{EnsureOutcome, MountController, MountRequest, ReleaseOutcome};
pub use error::{ErrorKind, RamdiskError, RamdiskResult};
pub use escalation::{NodeDrainer, ScontrolDrainer};
pub use host::{Context, OptionParser, OptionSpec, RAMDISK_ENV, RAMDISK_OPTION, SpankHost};
pub use path::PathResolver;
pub use platform::{PathState, RamdiskPlatform, TmpfsOptions};
pub use plugin::RamdiskPlugin;
pub use size::{Megabytes, RequestedCapacity, SizeResolver, parse_size};
pub use step::{JobStepIdentity, StepId};
