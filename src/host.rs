// ============================================================================
// File: src/host.rs
// ----------------------------------------------------------------------------
// Interface to the host scheduler runtime.
//
// The plugin only ever talks to the scheduler through `SpankHost`, which
// keeps the hook logic testable without a running slurmstepd.
// ============================================================================

use crate::error::RamdiskResult;
use crate::size::Megabytes;

/// Environment variable naming the RAM disk for the job's tasks
pub const RAMDISK_ENV: &str = "SLURM_JOB_RAMDISK";

/// Execution context a hook runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// The host could not tell
    Error,
    /// `srun` on the submission side
    Local,
    /// slurmstepd on the compute node
    Remote,
    /// `salloc` or `sbatch`
    Allocator,
    /// The slurmd daemon itself
    Slurmd,
    /// Prolog/epilog job script
    JobScript,
}

/// Description of a command line option registered with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub arginfo: &'static str,
    pub usage: &'static str,
    pub has_arg: bool,
}

/// The single `--ramdisk N[MG]` option
pub const RAMDISK_OPTION: OptionSpec = OptionSpec {
    name: "ramdisk",
    arginfo: "N[MG]",
    usage: "Create a RAM disk of N (MB, GB), allocating as a portion of the memory requested.",
    has_arg: true,
};

/// Parses the raw argument of a registered option
pub trait OptionParser {
    fn parse(&self, raw: &str) -> RamdiskResult<Megabytes>;
}

/// Per-invocation view of the host scheduler
///
/// Item readers fail with `RamdiskError::Metadata` when the host cannot
/// supply the item in the current context.
pub trait SpankHost {
    /// Context the current hook is running in
    fn context(&self) -> Context;

    fn job_id(&self) -> RamdiskResult<u32>;

    /// Raw step id, sentinels included
    fn step_id(&self) -> RamdiskResult<u32>;

    /// Memory allocated to the step, in megabytes
    fn step_alloc_mem(&self) -> RamdiskResult<u64>;

    fn job_uid(&self) -> RamdiskResult<u32>;

    fn job_gid(&self) -> RamdiskResult<u32>;

    /// Set a variable in the environment of the job's tasks, overwriting it
    fn setenv(&mut self, name: &str, value: &str) -> RamdiskResult<()>;

    fn unsetenv(&mut self, name: &str) -> RamdiskResult<()>;

    fn register_option(&mut self, option: &OptionSpec) -> RamdiskResult<()>;
}
