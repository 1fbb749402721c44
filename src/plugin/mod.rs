// ============================================================================
// File: src/plugin/mod.rs
// ----------------------------------------------------------------------------
// SPANK hook orchestration for the --ramdisk option.
//
// Each hook gates on context and requested capacity, derives the RAM disk
// path from the job/step identity and hands off to the mount controller.
// ============================================================================

use std::path::PathBuf;

use log::{debug, error, warn};

use crate::config::PluginConfig;
use crate::controller::{MountController, MountRequest, ReleaseOutcome};
use crate::error::RamdiskResult;
use crate::escalation::NodeDrainer;
use crate::gate::{self, Decision};
use crate::host::{Context, OptionParser, RAMDISK_ENV, RAMDISK_OPTION, SpankHost};
use crate::path::PathResolver;
use crate::platform::RamdiskPlatform;
use crate::size::{Megabytes, RequestedCapacity, SizeResolver};
use crate::step::JobStepIdentity;

#[cfg(target_os = "linux")]
use crate::escalation::ScontrolDrainer;
#[cfg(target_os = "linux")]
use crate::platform::LinuxRamdisk;

/// The RAM disk plugin, one per loaded plugin instance
///
/// Holds no per-job state: the requested capacity is passed into every hook
/// that needs it.
#[derive(Debug)]
pub struct RamdiskPlugin<P, D> {
    paths: PathResolver,
    controller: MountController<P, D>,
    parser: SizeResolver,
}

#[cfg(target_os = "linux")]
impl RamdiskPlugin<LinuxRamdisk, ScontrolDrainer> {
    /// Plugin acting on the local node
    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(
            config,
            LinuxRamdisk::new(),
            ScontrolDrainer::new(config.scontrol.clone()),
        )
    }
}

impl<P: RamdiskPlatform, D: NodeDrainer> RamdiskPlugin<P, D> {
    pub fn new(config: &PluginConfig, platform: P, drainer: D) -> Self {
        Self {
            paths: PathResolver::new(config.root.clone()),
            controller: MountController::new(platform, drainer)
                .with_drain(config.drain_on_unmount_failure),
            parser: SizeResolver,
        }
    }

    pub fn controller(&self) -> &MountController<P, D> {
        &self.controller
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Register `--ramdisk` with the host
    pub fn init<H: SpankHost>(&self, host: &mut H) -> RamdiskResult<()> {
        host.register_option(&RAMDISK_OPTION)
    }

    /// Option callback: resolve the raw `--ramdisk` argument
    pub fn parse_option(&self, raw: &str) -> RamdiskResult<RequestedCapacity> {
        self.parser
            .parse(raw)
            .map(RequestedCapacity::from)
            .inspect_err(|e| error!("ramdisk: {}", e))
    }

    /// Post option parsing hook: create the RAM disk and publish its path
    ///
    /// Returns the RAM disk path, or `None` when the hook had nothing to do.
    pub fn init_post_opt<H: SpankHost>(
        &self,
        host: &mut H,
        requested: RequestedCapacity,
    ) -> RamdiskResult<Option<PathBuf>> {
        let Some(capacity) = gated(host.context(), requested) else {
            return Ok(None);
        };

        let identity = read_identity(host)?;
        let allocation = host.step_alloc_mem().inspect_err(|e| error!("ramdisk: {}", e))?;
        let path = self.paths.resolve(&identity)?;
        debug!("ramdisk: using directory {}", path.display());

        // ownership is read before any filesystem operation
        let owner = host.job_uid().inspect_err(|e| error!("ramdisk: {}", e))?;
        let group = match host.job_gid() {
            Ok(gid) => Some(gid),
            Err(e) => {
                warn!("ramdisk: {}, mounting without a group restriction", e);
                None
            }
        };

        let request = MountRequest {
            path,
            capacity,
            allocation: Megabytes::new(allocation),
            owner,
            group,
        };

        if let Err(e) = self.controller.ensure(&request) {
            if let Err(unset) = host.unsetenv(RAMDISK_ENV) {
                debug!("ramdisk: unable to unset {}: {}", RAMDISK_ENV, unset);
            }
            return Err(e);
        }

        let value = request.path.to_string_lossy();
        if let Err(e) = host.setenv(RAMDISK_ENV, &value) {
            error!("ramdisk: unable to set {}={}: {}", RAMDISK_ENV, value, e);
        }
        Ok(Some(request.path))
    }

    /// Exit hook: tear the RAM disk down
    pub fn exit<H: SpankHost>(
        &self,
        host: &mut H,
        requested: RequestedCapacity,
    ) -> RamdiskResult<Option<ReleaseOutcome>> {
        if gated(host.context(), requested).is_none() {
            return Ok(None);
        }

        let identity = read_identity(host)?;
        let path = self.paths.resolve(&identity)?;
        debug!("ramdisk: using directory {}", path.display());

        self.controller.release(&path).map(Some)
    }
}

fn gated(context: Context, requested: RequestedCapacity) -> Option<Megabytes> {
    match gate::evaluate(context, requested) {
        Decision::Proceed => requested.megabytes(),
        Decision::Skip => None,
    }
}

fn read_identity<H: SpankHost>(host: &H) -> RamdiskResult<JobStepIdentity> {
    let job_id = host.job_id().inspect_err(|e| error!("ramdisk: {}", e))?;
    let step_id = host.step_id().inspect_err(|e| error!("ramdisk: {}", e))?;
    Ok(JobStepIdentity::new(job_id, step_id))
}

#[cfg(test)]
mod tests;
