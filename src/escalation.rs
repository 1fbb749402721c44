// ============================================================================
// File: src/escalation.rs
// ----------------------------------------------------------------------------
// Node drain requests after an unrecoverable teardown failure
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::process::Command;

use log::{info, warn};

/// Hands a node over to operators by taking it out of scheduling
pub trait NodeDrainer {
    /// Ask the control plane to drain this node with `reason`
    fn drain(&self, reason: &str) -> io::Result<()>;
}

/// Drains the node through `scontrol update`
#[derive(Debug, Clone)]
pub struct ScontrolDrainer {
    scontrol: PathBuf,
    node_name: Option<String>,
}

impl ScontrolDrainer {
    pub fn new<P: Into<PathBuf>>(scontrol: P) -> Self {
        Self {
            scontrol: scontrol.into(),
            node_name: None,
        }
    }

    /// Drain `node_name` instead of the local short hostname
    pub fn with_node_name<N: Into<String>>(mut self, node_name: N) -> Self {
        self.node_name = Some(node_name.into());
        self
    }

    fn node_name(&self) -> io::Result<String> {
        if let Some(name) = &self.node_name {
            return Ok(name.clone());
        }
        let hostname = local_hostname()?;
        Ok(short_hostname(&hostname).to_string())
    }

    /// Arguments passed to scontrol for `node` and `reason`
    pub fn arguments(node: &str, reason: &str) -> Vec<String> {
        vec![
            "update".to_string(),
            format!("nodename={node}"),
            "state=DRAIN".to_string(),
            format!("reason={reason}"),
        ]
    }
}

impl NodeDrainer for ScontrolDrainer {
    fn drain(&self, reason: &str) -> io::Result<()> {
        let node = self.node_name()?;
        info!("ramdisk: draining node {} ({})", node, reason);

        let output = Command::new(&self.scontrol)
            .args(Self::arguments(&node, reason))
            .output()?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("ramdisk: scontrol failed to drain {}: {}", node, stderr.trim());
        Err(io::Error::other(format!(
            "{} exited with {}",
            self.scontrol.display(),
            output.status
        )))
    }
}

#[cfg(target_os = "linux")]
fn local_hostname() -> io::Result<String> {
    Ok(nix::unistd::gethostname()?.to_string_lossy().into_owned())
}

#[cfg(not(target_os = "linux"))]
fn local_hostname() -> io::Result<String> {
    std::env::var("HOSTNAME").map_err(io::Error::other)
}

/// Host name up to the first dot, as `hostname -s` prints it
pub fn short_hostname(hostname: &str) -> &str {
    hostname.split('.').next().unwrap_or(hostname)
}
