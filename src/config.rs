// ============================================================================
// File: src/config.rs
// ----------------------------------------------------------------------------
// Plugin configuration from plugstack.conf arguments
// ============================================================================

use std::path::PathBuf;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::{RamdiskError, RamdiskResult};
use crate::path::DEFAULT_ROOT;

/// Plugin configuration
///
/// Built from the `key=value` words that follow the plugin path in
/// `plugstack.conf`, e.g.
/// `required /usr/lib64/slurm/spank_ramdisk.so root=/ramdisks drain=yes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory every RAM disk is created under
    pub root: PathBuf,

    /// Drain the node when a RAM disk cannot be unmounted
    pub drain_on_unmount_failure: bool,

    /// Program used to request the drain
    pub scontrol: PathBuf,

    /// Verbosity of the plugin's own log records
    pub log_level: LevelFilter,
}

impl PluginConfig {
    /// Parse plugin stack arguments on top of the defaults
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> RamdiskResult<Self> {
        let mut config = Self::default();
        for arg in args {
            config.apply(arg.as_ref())?;
        }
        Ok(config)
    }

    fn apply(&mut self, arg: &str) -> RamdiskResult<()> {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| RamdiskError::config(arg, "expected key=value"))?;

        match key {
            "root" => {
                let root = PathBuf::from(value);
                if !root.is_absolute() {
                    return Err(RamdiskError::config(arg, "root must be an absolute path"));
                }
                self.root = root;
            }
            "drain" => {
                self.drain_on_unmount_failure = parse_bool(value)
                    .ok_or_else(|| RamdiskError::config(arg, "expected yes or no"))?;
            }
            "scontrol" => {
                if value.is_empty() {
                    return Err(RamdiskError::config(arg, "scontrol path is empty"));
                }
                self.scontrol = PathBuf::from(value);
            }
            "log" => {
                self.log_level = value
                    .parse()
                    .map_err(|_| RamdiskError::config(arg, "unknown log level"))?;
            }
            _ => return Err(RamdiskError::config(arg, format!("unknown key '{key}'"))),
        }
        Ok(())
    }

    /// Set the RAM disk root directory
    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = root.into();
        self
    }

    /// Enable or disable draining on unmount failure
    pub fn with_drain(mut self, enabled: bool) -> Self {
        self.drain_on_unmount_failure = enabled;
        self
    }

    pub fn with_scontrol<P: Into<PathBuf>>(mut self, scontrol: P) -> Self {
        self.scontrol = scontrol.into();
        self
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            drain_on_unmount_failure: true,
            scontrol: PathBuf::from("scontrol"),
            log_level: LevelFilter::Info,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Some(true),
        "no" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}
