// ============================================================================
// File: src/logging.rs
// ----------------------------------------------------------------------------
// Logger installation: Slurm's own log when loaded by Slurm, stderr otherwise
// ============================================================================

#[cfg(target_os = "linux")]
use std::ffi::CString;
use std::sync::Once;

use log::LevelFilter;
#[cfg(target_os = "linux")]
use log::{Level, Log, Metadata, Record};

#[cfg(target_os = "linux")]
use crate::spank::symbols::{LogApi, log_api};

/// Forwards records to `slurm_error`, `slurm_info`, `slurm_verbose` and `slurm_debug`
#[cfg(target_os = "linux")]
struct SlurmLogger {
    api: &'static LogApi,
}

#[cfg(target_os = "linux")]
impl Log for SlurmLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("{}", record.args()).replace('\0', " ");
        let Ok(message) = CString::new(message) else {
            return;
        };
        let sink = match record.level() {
            Level::Error => self.api.error,
            Level::Warn | Level::Info => self.api.info,
            Level::Debug => self.api.verbose,
            Level::Trace => self.api.debug,
        };
        // SAFETY: "%s" consumes exactly the one string argument passed.
        unsafe { sink(c"%s".as_ptr(), message.as_ptr()) };
    }

    fn flush(&self) {}
}

/// Install the process logger once
///
/// Inside a Slurm process records go to Slurm's log; anywhere else they go
/// to stderr through `env_logger`. Later calls do nothing.
pub fn init(level: LevelFilter) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if !install_slurm_logger() {
            let _ = env_logger::Builder::new()
                .filter_level(level)
                .format_timestamp(None)
                .try_init();
        }
        log::set_max_level(level);
    });
}

#[cfg(target_os = "linux")]
fn install_slurm_logger() -> bool {
    match log_api() {
        Some(api) => log::set_boxed_logger(Box::new(SlurmLogger { api })).is_ok(),
        None => false,
    }
}

#[cfg(not(target_os = "linux"))]
fn install_slurm_logger() -> bool {
    false
}
