// ============================================================================
// File: src/spank/mod.rs
// ----------------------------------------------------------------------------
// Loadable SPANK plugin: exported symbols and hook entry points.
//
// plugstack.conf:
//     required /usr/lib64/slurm/libspank_ramdisk.so [root=/ramdisks] [drain=yes]
// ============================================================================

pub mod symbols;

use std::ffi::{CStr, CString, c_char, c_int, c_uint, c_void};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{LevelFilter, error};

use crate::config::PluginConfig;
use crate::error::{RamdiskError, RamdiskResult};
use crate::host::{Context, OptionParser, OptionSpec, SpankHost};
use crate::logging;
use crate::escalation::ScontrolDrainer;
use crate::platform::LinuxRamdisk;
use crate::plugin::RamdiskPlugin;
use crate::size::{RequestedCapacity, SizeResolver};

use symbols::{
    ESPANK_ERROR, ESPANK_SUCCESS, S_CTX_ALLOCATOR, S_CTX_JOB_SCRIPT, S_CTX_LOCAL, S_CTX_REMOTE,
    S_CTX_SLURMD, S_JOB_GID, S_JOB_ID, S_JOB_STEPID, S_JOB_UID, S_STEP_ALLOC_MEM, Spank,
    SpankApi, SpankOption, spank_api,
};

#[allow(non_upper_case_globals)]
#[unsafe(no_mangle)]
pub static plugin_name: [u8; 8] = *b"ramdisk\0";

#[allow(non_upper_case_globals)]
#[unsafe(no_mangle)]
pub static plugin_type: [u8; 6] = *b"spank\0";

#[allow(non_upper_case_globals)]
#[unsafe(no_mangle)]
pub static plugin_version: c_uint = SLURM_VERSION_NUMBER;

/// Slurm release the plugin is built for, from `SLURM_VERSION` at build time
pub const SLURM_VERSION_NUMBER: c_uint = match option_env!("SLURM_VERSION") {
    Some(version) => version_number(version),
    None => version_number("23.11.0"),
};

/// `SLURM_VERSION_NUM(major, minor, micro)` of a `major.minor.micro` string
pub const fn version_number(version: &str) -> c_uint {
    let bytes = version.as_bytes();
    let mut parts = [0 as c_uint; 3];
    let mut part = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'.' {
            part += 1;
            if part == parts.len() {
                break;
            }
        } else if b.is_ascii_digit() {
            parts[part] = parts[part] * 10 + (b - b'0') as c_uint;
        } else {
            break;
        }
        i += 1;
    }
    (parts[0] << 16) | (parts[1] << 8) | parts[2]
}

/// Capacity parsed by the option callback for this process
static REQUESTED: AtomicU64 = AtomicU64::new(0);

fn requested() -> RequestedCapacity {
    RequestedCapacity::from_raw(REQUESTED.load(Ordering::Relaxed))
}

/// `--ramdisk` callback invoked by the host's option parser
unsafe extern "C" fn ramdisk_option_cb(_val: c_int, optarg: *const c_char, _remote: c_int) -> c_int {
    let raw = if optarg.is_null() {
        String::new()
    } else {
        // SAFETY: the host passes the NUL terminated option argument.
        unsafe { CStr::from_ptr(optarg) }.to_string_lossy().into_owned()
    };

    match SizeResolver.parse(&raw) {
        Ok(size) => {
            REQUESTED.store(RequestedCapacity::from(size).as_raw(), Ordering::Relaxed);
            ESPANK_SUCCESS
        }
        Err(e) => {
            error!("ramdisk: {}", e);
            ESPANK_ERROR
        }
    }
}

/// Map a `spank_context()` value
pub fn context_from_raw(raw: c_int) -> Context {
    match raw {
        S_CTX_LOCAL => Context::Local,
        S_CTX_REMOTE => Context::Remote,
        S_CTX_ALLOCATOR => Context::Allocator,
        S_CTX_SLURMD => Context::Slurmd,
        S_CTX_JOB_SCRIPT => Context::JobScript,
        _ => Context::Error,
    }
}

/// `SpankHost` backed by a live `spank_t`
struct SpankHandle {
    sp: Spank,
    api: &'static SpankApi,
}

impl SpankHandle {
    fn get_item(&self, item: c_int, out: *mut c_void, name: &'static str) -> RamdiskResult<()> {
        // SAFETY: `out` points to storage of the type documented for `item`.
        let rc = unsafe { (self.api.get_item)(self.sp, item, out) };
        if rc != ESPANK_SUCCESS {
            return Err(RamdiskError::Metadata { item: name });
        }
        Ok(())
    }

    fn get_u32(&self, item: c_int, name: &'static str) -> RamdiskResult<u32> {
        let mut value: u32 = 0;
        self.get_item(item, (&raw mut value).cast(), name)?;
        Ok(value)
    }
}

fn c_string(value: &str) -> RamdiskResult<CString> {
    CString::new(value).map_err(|_| RamdiskError::invalid_argument(value, "contains a NUL byte"))
}

fn check(call: &'static str, rc: c_int) -> RamdiskResult<()> {
    if rc != ESPANK_SUCCESS {
        return Err(RamdiskError::HostCall { call, code: rc });
    }
    Ok(())
}

impl SpankHost for SpankHandle {
    fn context(&self) -> Context {
        // SAFETY: spank_context takes no arguments.
        context_from_raw(unsafe { (self.api.context)() })
    }

    fn job_id(&self) -> RamdiskResult<u32> {
        self.get_u32(S_JOB_ID, "job ID")
    }

    fn step_id(&self) -> RamdiskResult<u32> {
        self.get_u32(S_JOB_STEPID, "job step ID")
    }

    fn step_alloc_mem(&self) -> RamdiskResult<u64> {
        let mut value: u64 = 0;
        self.get_item(S_STEP_ALLOC_MEM, (&raw mut value).cast(), "step memory allocation")?;
        Ok(value)
    }

    fn job_uid(&self) -> RamdiskResult<u32> {
        self.get_u32(S_JOB_UID, "job UID")
    }

    fn job_gid(&self) -> RamdiskResult<u32> {
        self.get_u32(S_JOB_GID, "job GID")
    }

    fn setenv(&mut self, name: &str, value: &str) -> RamdiskResult<()> {
        let name = c_string(name)?;
        let value = c_string(value)?;
        // SAFETY: both strings outlive the call.
        let rc = unsafe { (self.api.setenv)(self.sp, name.as_ptr(), value.as_ptr(), 1) };
        check("spank_setenv", rc)
    }

    fn unsetenv(&mut self, name: &str) -> RamdiskResult<()> {
        let name = c_string(name)?;
        // SAFETY: the string outlives the call.
        let rc = unsafe { (self.api.unsetenv)(self.sp, name.as_ptr()) };
        check("spank_unsetenv", rc)
    }

    fn register_option(&mut self, option: &OptionSpec) -> RamdiskResult<()> {
        // The host keeps the string pointers, so they are leaked for the
        // life of the process. Registration happens once per load.
        let mut raw = SpankOption {
            name: c_string(option.name)?.into_raw(),
            arginfo: c_string(option.arginfo)?.into_raw(),
            usage: c_string(option.usage)?.into_raw(),
            has_arg: c_int::from(option.has_arg),
            val: 0,
            cb: Some(ramdisk_option_cb),
        };
        // SAFETY: `raw` is a valid spank_option for the duration of the call.
        let rc = unsafe { (self.api.option_register)(self.sp, &mut raw) };
        check("spank_option_register", rc)
    }
}

/// Collect the plugstack.conf arguments
///
/// # Safety
/// `av` must point to `ac` valid C strings, or be null.
unsafe fn plugin_args(ac: c_int, av: *mut *mut c_char) -> Vec<String> {
    if av.is_null() {
        return Vec::new();
    }
    (0..ac.max(0) as usize)
        .filter_map(|i| {
            // SAFETY: the caller guarantees `ac` entries.
            let arg = unsafe { *av.add(i) };
            (!arg.is_null())
                // SAFETY: non-null entries are NUL terminated.
                .then(|| unsafe { CStr::from_ptr(arg) }.to_string_lossy().into_owned())
        })
        .collect()
}

type Hook = fn(&RamdiskPlugin<LinuxRamdisk, ScontrolDrainer>, &mut SpankHandle) -> RamdiskResult<()>;

fn run_hook(sp: Spank, args: Vec<String>, hook: Hook) -> c_int {
    let Some(api) = spank_api() else {
        return ESPANK_ERROR;
    };

    let config = match PluginConfig::from_args(args.as_slice()) {
        Ok(config) => config,
        Err(e) => {
            logging::init(LevelFilter::Info);
            error!("ramdisk: {}", e);
            return ESPANK_ERROR;
        }
    };
    logging::init(config.log_level);

    let plugin = RamdiskPlugin::from_config(&config);
    let mut host = SpankHandle { sp, api };

    match catch_unwind(AssertUnwindSafe(|| hook(&plugin, &mut host))) {
        Ok(Ok(())) => ESPANK_SUCCESS,
        Ok(Err(_)) => ESPANK_ERROR,
        Err(_) => {
            error!("ramdisk: hook panicked");
            ESPANK_ERROR
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn slurm_spank_init(sp: Spank, ac: c_int, av: *mut *mut c_char) -> c_int {
    // SAFETY: the host passes its own argument vector.
    let args = unsafe { plugin_args(ac, av) };
    run_hook(sp, args, |plugin, host| plugin.init(host))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn slurm_spank_init_post_opt(
    sp: Spank,
    ac: c_int,
    av: *mut *mut c_char,
) -> c_int {
    // SAFETY: the host passes its own argument vector.
    let args = unsafe { plugin_args(ac, av) };
    run_hook(sp, args, |plugin, host| {
        plugin.init_post_opt(host, requested()).map(|_| ())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn slurm_spank_exit(sp: Spank, ac: c_int, av: *mut *mut c_char) -> c_int {
    // SAFETY: the host passes its own argument vector.
    let args = unsafe { plugin_args(ac, av) };
    run_hook(sp, args, |plugin, host| plugin.exit(host, requested()).map(|_| ()))
}
