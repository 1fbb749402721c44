// ============================================================================
// File: src/spank/symbols.rs
// ----------------------------------------------------------------------------
// Host entry points resolved from the process that loaded the plugin.
//
// slurmstepd, srun and friends export the SPANK API themselves; looking the
// symbols up at run time keeps the library linkable without libslurm.
// ============================================================================

use std::ffi::{CStr, c_char, c_int, c_void};
use std::sync::OnceLock;

use nix::libc;

/// Opaque `spank_t` handle
pub type Spank = *mut c_void;

pub const ESPANK_SUCCESS: c_int = 0;
pub const ESPANK_ERROR: c_int = 1;

// enum spank_item
pub const S_JOB_UID: c_int = 0;
pub const S_JOB_GID: c_int = 1;
pub const S_JOB_ID: c_int = 2;
pub const S_JOB_STEPID: c_int = 3;
pub const S_STEP_ALLOC_MEM: c_int = 28;

// enum spank_context
pub const S_CTX_ERROR: c_int = 0;
pub const S_CTX_LOCAL: c_int = 1;
pub const S_CTX_REMOTE: c_int = 2;
pub const S_CTX_ALLOCATOR: c_int = 3;
pub const S_CTX_SLURMD: c_int = 4;
pub const S_CTX_JOB_SCRIPT: c_int = 5;

/// `spank_opt_cb_f`
pub type OptionCallback = unsafe extern "C" fn(c_int, *const c_char, c_int) -> c_int;

/// `struct spank_option`
#[repr(C)]
pub struct SpankOption {
    pub name: *const c_char,
    pub arginfo: *const c_char,
    pub usage: *const c_char,
    pub has_arg: c_int,
    pub val: c_int,
    pub cb: Option<OptionCallback>,
}

type GetItemFn = unsafe extern "C" fn(Spank, c_int, ...) -> c_int;
type ContextFn = unsafe extern "C" fn() -> c_int;
type SetenvFn = unsafe extern "C" fn(Spank, *const c_char, *const c_char, c_int) -> c_int;
type UnsetenvFn = unsafe extern "C" fn(Spank, *const c_char) -> c_int;
type OptionRegisterFn = unsafe extern "C" fn(Spank, *mut SpankOption) -> c_int;
pub type LogFn = unsafe extern "C" fn(*const c_char, ...);

/// The SPANK calls this plugin makes
#[derive(Clone, Copy)]
pub struct SpankApi {
    pub get_item: GetItemFn,
    pub context: ContextFn,
    pub setenv: SetenvFn,
    pub unsetenv: UnsetenvFn,
    pub option_register: OptionRegisterFn,
}

/// The host's logging functions
#[derive(Clone, Copy)]
pub struct LogApi {
    pub error: LogFn,
    pub info: LogFn,
    pub verbose: LogFn,
    pub debug: LogFn,
}

fn lookup(name: &CStr) -> Option<*mut c_void> {
    // SAFETY: dlsym only reads the NUL terminated name.
    let symbol = unsafe { libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr()) };
    (!symbol.is_null()).then_some(symbol)
}

macro_rules! resolve {
    ($name:literal as $ty:ty) => {
        match lookup($name) {
            // SAFETY: the symbol is the host function with this signature.
            Some(symbol) => unsafe { std::mem::transmute::<*mut c_void, $ty>(symbol) },
            None => return None,
        }
    };
}

impl SpankApi {
    fn resolve() -> Option<Self> {
        Some(Self {
            get_item: resolve!(c"spank_get_item" as GetItemFn),
            context: resolve!(c"spank_context" as ContextFn),
            setenv: resolve!(c"spank_setenv" as SetenvFn),
            unsetenv: resolve!(c"spank_unsetenv" as UnsetenvFn),
            option_register: resolve!(c"spank_option_register" as OptionRegisterFn),
        })
    }
}

impl LogApi {
    fn resolve() -> Option<Self> {
        Some(Self {
            error: resolve!(c"slurm_error" as LogFn),
            info: resolve!(c"slurm_info" as LogFn),
            verbose: resolve!(c"slurm_verbose" as LogFn),
            debug: resolve!(c"slurm_debug" as LogFn),
        })
    }
}

/// SPANK entry points, or `None` outside a Slurm process
pub fn spank_api() -> Option<&'static SpankApi> {
    static API: OnceLock<Option<SpankApi>> = OnceLock::new();
    API.get_or_init(SpankApi::resolve).as_ref()
}

/// Slurm logging entry points, or `None` outside a Slurm process
pub fn log_api() -> Option<&'static LogApi> {
    static API: OnceLock<Option<LogApi>> = OnceLock::new();
    API.get_or_init(LogApi::resolve).as_ref()
}
