// ============================================================================
// File: src/plugin/tests.rs
// ----------------------------------------------------------------------------
// Hook-level scenarios against a fake scheduler and an in-memory node
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::PluginConfig;
use crate::controller::ReleaseOutcome;
use crate::error::{ErrorKind, RamdiskError, RamdiskResult};
use crate::escalation::NodeDrainer;
use crate::host::{Context, OptionSpec, RAMDISK_ENV, RAMDISK_OPTION, SpankHost};
use crate::platform::{PathState, RamdiskPlatform, TmpfsOptions};
use crate::size::RequestedCapacity;
use crate::step::{BATCH_SCRIPT, PENDING_STEP};

use super::RamdiskPlugin;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct FakeHost {
    context: Context,
    job_id: Option<u32>,
    step_id: Option<u32>,
    alloc_mem: Option<u64>,
    uid: Option<u32>,
    gid: Option<u32>,
    env: HashMap<String, String>,
    options: Vec<OptionSpec>,
}

impl FakeHost {
    fn remote(job_id: u32, step_id: u32, alloc_mem: u64) -> Self {
        Self {
            context: Context::Remote,
            job_id: Some(job_id),
            step_id: Some(step_id),
            alloc_mem: Some(alloc_mem),
            uid: Some(1000),
            gid: Some(100),
            env: HashMap::new(),
            options: Vec::new(),
        }
    }

    fn in_context(context: Context) -> Self {
        Self {
            context,
            ..Self::remote(100, 0, 4096)
        }
    }

    fn ramdisk_env(&self) -> Option<&str> {
        self.env.get(RAMDISK_ENV).map(String::as_str)
    }
}

fn item<T: Copy>(value: Option<T>, item: &'static str) -> RamdiskResult<T> {
    value.ok_or(RamdiskError::Metadata { item })
}

impl SpankHost for FakeHost {
    fn context(&self) -> Context {
        self.context
    }

    fn job_id(&self) -> RamdiskResult<u32> {
        item(self.job_id, "job ID")
    }

    fn step_id(&self) -> RamdiskResult<u32> {
        item(self.step_id, "job step ID")
    }

    fn step_alloc_mem(&self) -> RamdiskResult<u64> {
        item(self.alloc_mem, "step memory allocation")
    }

    fn job_uid(&self) -> RamdiskResult<u32> {
        item(self.uid, "job UID")
    }

    fn job_gid(&self) -> RamdiskResult<u32> {
        item(self.gid, "job GID")
    }

    fn setenv(&mut self, name: &str, value: &str) -> RamdiskResult<()> {
        self.env.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn unsetenv(&mut self, name: &str) -> RamdiskResult<()> {
        self.env.remove(name);
        Ok(())
    }

    fn register_option(&mut self, option: &OptionSpec) -> RamdiskResult<()> {
        self.options.push(*option);
        Ok(())
    }
}

/// In-memory compute node: directories and tmpfs mounts keyed by path
#[derive(Default)]
struct FakeNode {
    dirs: RefCell<HashMap<PathBuf, PathState>>,
    mounts: RefCell<HashMap<PathBuf, TmpfsOptions>>,
    mount_calls: Cell<usize>,
    busy: Cell<bool>,
}

impl FakeNode {
    fn state(&self, path: &str) -> PathState {
        (&self).probe(Path::new(path))
    }

    fn mount_at(&self, path: &str) -> Option<TmpfsOptions> {
        self.mounts.borrow().get(Path::new(path)).copied()
    }
}

impl RamdiskPlatform for &FakeNode {
    fn probe(&self, path: &Path) -> PathState {
        self.dirs
            .borrow()
            .get(path)
            .copied()
            .unwrap_or(PathState::Missing)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        self.dirs
            .borrow_mut()
            .insert(path.to_path_buf(), PathState::Directory);
        Ok(())
    }

    fn mount_tmpfs(&self, path: &Path, options: &TmpfsOptions) -> io::Result<()> {
        self.mount_calls.set(self.mount_calls.get() + 1);
        self.mounts.borrow_mut().insert(path.to_path_buf(), *options);
        Ok(())
    }

    fn unmount(&self, path: &Path) -> io::Result<()> {
        if self.busy.get() {
            return Err(io::Error::from_raw_os_error(16));
        }
        self.mounts
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::from_raw_os_error(22))
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.dirs.borrow_mut().remove(path);
        Ok(())
    }

    fn is_mount_point(&self, path: &Path) -> io::Result<bool> {
        Ok(self.mounts.borrow().contains_key(path))
    }
}

#[derive(Default)]
struct CountingDrainer {
    reasons: RefCell<Vec<String>>,
}

impl NodeDrainer for &CountingDrainer {
    fn drain(&self, reason: &str) -> io::Result<()> {
        self.reasons.borrow_mut().push(reason.to_string());
        Ok(())
    }
}

fn plugin<'a>(
    node: &'a FakeNode,
    drainer: &'a CountingDrainer,
) -> RamdiskPlugin<&'a FakeNode, &'a CountingDrainer> {
    init_logging();
    RamdiskPlugin::new(&PluginConfig::default(), node, drainer)
}

#[test]
fn init_registers_the_option() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let mut host = FakeHost::in_context(Context::Local);

    plugin(&node, &drainer).init(&mut host).unwrap();

    assert_eq!(host.options, vec![RAMDISK_OPTION]);
}

#[test]
fn scenario_a_two_gigabytes_on_a_four_gigabyte_step() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let mut host = FakeHost::remote(100, 0, 4096);

    let requested = plugin.parse_option("2G").unwrap();
    assert_eq!(requested.as_raw(), 2048);

    let path = plugin.init_post_opt(&mut host, requested).unwrap();

    assert_eq!(path, Some(PathBuf::from("/ramdisks/100.0.ramdisk")));
    assert_eq!(host.ramdisk_env(), Some("/ramdisks/100.0.ramdisk"));
    assert_eq!(node.state("/ramdisks/100.0.ramdisk"), PathState::Directory);
    let mount = node.mount_at("/ramdisks/100.0.ramdisk").unwrap();
    assert_eq!(mount.size.get(), 2048);
    assert_eq!(mount.uid, 1000);
    assert_eq!(mount.gid, Some(100));
    assert_eq!(mount.mode, 0o700);
}

#[test]
fn scenario_b_zero_size_is_rejected_and_later_hooks_skip() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let mut host = FakeHost::remote(100, 0, 4096);

    let err = plugin.parse_option("0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let requested = RequestedCapacity::NOT_REQUESTED;
    assert_eq!(plugin.init_post_opt(&mut host, requested).unwrap(), None);
    assert_eq!(plugin.exit(&mut host, requested).unwrap(), None);
    assert_eq!(node.mount_calls.get(), 0);
    assert!(host.ramdisk_env().is_none());
}

#[test]
fn scenario_c_oversized_request_creates_nothing() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let mut host = FakeHost::remote(100, 0, 4096);

    let requested = plugin.parse_option("8G").unwrap();
    let err = plugin.init_post_opt(&mut host, requested).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CapacityExceedsAllocation);
    assert_eq!(node.state("/ramdisks/100.0.ramdisk"), PathState::Missing);
    assert!(host.ramdisk_env().is_none());
}

#[test]
fn scenario_d_existing_mount_is_reused() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let requested = plugin.parse_option("1G").unwrap();

    let mut first = FakeHost::remote(100, 0, 4096);
    plugin.init_post_opt(&mut first, requested).unwrap();
    assert_eq!(node.mount_calls.get(), 1);

    let mut retry = FakeHost::remote(100, 0, 4096);
    let path = plugin.init_post_opt(&mut retry, requested).unwrap();

    assert_eq!(path, Some(PathBuf::from("/ramdisks/100.0.ramdisk")));
    assert_eq!(node.mount_calls.get(), 1);
    assert_eq!(retry.ramdisk_env(), Some("/ramdisks/100.0.ramdisk"));
}

#[test]
fn scenario_e_busy_unmount_drains_once_and_keeps_directory() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let mut host = FakeHost::remote(100, 0, 4096);
    let requested = plugin.parse_option("512").unwrap();
    plugin.init_post_opt(&mut host, requested).unwrap();

    node.busy.set(true);
    let err = plugin.exit(&mut host, requested).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnmountFailed);
    assert_eq!(drainer.reasons.borrow().len(), 1);
    assert_eq!(node.state("/ramdisks/100.0.ramdisk"), PathState::Directory);
}

#[test]
fn full_lifecycle_then_repeated_exit() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let mut host = FakeHost::remote(7, BATCH_SCRIPT, 8192);
    let requested = plugin.parse_option("1024M").unwrap();

    let path = plugin.init_post_opt(&mut host, requested).unwrap().unwrap();
    assert_eq!(path, PathBuf::from("/ramdisks/7.batch.ramdisk"));

    assert_eq!(plugin.exit(&mut host, requested).unwrap(), Some(ReleaseOutcome::Released));
    assert_eq!(
        plugin.exit(&mut host, requested).unwrap(),
        Some(ReleaseOutcome::AlreadyReleased)
    );
    assert!(node.mounts.borrow().is_empty());
    assert_eq!(node.state("/ramdisks/7.batch.ramdisk"), PathState::Missing);
    assert!(drainer.reasons.borrow().is_empty());
}

#[test]
fn non_remote_contexts_never_touch_the_node() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let requested = plugin.parse_option("1G").unwrap();

    for context in [Context::Local, Context::Allocator, Context::Slurmd, Context::JobScript] {
        let mut host = FakeHost::in_context(context);
        assert_eq!(plugin.init_post_opt(&mut host, requested).unwrap(), None);
        assert_eq!(plugin.exit(&mut host, requested).unwrap(), None);
        assert!(host.ramdisk_env().is_none());
    }
    assert_eq!(node.mount_calls.get(), 0);
}

#[test]
fn missing_group_falls_back_to_no_group() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let mut host = FakeHost {
        gid: None,
        ..FakeHost::remote(100, 0, 4096)
    };
    let requested = plugin.parse_option("100").unwrap();

    plugin.init_post_opt(&mut host, requested).unwrap();

    let mount = node.mount_at("/ramdisks/100.0.ramdisk").unwrap();
    assert_eq!(mount.gid, None);
    assert_eq!(mount.data(), "size=100M,uid=1000,mode=700");
}

#[test]
fn missing_metadata_aborts_before_the_filesystem() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let requested = plugin.parse_option("100").unwrap();

    let hosts = [
        FakeHost {
            job_id: None,
            ..FakeHost::remote(100, 0, 4096)
        },
        FakeHost {
            step_id: None,
            ..FakeHost::remote(100, 0, 4096)
        },
        FakeHost {
            alloc_mem: None,
            ..FakeHost::remote(100, 0, 4096)
        },
        FakeHost {
            uid: None,
            ..FakeHost::remote(100, 0, 4096)
        },
    ];
    for mut host in hosts {
        let err = plugin.init_post_opt(&mut host, requested).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Metadata);
    }
    assert!(node.dirs.borrow().is_empty());
}

#[test]
fn pending_step_is_rejected_at_both_hooks() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let mut host = FakeHost::remote(100, PENDING_STEP, 4096);
    let requested = plugin.parse_option("100").unwrap();

    let err = plugin.init_post_opt(&mut host, requested).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = plugin.exit(&mut host, requested).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn stale_variable_is_cleared_when_creation_fails() {
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let plugin = plugin(&node, &drainer);
    let mut host = FakeHost::remote(100, 1, 1024);
    host.env
        .insert(RAMDISK_ENV.to_string(), "/ramdisks/100.batch.ramdisk".to_string());
    let requested = plugin.parse_option("1G").unwrap();

    assert!(plugin.init_post_opt(&mut host, requested).is_err());
    assert!(host.ramdisk_env().is_none());
}

#[test]
fn configured_root_is_used_for_paths() {
    init_logging();
    let node = FakeNode::default();
    let drainer = CountingDrainer::default();
    let config = PluginConfig::default().with_root("/dev/shm/ramdisks");
    let plugin = RamdiskPlugin::new(&config, &node, &drainer);
    let mut host = FakeHost::remote(3, 2, 4096);
    let requested = plugin.parse_option("64").unwrap();

    plugin.init_post_opt(&mut host, requested).unwrap();

    assert_eq!(host.ramdisk_env(), Some("/dev/shm/ramdisks/3.2.ramdisk"));
    assert!(plugin.paths().root().ends_with("ramdisks"));
}
