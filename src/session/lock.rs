//! Profile lock reconciliation.
//!
//! Chromium leaves its singleton lock artifacts behind after an abrupt kill
//! (SIGKILL, container eviction), and the next launch against the profile then
//! fails. Before every session open we decide whether the artifacts belong to
//! a live process or a dead one, and remove them only in the latter case.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::Error;

/// Grace window before an unowned lock artifact is considered stale.
const STALE_GRACE: Duration = Duration::from_secs(120);

/// Singleton artifacts Chromium writes into the profile root. On Linux the
/// lock is a dangling symlink encoding `hostname-pid`, so metadata reads must
/// not follow it.
const LOCK_ARTIFACTS: &[&str] = &["SingletonLock", "SingletonSocket", "SingletonCookie"];

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No lock artifacts present.
    Clean,
    /// The profile is (or may still be) owned: a live process was found, or
    /// the artifacts are younger than the grace window and ownership could
    /// not be ruled out.
    HeldLive { pid: Option<u32> },
    /// Artifacts existed with no live owner and were removed.
    HeldStale,
}

/// Decides whether some process currently uses a profile directory.
///
/// Injectable so the reconciliation policy is testable without real browser
/// processes.
pub trait ProcessProbe {
    /// Pid of a live process using `profile_dir`, if any.
    fn owner_of(&self, profile_dir: &Path) -> Option<u32>;
}

impl<F> ProcessProbe for F
where
    F: Fn(&Path) -> Option<u32>,
{
    fn owner_of(&self, profile_dir: &Path) -> Option<u32> {
        self(profile_dir)
    }
}

/// Production probe: scans process command lines for the profile's
/// `--user-data-dir` marker.
pub struct SysinfoProbe;

impl ProcessProbe for SysinfoProbe {
    fn owner_of(&self, profile_dir: &Path) -> Option<u32> {
        use sysinfo::System;

        let marker = format!("--user-data-dir={}", profile_dir.display());
        let mut sys = System::new();
        sys.refresh_processes(sysinfo::ProcessesToUpdate::All, true);

        for (pid, process) in sys.processes() {
            let cmd_line = process
                .cmd()
                .iter()
                .map(|part| part.to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join(" ");
            if cmd_line.contains(&marker) {
                return Some(pid.as_u32());
            }
        }
        None
    }
}

/// Reconciles profile lock artifacts before a session launch.
pub struct LockReconciler<P> {
    probe: P,
    grace: Duration,
}

impl LockReconciler<SysinfoProbe> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            probe: SysinfoProbe,
            grace: STALE_GRACE,
        }
    }
}

impl Default for LockReconciler<SysinfoProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ProcessProbe> LockReconciler<P> {
    /// Build a reconciler around a custom liveness probe.
    pub fn with_probe(probe: P) -> Self {
        Self {
            probe,
            grace: STALE_GRACE,
        }
    }

    /// Override the staleness grace window.
    #[must_use]
    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Inspect the profile directory and remove orphaned lock artifacts.
    ///
    /// Idempotent: a second pass over the same directory returns `Clean`.
    /// The caller decides what `HeldLive` means (the Session Manager raises
    /// `SessionBusy`); this layer never waits for the owner to go away.
    pub fn reconcile(&self, profile_dir: &Path) -> Result<LockState, Error> {
        let artifacts = existing_artifacts(profile_dir);
        if artifacts.is_empty() {
            return Ok(LockState::Clean);
        }

        if let Some(pid) = self.probe.owner_of(profile_dir) {
            tracing::debug!(pid, "Profile lock is owned by a live process");
            return Ok(LockState::HeldLive { pid: Some(pid) });
        }

        // No live owner found. A freshly written lock may belong to a browser
        // that has not finished starting, so respect the grace window.
        if newest_age(&artifacts) < self.grace {
            tracing::debug!("Profile lock is recent with no visible owner, leaving it alone");
            return Ok(LockState::HeldLive { pid: None });
        }

        for path in &artifacts {
            std::fs::remove_file(path).map_err(|e| {
                Error::SessionLaunch(format!(
                    "failed to remove stale lock artifact {}: {e}",
                    path.display()
                ))
            })?;
            tracing::info!(path = %path.display(), "Removed stale lock artifact");
        }

        Ok(LockState::HeldStale)
    }
}

fn existing_artifacts(profile_dir: &Path) -> Vec<PathBuf> {
    LOCK_ARTIFACTS
        .iter()
        .map(|name| profile_dir.join(name))
        .filter(|path| std::fs::symlink_metadata(path).is_ok())
        .collect()
}

/// Age of the most recently touched artifact. Unreadable timestamps count as
/// ancient so an undecidable lock is eventually cleared.
fn newest_age(artifacts: &[PathBuf]) -> Duration {
    artifacts
        .iter()
        .filter_map(|path| {
            let modified = std::fs::symlink_metadata(path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            SystemTime::now().duration_since(modified).ok()
        })
        .min()
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch_lock(dir: &Path) -> PathBuf {
        let path = dir.join("SingletonLock");
        std::fs::write(&path, "host-12345").unwrap();
        path
    }

    #[test]
    fn test_clean_directory_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = LockReconciler::with_probe(|_: &Path| None);

        assert_eq!(reconciler.reconcile(dir.path()).unwrap(), LockState::Clean);
        // Idempotent on an already-clean directory.
        assert_eq!(reconciler.reconcile(dir.path()).unwrap(), LockState::Clean);
    }

    #[test]
    fn test_live_owner_is_never_removed() {
        let dir = tempfile::tempdir().unwrap();
        let lock = touch_lock(dir.path());
        let reconciler =
            LockReconciler::with_probe(|_: &Path| Some(4242)).grace(Duration::ZERO);

        assert_eq!(
            reconciler.reconcile(dir.path()).unwrap(),
            LockState::HeldLive { pid: Some(4242) }
        );
        assert!(lock.exists());
    }

    #[test]
    fn test_stale_lock_is_removed_then_clean() {
        let dir = tempfile::tempdir().unwrap();
        let lock = touch_lock(dir.path());
        let reconciler = LockReconciler::with_probe(|_: &Path| None).grace(Duration::ZERO);

        assert_eq!(
            reconciler.reconcile(dir.path()).unwrap(),
            LockState::HeldStale
        );
        assert!(!lock.exists());

        // Second run sees the directory as clean: same state after run two
        // as after run one.
        assert_eq!(reconciler.reconcile(dir.path()).unwrap(), LockState::Clean);
    }

    #[test]
    fn test_fresh_unowned_lock_is_left_within_grace() {
        let dir = tempfile::tempdir().unwrap();
        let lock = touch_lock(dir.path());
        let reconciler =
            LockReconciler::with_probe(|_: &Path| None).grace(Duration::from_secs(3600));

        assert_eq!(
            reconciler.reconcile(dir.path()).unwrap(),
            LockState::HeldLive { pid: None }
        );
        assert!(lock.exists());
    }

    #[test]
    fn test_all_artifacts_are_cleared() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["SingletonLock", "SingletonSocket", "SingletonCookie"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let reconciler = LockReconciler::with_probe(|_: &Path| None).grace(Duration::ZERO);

        assert_eq!(
            reconciler.reconcile(dir.path()).unwrap(),
            LockState::HeldStale
        );
        for name in ["SingletonLock", "SingletonSocket", "SingletonCookie"] {
            assert!(!dir.path().join(name).exists());
        }
    }
}
