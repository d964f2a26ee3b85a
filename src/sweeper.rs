//! Background retention sweep
//!
//! Periodically deletes stored files whose modification time is older than
//! the retention window. The loop parks on a timer raced against a stop
//! channel, so stopping never waits out a full interval.

use crate::constants::SWEEPER_STOP_GRACE_SECS;
use crate::error::Result;
use crate::storage::Storage;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_age: Duration,
    pub interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    Idle,
    Running,
}

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Deletes regular files directly inside `dir` older than `max_age`.
///
/// Fails only if the directory itself cannot be read; per-file problems are
/// logged and counted in `failed`. A modification time in the future counts
/// as age zero.
pub fn sweep_expired(dir: &Path, max_age: Duration, now: SystemTime) -> Result<SweepReport> {
    let mut report = SweepReport::default();
    let mut entries = WalkDir::new(dir).min_depth(1).max_depth(1).into_iter();

    // surface an unreadable root as an error rather than a per-file failure
    let first = match entries.next() {
        None => return Ok(report),
        Some(Err(e)) if e.depth() == 0 => return Err(e.into()),
        Some(entry) => entry,
    };

    for entry in std::iter::once(first).chain(entries) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read storage entry");
                report.failed += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        report.scanned += 1;

        let modified = match entry.metadata().map_err(std::io::Error::from).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "failed to read modification time");
                report.failed += 1;
                continue;
            }
        };

        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age <= max_age {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::debug!(path = %entry.path().display(), age_secs = age.as_secs(), "removed expired file");
                report.removed += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(path = %entry.path().display(), error = %e, "failed to remove expired file");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

struct Worker {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Start/stop handle for the background sweep task.
///
/// Dropping the sweeper closes the stop channel, which also ends the task.
pub struct RetentionSweeper {
    storage: Storage,
    policy: RetentionPolicy,
    worker: Mutex<Option<Worker>>,
}

impl RetentionSweeper {
    pub fn new(storage: Storage, policy: RetentionPolicy) -> Self {
        Self {
            storage,
            policy,
            worker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SweeperState {
        match self.worker().as_ref() {
            Some(worker) if !worker.handle.is_finished() => SweeperState::Running,
            _ => SweeperState::Idle,
        }
    }

    /// Spawns the sweep task. Returns `false` if it was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut worker = self.worker();
        if matches!(worker.as_ref(), Some(w) if !w.handle.is_finished()) {
            return false;
        }

        let (stop, stop_rx) = oneshot::channel();
        let dir = self.storage.root().to_path_buf();
        let handle = tokio::spawn(run_sweeps(dir, self.policy, stop_rx));
        *worker = Some(Worker { stop, handle });

        tracing::info!(
            retention_secs = self.policy.max_age.as_secs(),
            interval_secs = self.policy.interval.as_secs(),
            "retention sweeper started"
        );
        true
    }

    /// Signals the task and waits for it, aborting after a bounded grace
    /// period. Returns `false` if nothing was running.
    pub async fn stop(&self) -> bool {
        let worker = self.worker().take();
        let Some(Worker { stop, mut handle }) = worker else {
            return false;
        };

        // the task may already be gone, in which case the send fails harmlessly
        let _ = stop.send(());

        let grace = Duration::from_secs(SWEEPER_STOP_GRACE_SECS);
        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(())) => tracing::info!("retention sweeper stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "retention sweeper task failed"),
            Err(_) => {
                tracing::warn!(grace_secs = grace.as_secs(), "retention sweeper did not stop in time, aborting");
                handle.abort();
            }
        }
        true
    }

    fn worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_sweeps(dir: PathBuf, policy: RetentionPolicy, mut stop: oneshot::Receiver<()>) {
    loop {
        let sweep_dir = dir.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            sweep_expired(&sweep_dir, policy.max_age, SystemTime::now())
        })
        .await;

        match outcome {
            Ok(Ok(report)) if report.removed > 0 || report.failed > 0 => {
                tracing::info!(
                    scanned = report.scanned,
                    removed = report.removed,
                    failed = report.failed,
                    "retention sweep finished"
                );
            }
            Ok(Ok(report)) => tracing::debug!(scanned = report.scanned, "retention sweep found nothing to remove"),
            Ok(Err(e)) => tracing::error!(dir = %dir.display(), error = %e, "retention sweep failed"),
            Err(e) => tracing::error!(error = %e, "retention sweep task panicked"),
        }

        tokio::select! {
            _ = tokio::time::sleep(policy.interval) => {}
            _ = &mut stop => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn age_file(path: &Path, age: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    fn policy(max_age: Duration, interval: Duration) -> RetentionPolicy {
        RetentionPolicy { max_age, interval }
    }

    #[test]
    fn test_sweep_removes_only_expired_files() {
        let temp_dir = TempDir::new().unwrap();
        let old = temp_dir.path().join("old_compressed.jpg");
        let fresh = temp_dir.path().join("fresh_compressed.jpg");
        fs::write(&old, b"old").unwrap();
        fs::write(&fresh, b"fresh").unwrap();
        age_file(&old, Duration::from_secs(3600));

        let report = sweep_expired(temp_dir.path(), Duration::from_secs(60), SystemTime::now()).unwrap();

        assert_eq!(report, SweepReport { scanned: 2, removed: 1, failed: 0 });
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn test_sweep_ignores_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        let inner = nested.join("inner.jpg");
        fs::write(&inner, b"x").unwrap();
        age_file(&inner, Duration::from_secs(3600));

        let report = sweep_expired(temp_dir.path(), Duration::from_secs(1), SystemTime::now()).unwrap();
        assert_eq!(report.scanned, 0);
        assert!(inner.exists());
    }

    #[test]
    fn test_sweep_future_mtime_is_retained() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("future.jpg");
        fs::write(&file, b"x").unwrap();

        let past = SystemTime::now() - Duration::from_secs(3600);
        let report = sweep_expired(temp_dir.path(), Duration::ZERO, past).unwrap();
        assert_eq!(report.removed, 0);
        assert!(file.exists());
    }

    #[test]
    fn test_sweep_missing_directory_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = sweep_expired(&temp_dir.path().join("nope"), Duration::ZERO, SystemTime::now());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open(temp_dir.path()).unwrap();
        let sweeper = RetentionSweeper::new(
            storage,
            policy(Duration::from_secs(60), Duration::from_secs(3600)),
        );

        assert_eq!(sweeper.state(), SweeperState::Idle);
        assert!(!sweeper.stop().await);

        assert!(sweeper.start());
        assert!(!sweeper.start());
        assert_eq!(sweeper.state(), SweeperState::Running);

        assert!(sweeper.stop().await);
        assert!(!sweeper.stop().await);
        assert_eq!(sweeper.state(), SweeperState::Idle);

        // restartable after a stop
        assert!(sweeper.start());
        assert!(sweeper.stop().await);
    }

    #[tokio::test]
    async fn test_stop_wakes_sleeping_task() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open(temp_dir.path()).unwrap();
        let sweeper = RetentionSweeper::new(
            storage,
            policy(Duration::from_secs(60), Duration::from_secs(24 * 3600)),
        );

        sweeper.start();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let stopped = tokio::time::timeout(Duration::from_secs(2), sweeper.stop()).await;
        assert_eq!(stopped.ok(), Some(true));
    }

    #[tokio::test]
    async fn test_first_cycle_removes_expired_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open(temp_dir.path()).unwrap();
        let old = temp_dir.path().join("old_compressed.png");
        let fresh = temp_dir.path().join("fresh_compressed.png");
        fs::write(&old, b"old").unwrap();
        fs::write(&fresh, b"fresh").unwrap();
        age_file(&old, Duration::from_secs(7200));

        let sweeper = RetentionSweeper::new(
            storage,
            policy(Duration::from_secs(3600), Duration::from_secs(3600)),
        );
        sweeper.start();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while old.exists() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        sweeper.stop().await;

        assert!(!old.exists());
        assert!(fresh.exists());
    }
}
