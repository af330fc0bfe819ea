//! The atop subprocess feeding the collector.

use parking_lot::Mutex;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{CollectorError, Result};

/// Categories requested from atop
pub const CATEGORIES: &str = "CPU,CPL,MEM,DSK";

const WAIT_POLL: Duration = Duration::from_millis(100);

/// A running `atop -P` process
pub struct AtopProducer {
    child: Arc<Mutex<Child>>,
    stdout: Option<ChildStdout>,
}

/// Terminates the producer from another thread (e.g. a signal handler)
#[derive(Clone)]
pub struct KillHandle(Arc<Mutex<Child>>);

impl KillHandle {
    pub fn kill(&self) {
        let mut child = self.0.lock();
        if let Err(e) = child.kill() {
            log::debug!("atop already stopped: {}", e);
        }
    }
}

impl AtopProducer {
    /// Resolve the atop binary, preferring an explicitly configured path
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) if path.is_file() => Ok(path.to_path_buf()),
            Some(path) => Err(CollectorError::producer(format!(
                "atop binary not found at {}",
                path.display()
            ))),
            None => which::which("atop")
                .map_err(|e| CollectorError::producer(format!("atop not found in PATH: {}", e))),
        }
    }

    /// Build the atop invocation for the given sampling interval
    pub fn command(binary: &Path, interval_secs: u64) -> Command {
        let mut cmd = Command::new(binary);
        cmd.arg("-P")
            .arg(CATEGORIES)
            .arg(interval_secs.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        cmd
    }

    pub fn spawn(binary: &Path, interval_secs: u64) -> Result<Self> {
        let mut child = Self::command(binary, interval_secs)
            .spawn()
            .map_err(|e| {
                CollectorError::producer(format!("Failed to start {}: {}", binary.display(), e))
            })?;
        let stdout = child.stdout.take();

        log::info!(
            "Started {} -P {} {} (pid {})",
            binary.display(),
            CATEGORIES,
            interval_secs,
            child.id()
        );

        Ok(Self::from_child(child, stdout))
    }

    fn from_child(child: Child, stdout: Option<ChildStdout>) -> Self {
        Self {
            child: Arc::new(Mutex::new(child)),
            stdout,
        }
    }

    /// Take the line reader over atop's stdout. Can only be taken once.
    pub fn take_reader(&mut self) -> Result<BufReader<ChildStdout>> {
        self.stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| CollectorError::producer("atop stdout already taken"))
    }

    pub fn kill_handle(&self) -> KillHandle {
        KillHandle(Arc::clone(&self.child))
    }

    /// Reap the process and report how it ended.
    ///
    /// The lock is only held while polling, so a [`KillHandle`] can still
    /// stop the process while this waits.
    pub fn wait(self) -> Result<ExitStatus> {
        let status = loop {
            if let Some(status) = self.child.lock().try_wait()? {
                break status;
            }
            thread::sleep(WAIT_POLL);
        };
        if status.success() {
            log::info!("atop exited");
        } else {
            log::warn!("atop exited with {}", status);
        }
        Ok(status)
    }
}
