// Streaming helper process supervision
//
// Owns the external muselsl-style process for the lifetime of one session:
// path validation before spawn, concurrent draining of both diagnostic
// pipes into the log, and idempotent termination on every exit path.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::types::StartupError;

const GRACEFUL_EXIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Supervised handle to the external streaming helper process.
///
/// The helper is invoked with the fixed `stream` argument and inherits the
/// caller's environment. Its stdout/stderr are diagnostics only; they are
/// drained line-by-line into the log and never parsed for control signals.
pub struct StreamHelper {
    child: Option<Child>,
    path: PathBuf,
}

impl StreamHelper {
    /// Validate the helper path and spawn the process.
    ///
    /// A bare file name is resolved on PATH; an explicit path must exist
    /// and be executable. Nothing is spawned when validation fails.
    pub fn spawn(helper_path: &Path) -> Result<Self, StartupError> {
        let path = Self::validate(helper_path)?;

        let mut child = Command::new(&path)
            .arg("stream")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(StartupError::Spawn)?;

        info!("started streaming helper: {} stream", path.display());

        // One drain task per pipe; each ends on its own at EOF
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[helper] {}", line.trim_end());
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("[helper] {}", line.trim_end());
                }
            });
        }

        Ok(Self {
            child: Some(child),
            path,
        })
    }

    fn validate(helper_path: &Path) -> Result<PathBuf, StartupError> {
        // Bare names come from PATH, explicit paths are checked in place
        if helper_path.components().count() == 1 && !helper_path.is_absolute() {
            return which::which(helper_path)
                .map_err(|_| StartupError::NotFound(helper_path.to_path_buf()));
        }

        if !helper_path.exists() {
            return Err(StartupError::NotFound(helper_path.to_path_buf()));
        }
        if !is_executable(helper_path) {
            return Err(StartupError::NotExecutable(helper_path.to_path_buf()));
        }
        Ok(helper_path.to_path_buf())
    }

    /// Path the helper was actually spawned from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True while the helper has not been observed to exit.
    pub fn is_running(&mut self) -> bool {
        match self.child {
            Some(ref mut child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Stop the helper: graceful stop request, bounded wait, then kill.
    ///
    /// Idempotent; calling this after the process already exited, or a
    /// second time, is a no-op.
    pub async fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Ok(Some(status)) = child.try_wait() {
            debug!("streaming helper already exited: {}", status);
            return;
        }

        info!("stopping streaming helper");

        #[cfg(unix)]
        if let Some(pid) = child.id() {
            unsafe {
                libc::kill(pid as i32, libc::SIGTERM);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = child.start_kill();
        }

        match tokio::time::timeout(GRACEFUL_EXIT_TIMEOUT, child.wait()).await {
            Ok(_) => info!("streaming helper exited gracefully"),
            Err(_) => {
                warn!("streaming helper did not exit gracefully, killing");
                child.kill().await.ok();
            }
        }
    }
}

impl Drop for StreamHelper {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            #[cfg(unix)]
            if let Some(pid) = child.id() {
                unsafe {
                    libc::kill(pid as i32, libc::SIGTERM);
                }
            }
            // kill_on_drop(true) handles the final cleanup
            let _ = child.start_kill();
        }
    }
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
