//! Unix process adapters.
//!
//! Terminals are started in a new session so they outlive the editor that
//! launched them. A reaper thread waits on each child so none is left as a
//! zombie while the parent keeps running.

#![allow(unsafe_code)]

use super::traits::{ProcessLister, ProcessSpawner, SpawnSpec};
use crate::config::ProcessListConfig;
use crate::error::{NewtermError, Result};
use std::os::unix::process::CommandExt;
use std::process::Command;
use std::thread;
use tracing::{debug, warn};

/// Spawns detached processes with `setsid`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedSpawner;

impl ProcessSpawner for DetachedSpawner {
    fn spawn(&self, spec: &SpawnSpec) -> Result<u32> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.working_directory)
            .env_clear()
            .envs(&spec.environment.vars);

        // SAFETY: setsid() is async-signal-safe and only touches the child
        // between fork and exec. The child becomes a session leader with no
        // controlling terminal.
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| NewtermError::platform(format!("starting {}", spec.program), e.to_string()))?;
        let pid = child.id();

        let program = spec.program.clone();
        let reaper = thread::Builder::new()
            .name(format!("reap-{pid}"))
            .spawn(move || match child.wait() {
                Ok(status) => debug!("{} (pid {}) exited with {}", program, pid, status),
                Err(e) => warn!("Failed to wait for {} (pid {}): {}", program, pid, e),
            });
        if let Err(e) = reaper {
            warn!("Could not start reaper thread for pid {}: {}", pid, e);
        }

        Ok(pid)
    }
}

/// Lists process command names with `ps -eo comm`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PsProcessLister;

impl ProcessLister for PsProcessLister {
    fn command_names(&self) -> Result<Vec<String>> {
        let output = Command::new(ProcessListConfig::PS_PROGRAM)
            .args(ProcessListConfig::PS_ARGS)
            .output()
            .map_err(|e| NewtermError::io("running ps", e))?;

        // Any diagnostic output means the listing cannot be trusted.
        if !output.stderr.is_empty() {
            return Err(NewtermError::platform(
                "listing processes",
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }
}
