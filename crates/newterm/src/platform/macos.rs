//! macOS scripting bridge built on `osascript` and `open`.

use super::traits::ScriptingBridge;
use crate::error::{NewtermError, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs AppleScript through `osascript`, reading the script from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Osascript;

impl ScriptingBridge for Osascript {
    fn run(&self, script: &str) -> Result<String> {
        debug!("Running AppleScript:\n{}", script);

        let mut child = Command::new("osascript")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| NewtermError::io("starting osascript", e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(script.as_bytes())
                .map_err(|e| NewtermError::io("writing AppleScript", e))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| NewtermError::io("waiting for osascript", e))?;
        if !output.status.success() {
            return Err(NewtermError::platform(
                "running AppleScript",
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn open_with_application(&self, path: &str, application: &str) -> Result<()> {
        let output = Command::new("open")
            .arg("-a")
            .arg(application)
            .arg(path)
            .output()
            .map_err(|e| NewtermError::io("starting open", e))?;

        if !output.status.success() {
            return Err(NewtermError::platform(
                format!("opening {} with {}", path, application),
                String::from_utf8_lossy(&output.stderr),
            ));
        }
        Ok(())
    }
}
