//! Command implementations. Each returns the JSON document to print.

use anyhow::{bail, Context, Result};
use newterm::validate::text_from_os;
use newterm::{EnvironmentOverlay, LaunchRequest, Launcher, TitleFixupOutcome};
use serde_json::{json, Value};
use shellenv::EnvironmentForm;
use std::path::Path;
use tracing::{info, warn};

/// Build a launch request from command line arguments.
pub fn launch_request(
    cwd: &Path,
    terminal: Option<String>,
    env: &[String],
    unset: &[String],
    width: Option<u32>,
    tabs: bool,
    args: Vec<String>,
) -> Result<LaunchRequest> {
    let cwd = text_from_os(cwd.as_os_str(), "cwd")?;

    let mut overlay = EnvironmentOverlay::new();
    for assignment in env {
        let Some((name, value)) = assignment.split_once('=') else {
            bail!("--env expects NAME=VALUE, got {:?}", assignment);
        };
        if name.is_empty() {
            bail!("--env expects NAME=VALUE, got {:?}", assignment);
        }
        overlay = overlay.with_set(name, value);
    }
    for name in unset {
        overlay = overlay.with_unset(name.as_str());
    }

    let mut request = LaunchRequest::new(cwd)
        .with_environment(overlay)
        .with_tabs(tabs);
    request.terminal = terminal;
    request.extra_args = args;
    if let Some(width) = width {
        request = request.with_window_width(width);
    }
    request.validate()?;
    Ok(request)
}

/// Launch and stay alive until a PowerShell title fixup has finished, so the
/// thread is not cut short by the process exiting.
pub fn launch(request: &LaunchRequest) -> Result<Value> {
    let launcher = Launcher::native();
    let outcome = launcher.launch(request)?;
    info!("Launched terminal at {}", request.working_directory);

    let title = outcome.title_fixup.map(|fixup| match fixup.join() {
        TitleFixupOutcome::Titled => "set".to_string(),
        TitleFixupOutcome::TimedOut => "timed out".to_string(),
        TitleFixupOutcome::Cancelled => "cancelled".to_string(),
        TitleFixupOutcome::Failed(message) => {
            warn!("Console title not set: {}", message);
            format!("failed: {}", message)
        }
    });

    Ok(json!({
        "success": true,
        "cwd": request.working_directory,
        "pid": outcome.pid,
        "title": title,
    }))
}

pub fn launch_json(params: &str) -> Result<Value> {
    let params: Value = serde_json::from_str(params).context("parsing launch parameters")?;
    let request = newterm::launch_request_from_params(&params)?;
    launch(&request)
}

pub fn default_terminal() -> Result<Value> {
    let launcher = Launcher::native();
    let window_manager = launcher.window_manager()?;
    Ok(json!({
        "window_manager": window_manager,
        "terminal": window_manager.terminal(),
    }))
}

pub fn shell_env(shell: Option<&str>, subprocess: bool) -> Result<Value> {
    let form = if subprocess {
        EnvironmentForm::Subprocess
    } else {
        EnvironmentForm::Text
    };
    let resolved = shellenv::resolve_shell_environment(shell, form)?;
    Ok(serde_json::to_value(resolved)?)
}

pub fn shell_env_json(params: &str) -> Result<Value> {
    let params: Value = serde_json::from_str(params).context("parsing shell parameters")?;
    let query = newterm::shell_query_from_params(&params)?;
    shell_env(query.shell_path.as_deref(), query.for_subprocess)
}

pub fn shell_path(shell: Option<&str>) -> Result<Value> {
    let resolved = shellenv::resolve_shell_path_list(shell)?;
    Ok(serde_json::to_value(resolved)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_request_from_flags() {
        let request = launch_request(
            Path::new("/srv/app"),
            Some("xterm".to_string()),
            &["FOO=a=b".to_string()],
            &["EDITOR".to_string()],
            Some(640),
            true,
            vec!["-hold".to_string()],
        )
        .unwrap();

        assert_eq!(request.working_directory, "/srv/app");
        assert_eq!(request.terminal.as_deref(), Some("xterm"));
        assert_eq!(request.window_width, 640);
        assert!(request.use_tabs);
        assert_eq!(request.extra_args, vec!["-hold"]);

        let edits: Vec<(&str, Option<&str>)> = request
            .environment
            .iter()
            .map(|(name, edit)| (name, edit.value()))
            .collect();
        assert_eq!(edits, vec![("FOO", Some("a=b")), ("EDITOR", None)]);
    }

    #[test]
    fn test_bad_assignment() {
        let err = launch_request(
            Path::new("/tmp"),
            None,
            &["NOVALUE".to_string()],
            &[],
            None,
            false,
            Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("NAME=VALUE"));
    }

    #[test]
    fn test_zero_width_rejected() {
        let err = launch_request(Path::new("/tmp"), None, &[], &[], Some(0), false, Vec::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "width must be a positive integer, not 0");
    }

    #[test]
    fn test_launch_json_validates_first() {
        let err = launch_json(r#"{"cwd": 5}"#).unwrap_err();
        assert_eq!(err.to_string(), "cwd must be a unicode string, not number");
    }

    #[test]
    fn test_shell_env_json_validates_first() {
        let err = shell_env_json(r#"{"shell": 7}"#).unwrap_err();
        assert_eq!(err.to_string(), "shell must be a unicode string or null, not number");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_path_lists_directories() {
        let value = shell_path(Some("/bin/sh")).unwrap();
        assert_eq!(value["shell_path"], "/bin/sh");
        assert!(value["directories"].as_array().is_some());
    }
}
