//! Any terminal emulator started as a plain executable.

use crate::config::LaunchConfig;
use crate::dispatch::{LaunchContext, LaunchOutcome};
use crate::error::Result;
use crate::platform::SpawnSpec;
use crate::request::LaunchRequest;
use tracing::info;

/// Arguments passed to `executable`.
///
/// cmder.exe ignores its working directory and must be told where to start
/// with `/START <dir>`.
pub fn arguments(executable: &str, working_directory: &str, extra_args: &[String]) -> Vec<String> {
    let mut args = Vec::with_capacity(extra_args.len() + 2);
    if shellenv::shell_basename(executable).eq_ignore_ascii_case(LaunchConfig::CMDER_EXE) {
        args.push("/START".to_string());
        args.push(working_directory.to_string());
    }
    args.extend(extra_args.iter().cloned());
    args
}

/// Start `executable` in the request's directory with the overlaid
/// environment.
pub fn launch(
    executable: &str,
    request: &LaunchRequest,
    ctx: &LaunchContext<'_>,
) -> Result<LaunchOutcome> {
    let environment = ctx
        .adapters
        .environment
        .snapshot()?
        .overlaid(&request.environment, ctx.platform.case_insensitive_env());

    let spec = SpawnSpec {
        program: executable.to_string(),
        args: arguments(executable, &request.working_directory, &request.extra_args),
        working_directory: request.working_directory.clone(),
        environment,
        console: None,
    };

    let pid = ctx.adapters.spawner.spawn(&spec)?;
    info!("Started {} (pid {}) in {}", executable, pid, request.working_directory);

    Ok(LaunchOutcome {
        pid: Some(pid),
        title_fixup: None,
    })
}
