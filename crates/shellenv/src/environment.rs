//! Login shell environment resolution.
//!
//! The shell is started as a login shell with a minimal bootstrap environment
//! derived from the account record, so the result reflects the user's startup
//! files rather than whatever environment the calling process inherited. The
//! shell prints a marker line followed by the output of `env`, which is parsed
//! back into a map.

use crate::account::{shell_basename, Account};
use crate::config::ShellConfig;
use crate::error::{Result, ShellEnvError};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Start of a `NAME=value` line in `env` output. Bash exports functions as
/// `BASH_FUNC_name%%=() { ... }`, hence the optional suffix.
static ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*(?:%%)?)=").unwrap());

/// Which shape the resolved variables should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentForm {
    /// Everything the shell reported.
    #[default]
    Text,
    /// Ready to hand to a child process: per-session bookkeeping variables
    /// (`_`, `SHLVL`, `PWD`, `OLDPWD`) are removed.
    Subprocess,
}

/// The environment a login shell establishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEnvironment {
    /// Shell that produced the environment.
    pub shell_path: String,
    /// Variable names and values.
    pub variables: BTreeMap<String, String>,
}

impl ResolvedEnvironment {
    /// Look up a variable. Case-insensitive on Windows.
    pub fn get(&self, name: &str) -> Option<&str> {
        if cfg!(windows) {
            self.variables
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        } else {
            self.variables.get(name).map(String::as_str)
        }
    }

    fn into_form(mut self, form: EnvironmentForm) -> Self {
        if form == EnvironmentForm::Subprocess {
            for name in ShellConfig::SESSION_VARIABLES {
                self.variables.remove(*name);
            }
        }
        self
    }
}

/// Shell families that need different invocation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShellKind {
    /// bash: `-i` so `~/.bashrc` is read as well.
    Bash,
    /// csh/tcsh: `-l` must be the only flag, commands go through stdin.
    Csh,
    /// sh, zsh, fish, dash, ksh and anything else.
    Other,
}

impl ShellKind {
    pub(crate) fn from_path(shell_path: &str) -> Self {
        match shell_basename(shell_path) {
            "bash" => ShellKind::Bash,
            "csh" | "tcsh" => ShellKind::Csh,
            _ => ShellKind::Other,
        }
    }
}

/// Resolve the environment that `shell_path` (default: the user's login shell)
/// establishes for a login session.
///
/// Every call invokes the shell again; nothing is cached.
pub fn resolve_shell_environment(
    shell_path: Option<&str>,
    form: EnvironmentForm,
) -> Result<ResolvedEnvironment> {
    if let Some(path) = shell_path {
        validate_shell_path(path)?;
    }

    let account = Account::current()?;
    let shell = shell_path
        .map(str::to_owned)
        .unwrap_or_else(|| account.shell.clone());

    let variables = read_environment(&shell, &account)?;
    info!(
        "Resolved {} variables from login shell {}",
        variables.len(),
        shell
    );

    Ok(ResolvedEnvironment {
        shell_path: shell,
        variables,
    }
    .into_form(form))
}

fn validate_shell_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ShellEnvError::Validation {
            param: "shell_path".to_string(),
            expected: "a non-empty string".to_string(),
            actual: "empty string".to_string(),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn read_environment(shell: &str, account: &Account) -> Result<BTreeMap<String, String>> {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let kind = ShellKind::from_path(shell);
    let script = format!(
        "echo {}; {}",
        ShellConfig::OUTPUT_MARKER,
        ShellConfig::ENV_COMMAND
    );

    let mut cmd = Command::new(shell);
    cmd.env_clear()
        .envs(bootstrap_environment(shell, account))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if std::path::Path::new(&account.home).is_dir() {
        cmd.current_dir(&account.home);
    }

    match kind {
        ShellKind::Csh => {
            cmd.arg("-l").stdin(Stdio::piped());
        }
        ShellKind::Bash => {
            cmd.args(["-l", "-i", "-c", &script]).stdin(Stdio::null());
        }
        ShellKind::Other => {
            cmd.args(["-l", "-c", &script]).stdin(Stdio::null());
        }
    }

    debug!("Running login shell {} ({:?})", shell, kind);
    let mut child = cmd
        .spawn()
        .map_err(|e| ShellEnvError::io(format!("starting {}", shell), e))?;

    if kind == ShellKind::Csh {
        if let Some(mut stdin) = child.stdin.take() {
            let input = format!(
                "echo {}\n{}\nexit\n",
                ShellConfig::OUTPUT_MARKER,
                ShellConfig::ENV_COMMAND
            );
            stdin
                .write_all(input.as_bytes())
                .map_err(|e| ShellEnvError::io(format!("writing to {}", shell), e))?;
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| ShellEnvError::io(format!("waiting for {}", shell), e))?;

    if !output.status.success() {
        let status = match output.status.code() {
            Some(code) => format!("exit code {}", code),
            None => format!("{}", output.status),
        };
        return Err(ShellEnvError::ShellFailed {
            shell: shell.to_string(),
            status,
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_env_output(&stdout).ok_or_else(|| {
        ShellEnvError::resolution(format!("{} did not report its environment", shell))
    })
}

#[cfg(windows)]
fn read_environment(_shell: &str, _account: &Account) -> Result<BTreeMap<String, String>> {
    // cmd.exe has no startup files; the process environment is the login
    // environment.
    Ok(std::env::vars_os()
        .map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        })
        .collect())
}

/// Environment the shell starts with, before its startup files run.
#[cfg(unix)]
fn bootstrap_environment(shell: &str, account: &Account) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert("HOME".to_string(), account.home.clone());
    env.insert("USER".to_string(), account.name.clone());
    env.insert("LOGNAME".to_string(), account.name.clone());
    env.insert("SHELL".to_string(), shell.to_string());
    env.insert("PATH".to_string(), ShellConfig::BOOTSTRAP_PATH.to_string());

    for name in ShellConfig::PASSTHROUGH_VARIABLES {
        if let Ok(value) = std::env::var(name) {
            env.insert((*name).to_string(), value);
        }
    }
    env
}

/// Parse the output of `echo MARKER; env`.
///
/// Lines before the marker are noise from startup files. A line that does not
/// start a new `NAME=` assignment continues the previous value, which is how
/// values containing newlines come out of `env`. Returns `None` when the
/// marker never appears.
pub(crate) fn parse_env_output(output: &str) -> Option<BTreeMap<String, String>> {
    let mut lines = output.lines();
    lines.find(|line| line.trim_end() == ShellConfig::OUTPUT_MARKER)?;

    let mut variables = BTreeMap::new();
    let mut current: Option<(String, String)> = None;

    for line in lines {
        if let Some(caps) = ASSIGNMENT_RE.captures(line) {
            if let Some((name, value)) = current.take() {
                variables.insert(name, value);
            }
            let name = caps[1].to_string();
            let value = line[caps[0].len()..].to_string();
            current = Some((name, value));
        } else if let Some((_, value)) = current.as_mut() {
            value.push('\n');
            value.push_str(line);
        }
    }
    if let Some((name, value)) = current {
        variables.insert(name, value);
    }

    Some(variables)
}
