//! User account lookup: name, home directory and configured login shell.
//!
//! # Platform Behavior
//! - **Linux/macOS**: Reads the account database via `getpwuid`/`getpwnam`
//! - **Windows**: Uses `USERNAME`, `USERPROFILE` and `COMSPEC`

use crate::config::ShellConfig;
use crate::error::{Result, ShellEnvError};
use serde::Serialize;
use tracing::debug;

/// A user account as recorded by the operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Login name.
    pub name: String,
    /// Home directory.
    pub home: String,
    /// Configured login shell.
    pub shell: String,
}

impl Account {
    /// Look up the account the current process runs as.
    #[cfg(unix)]
    pub fn current() -> Result<Self> {
        use nix::unistd::{getuid, User};

        let uid = getuid();
        let user = User::from_uid(uid)
            .map_err(|e| {
                ShellEnvError::resolution(format!("account lookup for uid {} failed: {}", uid, e))
            })?
            .ok_or_else(|| ShellEnvError::resolution(format!("no account record for uid {}", uid)))?;
        Self::from_user(user)
    }

    /// Look up an account by login name.
    #[cfg(unix)]
    pub fn lookup(name: &str) -> Result<Self> {
        use nix::unistd::User;

        let user = User::from_name(name)
            .map_err(|e| {
                ShellEnvError::resolution(format!("account lookup for {} failed: {}", name, e))
            })?
            .ok_or_else(|| ShellEnvError::resolution(format!("no account named {}", name)))?;
        Self::from_user(user)
    }

    #[cfg(unix)]
    fn from_user(user: nix::unistd::User) -> Result<Self> {
        let home = user.dir.to_str().map(str::to_owned).ok_or_else(|| {
            ShellEnvError::resolution(format!("home directory of {} is not valid UTF-8", user.name))
        })?;
        let shell = user.shell.to_str().map(str::to_owned).ok_or_else(|| {
            ShellEnvError::resolution(format!("login shell of {} is not valid UTF-8", user.name))
        })?;

        // An empty shell field means the system default
        let shell = if shell.is_empty() {
            debug!("Account {} has no shell configured, using {}", user.name, ShellConfig::FALLBACK_SHELL);
            ShellConfig::FALLBACK_SHELL.to_string()
        } else {
            shell
        };

        Ok(Self {
            name: user.name,
            home,
            shell,
        })
    }

    /// Look up the account the current process runs as.
    #[cfg(windows)]
    pub fn current() -> Result<Self> {
        let name = env_text("USERNAME")?
            .ok_or_else(|| ShellEnvError::resolution("USERNAME is not set"))?;
        Self::lookup(&name)
    }

    /// Look up an account by login name.
    ///
    /// Only the current user can be described on Windows.
    #[cfg(windows)]
    pub fn lookup(name: &str) -> Result<Self> {
        let home = env_text("USERPROFILE")?.unwrap_or_default();
        let shell = env_text("COMSPEC")?
            .unwrap_or_else(|| ShellConfig::FALLBACK_COMMAND_PROCESSOR.to_string());
        Ok(Self {
            name: name.to_string(),
            home,
            shell,
        })
    }
}

#[cfg(windows)]
fn env_text(name: &str) -> Result<Option<String>> {
    match std::env::var_os(name) {
        None => Ok(None),
        Some(value) => value.into_string().map(Some).map_err(|_| ShellEnvError::Validation {
            param: name.to_string(),
            expected: "a unicode string".to_string(),
            actual: "non-UTF-8 OS string".to_string(),
        }),
    }
}

/// Returns the login name of the user running this process.
pub fn user_name() -> Result<String> {
    Account::current().map(|account| account.name)
}

/// Returns the configured login shell of `user`, or of the current user.
pub fn login_shell(user: Option<&str>) -> Result<String> {
    let account = match user {
        Some(name) => Account::lookup(name)?,
        None => Account::current()?,
    };
    Ok(account.shell)
}

/// Returns the final component of a shell path (`/usr/local/bin/fish` → `fish`).
pub fn shell_basename(shell_path: &str) -> &str {
    shell_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(shell_path)
}
