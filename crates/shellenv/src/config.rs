//! Constants used when invoking a login shell.

/// Shell invocation configuration.
pub struct ShellConfig;

impl ShellConfig {
    /// Printed by the shell right before its environment, so anything the
    /// user's startup files echo can be skipped.
    pub const OUTPUT_MARKER: &'static str = "__SHELLENV_ENVIRONMENT_BEGIN__";

    /// Program the shell runs to print its environment.
    pub const ENV_COMMAND: &'static str = "/usr/bin/env";

    /// `PATH` handed to the shell before its startup files run.
    pub const BOOTSTRAP_PATH: &'static str = "/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin";

    /// Variables passed through from the caller to the bootstrap environment.
    pub const PASSTHROUGH_VARIABLES: &'static [&'static str] =
        &["LANG", "LC_ALL", "LC_CTYPE", "TERM", "TMPDIR"];

    /// Per-session bookkeeping variables that make no sense in a child process.
    pub const SESSION_VARIABLES: &'static [&'static str] = &["_", "SHLVL", "PWD", "OLDPWD"];

    /// Used when the account database has an empty shell field.
    pub const FALLBACK_SHELL: &'static str = "/bin/sh";

    /// Used on Windows when `COMSPEC` is not set.
    pub const FALLBACK_COMMAND_PROCESSOR: &'static str = "cmd.exe";
}
