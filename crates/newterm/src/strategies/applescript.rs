//! Shell command text for macOS terminals.
//!
//! Commands typed into Terminal.app or iTerm pass through two grammars: they
//! are AppleScript string literals that the terminal then hands to the
//! user's login shell. Values are therefore quoted twice, shell first.

use crate::error::{NewtermError, Result};
use crate::overlay::{EnvEdit, EnvironmentOverlay};

/// Quote `value` for a POSIX-style shell: wrap in single quotes and turn each
/// embedded `'` into `'\''`.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Quote `value` as an AppleScript string literal.
pub fn applescript_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Variable assignment syntax of a login shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellGrammar {
    /// `export`/`unset` (sh, bash, zsh and anything unrecognised)
    Posix,
    Fish,
    /// `setenv`/`unsetenv` (csh, tcsh)
    Csh,
}

impl ShellGrammar {
    /// Pick the grammar from a login shell path.
    pub fn from_shell_path(shell: &str) -> Self {
        match shellenv::shell_basename(shell) {
            "fish" => ShellGrammar::Fish,
            "csh" | "tcsh" => ShellGrammar::Csh,
            _ => ShellGrammar::Posix,
        }
    }

    /// Command that sets `name` to `value`.
    pub fn set_command(self, name: &str, value: &str) -> String {
        let value = shell_quote(value);
        match self {
            ShellGrammar::Posix => format!("export {}={}", name, value),
            ShellGrammar::Fish => format!("set -gx {} {}", name, value),
            ShellGrammar::Csh => format!("setenv {} {}", name, value),
        }
    }

    /// Command that removes `name`.
    pub fn unset_command(self, name: &str) -> String {
        match self {
            ShellGrammar::Posix => format!("unset -v {}", name),
            ShellGrammar::Fish => format!("set -e {}", name),
            ShellGrammar::Csh => format!("unsetenv {}", name),
        }
    }
}

/// Whether `name` can be typed into a shell unquoted: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_shell_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// One shell command per overlay entry, in overlay order.
///
/// Names are typed into the shell as is, so anything but a plain identifier
/// is rejected before a command is built.
pub fn set_commands(overlay: &EnvironmentOverlay, grammar: ShellGrammar) -> Result<Vec<String>> {
    overlay
        .iter()
        .map(|(name, edit)| {
            if !is_shell_identifier(name) {
                return Err(NewtermError::validation(
                    "env",
                    "variable names made of letters, digits and underscores",
                    format!("{:?}", name),
                ));
            }
            Ok(match edit {
                EnvEdit::Set(value) => grammar.set_command(name, value),
                EnvEdit::Unset => grammar.unset_command(name),
            })
        })
        .collect()
}

/// `cd` into `dir`, quoted for the shell.
pub fn cd_command(dir: &str) -> String {
    format!("cd {}", shell_quote(dir))
}
