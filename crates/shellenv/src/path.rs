//! `PATH` resolution on top of the login shell environment.

use crate::environment::{resolve_shell_environment, EnvironmentForm};
use crate::error::Result;
use serde::Serialize;

/// The `PATH` directories a login shell establishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    /// Shell that produced the environment.
    pub shell_path: String,
    /// Directories in search order.
    pub directories: Vec<String>,
}

/// Resolve the `PATH` directories of `shell_path` (default: the user's login
/// shell).
pub fn resolve_shell_path_list(shell_path: Option<&str>) -> Result<ResolvedPath> {
    let env = resolve_shell_environment(shell_path, EnvironmentForm::Text)?;
    let directories = env.get("PATH").map(split_path_list).unwrap_or_default();

    Ok(ResolvedPath {
        shell_path: env.shell_path,
        directories,
    })
}

/// Split a `PATH`-style value with the platform separator, dropping empty
/// entries.
pub fn split_path_list(value: &str) -> Vec<String> {
    std::env::split_paths(value)
        .map(|dir| dir.to_string_lossy().into_owned())
        .filter(|dir| !dir.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_split_path_list() {
        assert_eq!(
            split_path_list("/usr/local/bin::/usr/bin:/bin:"),
            vec!["/usr/local/bin", "/usr/bin", "/bin"]
        );
        assert!(split_path_list("").is_empty());
    }

    #[cfg(windows)]
    #[test]
    fn test_split_path_list() {
        assert_eq!(
            split_path_list(r"C:\Windows;;C:\Tools"),
            vec![r"C:\Windows", r"C:\Tools"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_path_list_with_sh() {
        let resolved = resolve_shell_path_list(Some("/bin/sh")).unwrap();
        assert_eq!(resolved.shell_path, "/bin/sh");
        assert!(!resolved.directories.is_empty());
        assert!(resolved.directories.iter().all(|dir| !dir.is_empty()));
    }
}
