//! shellenv - discover a user's login shell and the environment it establishes.
//!
//! Editors and other GUI programs are usually started without the user's
//! shell startup files having run, so their `PATH` and environment differ from
//! what the user sees in a terminal. This crate asks the login shell itself.
//!
//! # Example
//!
//! ```rust,no_run
//! use shellenv::{resolve_shell_environment, resolve_shell_path_list, EnvironmentForm};
//!
//! fn main() -> shellenv::Result<()> {
//!     let env = resolve_shell_environment(None, EnvironmentForm::Text)?;
//!     println!("{} set {} variables", env.shell_path, env.variables.len());
//!
//!     let path = resolve_shell_path_list(None)?;
//!     for dir in path.directories {
//!         println!("{}", dir);
//!     }
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod config;
pub mod environment;
pub mod error;
pub mod path;

pub use account::{login_shell, shell_basename, user_name, Account};
pub use config::ShellConfig;
pub use environment::{resolve_shell_environment, EnvironmentForm, ResolvedEnvironment};
pub use error::{Result, ShellEnvError};
pub use path::{resolve_shell_path_list, split_path_list, ResolvedPath};
