//! newterm - open a terminal window or tab at a directory.
//!
//! The terminal inherits the caller's environment with a set of edits
//! applied on top. On Windows the default is PowerShell, on macOS
//! Terminal.app, and elsewhere the terminal that ships with the running
//! desktop session. Any other terminal executable can be named explicitly.
//!
//! # Example
//!
//! ```no_run
//! use newterm::{launch_terminal, LaunchRequest};
//!
//! fn main() -> newterm::Result<()> {
//!     let request = LaunchRequest::new("/home/ada/project")
//!         .with_env("RUST_LOG", "debug")
//!         .with_tabs(true);
//!     launch_terminal(&request)
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod overlay;
pub mod platform;
pub mod request;
pub mod strategies;
pub mod validate;
pub mod window_manager;

use std::sync::LazyLock;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use config::{ConsoleConfig, LaunchConfig, ScriptingConfig};
pub use dispatch::{select_strategy, ConsoleVariant, LaunchContext, LaunchOutcome, Launcher, Strategy};
pub use error::{NewtermError, Result};
pub use overlay::{EnvEdit, EnvironmentOverlay, EnvironmentSnapshot};
pub use platform::{Adapters, Platform};
pub use request::LaunchRequest;
pub use strategies::windows_console::{TitleFixup, TitleFixupOutcome};
pub use validate::{launch_request_from_params, shell_query_from_params, ShellQuery};
pub use window_manager::WindowManager;

/// Launcher shared by the free functions, so the desktop session is only
/// detected once per process.
static NATIVE: LazyLock<Launcher> = LazyLock::new(Launcher::native);

/// Open a terminal for `request` using the native adapters.
///
/// Returns once the terminal has been started; it is never waited on.
pub fn launch_terminal(request: &LaunchRequest) -> Result<()> {
    NATIVE.launch(request).map(|_| ())
}

/// Open a terminal from JSON parameters (`cwd`, `env`, `terminal`, `args`,
/// `width`, `use_tabs`). Parameters are validated before anything else
/// happens.
pub fn launch_terminal_from_params(params: &serde_json::Value) -> Result<()> {
    let request = launch_request_from_params(params)?;
    launch_terminal(&request)
}

/// The terminal emulator of the running desktop session.
#[cfg(not(any(windows, target_os = "macos")))]
pub fn resolve_default_terminal() -> Result<String> {
    NATIVE.default_terminal()
}
