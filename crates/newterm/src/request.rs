//! Launch request description.

use crate::config::LaunchConfig;
use crate::error::{NewtermError, Result};
use crate::overlay::EnvironmentOverlay;

/// Everything needed to open a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Directory the terminal opens in.
    pub working_directory: String,
    /// Environment edits applied on top of the inherited environment.
    pub environment: EnvironmentOverlay,
    /// Terminal program, or `None` for the platform default.
    pub terminal: Option<String>,
    /// Arguments for a custom terminal executable. Ignored by the built-in
    /// Terminal.app, iTerm.app, powershell.exe and cmd.exe strategies.
    pub extra_args: Vec<String>,
    /// Windows only: initial console window width.
    pub window_width: u32,
    /// macOS only: open a tab in an existing window instead of a new window.
    pub use_tabs: bool,
}

impl LaunchRequest {
    /// Create a request with default settings.
    pub fn new(working_directory: impl Into<String>) -> Self {
        Self {
            working_directory: working_directory.into(),
            environment: EnvironmentOverlay::new(),
            terminal: None,
            extra_args: Vec::new(),
            window_width: LaunchConfig::DEFAULT_WINDOW_WIDTH,
            use_tabs: LaunchConfig::DEFAULT_USE_TABS,
        }
    }

    /// Set the environment overlay.
    pub fn with_environment(mut self, environment: EnvironmentOverlay) -> Self {
        self.environment = environment;
        self
    }

    /// Set a single environment variable.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment = self.environment.with_set(name, value);
        self
    }

    /// Choose the terminal program.
    pub fn with_terminal(mut self, terminal: impl Into<String>) -> Self {
        self.terminal = Some(terminal.into());
        self
    }

    /// Add an argument for a custom terminal executable.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Set the console window width.
    pub fn with_window_width(mut self, width: u32) -> Self {
        self.window_width = width;
        self
    }

    /// Prefer tabs over new windows.
    pub fn with_tabs(mut self, use_tabs: bool) -> Self {
        self.use_tabs = use_tabs;
        self
    }

    /// Check the invariants that the type system does not cover.
    pub fn validate(&self) -> Result<()> {
        if self.working_directory.is_empty() {
            return Err(NewtermError::validation(
                "cwd",
                "a non-empty unicode string",
                "empty string",
            ));
        }
        if self.terminal.as_deref() == Some("") {
            return Err(NewtermError::validation(
                "terminal",
                "a non-empty unicode string or null",
                "empty string",
            ));
        }
        for (name, _) in self.environment.iter() {
            crate::validate::verify_env_name(name, "env")?;
        }
        if self.window_width == 0 {
            return Err(NewtermError::validation(
                "width",
                "a positive integer",
                "0",
            ));
        }
        Ok(())
    }
}
