//! Centralized configuration for newterm.
//!
//! Fixed names, sizes and timings used by the launch strategies.

use std::time::Duration;

/// Defaults for a launch request.
pub struct LaunchConfig;

impl LaunchConfig {
    pub const DEFAULT_WINDOW_WIDTH: u32 = 1024;
    pub const WINDOW_HEIGHT: u32 = 768;
    pub const DEFAULT_USE_TABS: bool = false;

    /// Terminal identifiers with a dedicated strategy.
    pub const TERMINAL_APP: &'static str = "Terminal.app";
    pub const ITERM_APP: &'static str = "iTerm.app";
    pub const POWERSHELL_EXE: &'static str = "powershell.exe";
    pub const CMD_EXE: &'static str = "cmd.exe";

    /// Windows launcher that takes its directory through `/START`.
    pub const CMDER_EXE: &'static str = "cmder.exe";
}

/// macOS scripting configuration.
pub struct ScriptingConfig;

impl ScriptingConfig {
    pub const TERMINAL_APPLICATION: &'static str = "Terminal";
    pub const ITERM_APPLICATION: &'static str = "iTerm";
    pub const ITERM_SESSION_PROFILE: &'static str = "Default Session";
    /// Seconds iTerm gets to print its prompt before commands are typed.
    pub const ITERM_PROMPT_DELAY: &'static str = "0.25";
}

/// Windows console configuration.
pub struct ConsoleConfig;

impl ConsoleConfig {
    /// HKCU key PowerShell reads its console settings from.
    pub const POWERSHELL_PREFERENCES_KEY: &'static str =
        "Console\\%SystemRoot%_system32_WindowsPowerShell_v1.0_powershell.exe";

    pub const POWERSHELL_TITLE: &'static str = "Windows PowerShell";
    pub const POWERSHELL_RELATIVE_PATH: &'static str =
        "system32\\WindowsPowerShell\\v1.0\\powershell.exe";

    // Console fill attribute bits
    pub const FOREGROUND_GREEN: u32 = 0x02;
    pub const FOREGROUND_RED: u32 = 0x04;
    pub const BACKGROUND_BLUE: u32 = 0x10;
    pub const BACKGROUND_RED: u32 = 0x40;
    pub const FOREGROUND_YELLOW: u32 = Self::FOREGROUND_RED | Self::FOREGROUND_GREEN;
    pub const BACKGROUND_MAGENTA: u32 = Self::BACKGROUND_RED | Self::BACKGROUND_BLUE;
    pub const POWERSHELL_FILL_ATTRIBUTE: u32 = Self::FOREGROUND_YELLOW | Self::BACKGROUND_MAGENTA;

    pub const TITLE_POLL_INTERVAL: Duration = Duration::from_millis(100);
    pub const TITLE_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Linux process listing configuration.
pub struct ProcessListConfig;

impl ProcessListConfig {
    pub const PS_PROGRAM: &'static str = "ps";
    pub const PS_ARGS: &'static [&'static str] = &["-eo", "comm"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_powershell_colors() {
        assert_eq!(ConsoleConfig::FOREGROUND_YELLOW, 0x06);
        assert_eq!(ConsoleConfig::BACKGROUND_MAGENTA, 0x50);
        assert_eq!(ConsoleConfig::POWERSHELL_FILL_ATTRIBUTE, 0x56);
    }

    #[test]
    fn test_timeouts_are_reasonable() {
        assert!(ConsoleConfig::TITLE_TIMEOUT > ConsoleConfig::TITLE_POLL_INTERVAL);
        assert!(ConsoleConfig::TITLE_POLL_INTERVAL > Duration::ZERO);
    }
}
