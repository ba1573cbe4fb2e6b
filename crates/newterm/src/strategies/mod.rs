//! Launch strategies, one per family of terminal.
//!
//! - `generic` - any executable, spawned detached
//! - `apple_terminal` / `iterm` - macOS terminals driven through AppleScript
//! - `windows_console` - PowerShell and cmd.exe consoles
//!
//! All of them are portable code over the platform adapters.

pub mod apple_terminal;
pub mod applescript;
pub mod generic;
pub mod iterm;
pub mod windows_console;
