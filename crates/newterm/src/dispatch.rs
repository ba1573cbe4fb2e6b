//! Choosing and running a launch strategy.
//!
//! | Platform | `terminal`                 | Strategy                     |
//! |----------|----------------------------|------------------------------|
//! | Windows  | none, `powershell.exe`     | PowerShell console           |
//! | Windows  | `cmd.exe`                  | cmd.exe console              |
//! | macOS    | none, `Terminal.app`       | Terminal.app via AppleScript |
//! | macOS    | `iTerm.app`                | iTerm via AppleScript        |
//! | other    | none                       | desktop's default terminal   |
//! | any      | anything else              | executable spawned as is     |

use crate::config::{ConsoleConfig, LaunchConfig};
use crate::error::Result;
use crate::platform::{Adapters, Platform};
use crate::request::LaunchRequest;
use crate::strategies::windows_console::TitleFixup;
use crate::strategies::{apple_terminal, generic, iterm, windows_console};
use crate::window_manager::{WindowManager, WindowManagerCache};
use std::time::Duration;
use tracing::debug;

pub use crate::strategies::windows_console::ConsoleVariant;

/// How a terminal gets opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    AppleTerminal,
    ITerm,
    WindowsConsole(ConsoleVariant),
    GenericProcess { executable: String },
}

/// Pick the strategy for `terminal` on `platform`.
///
/// `default_terminal` is only consulted on platforms without a built-in
/// terminal when no terminal was requested.
pub fn select_strategy<F>(
    platform: Platform,
    terminal: Option<&str>,
    default_terminal: F,
) -> Result<Strategy>
where
    F: FnOnce() -> Result<String>,
{
    let strategy = match (platform, terminal) {
        (Platform::Windows, None) => Strategy::WindowsConsole(ConsoleVariant::PowerShell),
        (Platform::Windows, Some(t)) if t == LaunchConfig::POWERSHELL_EXE => {
            Strategy::WindowsConsole(ConsoleVariant::PowerShell)
        }
        (Platform::Windows, Some(t)) if t == LaunchConfig::CMD_EXE => {
            Strategy::WindowsConsole(ConsoleVariant::Cmd)
        }
        (Platform::MacOs, None) => Strategy::AppleTerminal,
        (Platform::MacOs, Some(t)) if t == LaunchConfig::TERMINAL_APP => Strategy::AppleTerminal,
        (Platform::MacOs, Some(t)) if t == LaunchConfig::ITERM_APP => Strategy::ITerm,
        (Platform::Other, None) => Strategy::GenericProcess {
            executable: default_terminal()?,
        },
        (_, Some(t)) => Strategy::GenericProcess {
            executable: t.to_string(),
        },
    };
    Ok(strategy)
}

/// What a strategy needs beyond the request.
#[derive(Debug, Clone, Copy)]
pub struct LaunchContext<'a> {
    pub adapters: &'a Adapters,
    pub platform: Platform,
    /// How long the PowerShell title fixup keeps looking for its window.
    pub title_timeout: Duration,
}

/// Result of a successful launch.
#[derive(Debug, Default)]
pub struct LaunchOutcome {
    /// Pid of the started process, when the strategy started one directly.
    pub pid: Option<u32>,
    /// The PowerShell title fixup still running in the background.
    pub title_fixup: Option<TitleFixup>,
}

impl Strategy {
    /// Open a terminal for `request`.
    pub fn launch(&self, request: &LaunchRequest, ctx: &LaunchContext<'_>) -> Result<LaunchOutcome> {
        match self {
            Strategy::AppleTerminal => apple_terminal::launch(request, ctx),
            Strategy::ITerm => iterm::launch(request, ctx),
            Strategy::WindowsConsole(variant) => windows_console::launch(*variant, request, ctx),
            Strategy::GenericProcess { executable } => generic::launch(executable, request, ctx),
        }
    }
}

/// Launch context: the OS adapters, the platform identity and the detected
/// desktop session.
#[derive(Debug)]
pub struct Launcher {
    platform: Platform,
    adapters: Adapters,
    window_manager: WindowManagerCache,
    title_timeout: Duration,
}

impl Launcher {
    /// A launcher for this host with the native adapters.
    pub fn native() -> Self {
        Self::new(Platform::current(), Adapters::native())
    }

    pub fn new(platform: Platform, adapters: Adapters) -> Self {
        Self {
            platform,
            adapters,
            window_manager: WindowManagerCache::new(),
            title_timeout: ConsoleConfig::TITLE_TIMEOUT,
        }
    }

    /// Bound the PowerShell title fixup.
    pub fn with_title_timeout(mut self, timeout: Duration) -> Self {
        self.title_timeout = timeout;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn adapters(&self) -> &Adapters {
        &self.adapters
    }

    /// The desktop session, detected once per launcher.
    pub fn window_manager(&self) -> Result<WindowManager> {
        self.window_manager
            .get_or_detect(self.adapters.processes.as_ref())
    }

    /// Forget the detected desktop session.
    pub fn reset_window_manager(&mut self) {
        self.window_manager.reset();
    }

    /// Terminal emulator of the running desktop session.
    pub fn default_terminal(&self) -> Result<String> {
        Ok(self.window_manager()?.terminal().to_string())
    }

    pub fn select_strategy(&self, terminal: Option<&str>) -> Result<Strategy> {
        select_strategy(self.platform, terminal, || self.default_terminal())
    }

    /// Validate `request` and open a terminal for it.
    pub fn launch(&self, request: &LaunchRequest) -> Result<LaunchOutcome> {
        request.validate()?;

        let strategy = self.select_strategy(request.terminal.as_deref())?;
        debug!(
            "Launching {:?} at {} with {} environment edits",
            strategy,
            request.working_directory,
            request.environment.len()
        );

        let ctx = LaunchContext {
            adapters: &self.adapters,
            platform: self.platform,
            title_timeout: self.title_timeout,
        };
        strategy.launch(request, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NewtermError;

    fn no_default() -> Result<String> {
        panic!("default terminal must not be resolved")
    }

    #[test]
    fn test_windows_table() {
        assert_eq!(
            select_strategy(Platform::Windows, None, no_default).unwrap(),
            Strategy::WindowsConsole(ConsoleVariant::PowerShell)
        );
        assert_eq!(
            select_strategy(Platform::Windows, Some("powershell.exe"), no_default).unwrap(),
            Strategy::WindowsConsole(ConsoleVariant::PowerShell)
        );
        assert_eq!(
            select_strategy(Platform::Windows, Some("cmd.exe"), no_default).unwrap(),
            Strategy::WindowsConsole(ConsoleVariant::Cmd)
        );
        assert_eq!(
            select_strategy(Platform::Windows, Some("C:\\cmder\\cmder.exe"), no_default).unwrap(),
            Strategy::GenericProcess {
                executable: "C:\\cmder\\cmder.exe".to_string()
            }
        );
    }

    #[test]
    fn test_macos_table() {
        assert_eq!(
            select_strategy(Platform::MacOs, None, no_default).unwrap(),
            Strategy::AppleTerminal
        );
        assert_eq!(
            select_strategy(Platform::MacOs, Some("Terminal.app"), no_default).unwrap(),
            Strategy::AppleTerminal
        );
        assert_eq!(
            select_strategy(Platform::MacOs, Some("iTerm.app"), no_default).unwrap(),
            Strategy::ITerm
        );
        assert_eq!(
            select_strategy(Platform::MacOs, Some("/usr/local/bin/alacritty"), no_default).unwrap(),
            Strategy::GenericProcess {
                executable: "/usr/local/bin/alacritty".to_string()
            }
        );
    }

    #[test]
    fn test_other_table() {
        assert_eq!(
            select_strategy(Platform::Other, None, || Ok("konsole".to_string())).unwrap(),
            Strategy::GenericProcess {
                executable: "konsole".to_string()
            }
        );
        assert_eq!(
            select_strategy(Platform::Other, Some("xterm"), no_default).unwrap(),
            Strategy::GenericProcess {
                executable: "xterm".to_string()
            }
        );
    }

    #[test]
    fn test_names_are_not_special_elsewhere() {
        for name in ["Terminal.app", "iTerm.app", "powershell.exe", "cmd.exe"] {
            assert_eq!(
                select_strategy(Platform::Other, Some(name), no_default).unwrap(),
                Strategy::GenericProcess {
                    executable: name.to_string()
                }
            );
        }
        assert_eq!(
            select_strategy(Platform::Windows, Some("Terminal.app"), no_default).unwrap(),
            Strategy::GenericProcess {
                executable: "Terminal.app".to_string()
            }
        );
        assert_eq!(
            select_strategy(Platform::MacOs, Some("cmd.exe"), no_default).unwrap(),
            Strategy::GenericProcess {
                executable: "cmd.exe".to_string()
            }
        );
    }

    #[test]
    fn test_default_terminal_errors_propagate() {
        let err = select_strategy(Platform::Other, None, || {
            Err(NewtermError::platform("listing processes", "boom"))
        })
        .unwrap_err();
        assert!(matches!(err, NewtermError::Platform { .. }));
    }

    #[test]
    fn test_invalid_request_does_no_os_work() {
        // The spawner refuses, so reaching it would surface as Unsupported.
        let launcher = Launcher::new(Platform::Other, Adapters::unsupported());
        let err = launcher.launch(&LaunchRequest::new("")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.param(), Some("cwd"));
    }
}
