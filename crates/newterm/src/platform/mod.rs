//! Platform abstraction layer.
//!
//! Every interaction with the operating system goes through one of the narrow
//! adapter traits in [`traits`]. Native implementations live in one module per
//! platform, and those modules are the only place `unsafe` code is allowed.
//! Strategies only ever see an [`Adapters`] bundle, so they can be exercised
//! with fakes on any host.
//!
//! # Native adapters
//!
//! - `posix` - detached process spawning, `ps` process listing (Unix)
//! - `macos` - `osascript` and `open -a`
//! - `windows` - `CreateProcessW`, environment strings, console windows,
//!   registry preferences

pub mod traits;

#[cfg(unix)]
mod posix;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(windows)]
mod windows;

use crate::error::{NewtermError, Result};
use crate::overlay::EnvironmentSnapshot;
use std::fmt;
use std::sync::Arc;

pub use traits::{
    ConsoleWindow, EnvironmentSource, LoginShellSource, PreferenceData, PreferenceStore,
    PreferenceValue, ProcessLister, ProcessSpawner, ScriptingBridge, SpawnSpec, WindowHandle,
    WindowTitler,
};

/// Operating system family, as far as terminal launching is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    MacOs,
    /// Linux, the BSDs and anything else with an X11/Wayland desktop.
    Other,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }

    /// Whether environment variable names are case-insensitive.
    pub fn case_insensitive_env(self) -> bool {
        self == Platform::Windows
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => f.write_str("windows"),
            Platform::MacOs => f.write_str("macos"),
            Platform::Other => f.write_str("other"),
        }
    }
}

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        "unknown"
    }
}

/// Adapter that reports every capability as unavailable on this host.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl Unsupported {
    fn error(capability: &str) -> NewtermError {
        NewtermError::Unsupported {
            capability: capability.to_string(),
            platform: current_platform().to_string(),
        }
    }
}

impl ProcessSpawner for Unsupported {
    fn spawn(&self, _spec: &SpawnSpec) -> Result<u32> {
        Err(Self::error("process spawning"))
    }
}

impl ScriptingBridge for Unsupported {
    fn run(&self, _script: &str) -> Result<String> {
        Err(Self::error("AppleScript"))
    }

    fn open_with_application(&self, _path: &str, _application: &str) -> Result<()> {
        Err(Self::error("opening a folder with an application"))
    }
}

impl ProcessLister for Unsupported {
    fn command_names(&self) -> Result<Vec<String>> {
        Err(Self::error("process listing"))
    }
}

impl PreferenceStore for Unsupported {
    fn key_exists(&self, _key: &str) -> Result<bool> {
        Err(Self::error("the registry"))
    }

    fn write_values(&self, _key: &str, _values: &[PreferenceValue]) -> Result<()> {
        Err(Self::error("the registry"))
    }
}

impl WindowTitler for Unsupported {
    fn find_window(&self, _pid: u32) -> Result<Option<WindowHandle>> {
        Err(Self::error("console window titles"))
    }

    fn set_title(&self, _window: WindowHandle, _title: &str) -> Result<()> {
        Err(Self::error("console window titles"))
    }
}

/// Environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentSource for ProcessEnvironment {
    fn snapshot(&self) -> Result<EnvironmentSnapshot> {
        let vars = std::env::vars_os()
            .map(|(name, value)| {
                (
                    name.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect();
        Ok(EnvironmentSnapshot::from_vars(vars))
    }
}

/// Login shell of the current user, from the account database.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountLoginShell;

impl LoginShellSource for AccountLoginShell {
    fn login_shell(&self) -> Result<String> {
        Ok(shellenv::login_shell(None)?)
    }
}

/// The set of OS adapters a launch may use.
#[derive(Clone)]
pub struct Adapters {
    pub spawner: Arc<dyn ProcessSpawner>,
    pub scripting: Arc<dyn ScriptingBridge>,
    pub processes: Arc<dyn ProcessLister>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub environment: Arc<dyn EnvironmentSource>,
    pub windows: Arc<dyn WindowTitler>,
    pub login_shell: Arc<dyn LoginShellSource>,
}

impl Adapters {
    /// Adapters that refuse every side effect. Only the environment and
    /// login shell lookups work. Tests replace the ones they exercise.
    pub fn unsupported() -> Self {
        Self {
            spawner: Arc::new(Unsupported),
            scripting: Arc::new(Unsupported),
            processes: Arc::new(Unsupported),
            preferences: Arc::new(Unsupported),
            environment: Arc::new(ProcessEnvironment),
            windows: Arc::new(Unsupported),
            login_shell: Arc::new(AccountLoginShell),
        }
    }

    /// The native adapters for the host operating system.
    pub fn native() -> Self {
        #[allow(unused_mut)]
        let mut adapters = Self::unsupported();

        #[cfg(unix)]
        {
            adapters.spawner = Arc::new(posix::DetachedSpawner);
            adapters.processes = Arc::new(posix::PsProcessLister);
        }

        #[cfg(target_os = "macos")]
        {
            adapters.scripting = Arc::new(macos::Osascript);
        }

        #[cfg(windows)]
        {
            adapters.spawner = Arc::new(windows::ConsoleSpawner);
            adapters.environment = Arc::new(windows::EnvironmentStrings);
            adapters.preferences = Arc::new(windows::RegistryPreferences);
            adapters.windows = Arc::new(windows::TopLevelWindows);
        }

        adapters
    }
}

impl fmt::Debug for Adapters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapters").finish_non_exhaustive()
    }
}
