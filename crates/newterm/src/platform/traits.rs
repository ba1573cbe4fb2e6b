//! Adapter traits between the launch strategies and the operating system.

use crate::error::Result;
use crate::overlay::EnvironmentSnapshot;

/// Initial geometry and colors of a new Windows console window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleWindow {
    pub width: u32,
    pub height: u32,
    /// Console fill attribute, `0` for the default colors.
    pub fill_attribute: u32,
}

/// A process to start, detached from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: String,
    /// Complete environment of the new process. Nothing is inherited.
    pub environment: EnvironmentSnapshot,
    /// Windows only: console settings. `None` uses the console defaults.
    pub console: Option<ConsoleWindow>,
}

/// Starts detached processes.
pub trait ProcessSpawner: Send + Sync {
    /// Start the process and return its pid without waiting for it.
    fn spawn(&self, spec: &SpawnSpec) -> Result<u32>;
}

/// Runs AppleScript and opens folders with applications.
pub trait ScriptingBridge: Send + Sync {
    /// Execute `script` and return what it printed, trimmed.
    fn run(&self, script: &str) -> Result<String>;

    /// Open `path` with the named application.
    fn open_with_application(&self, path: &str, application: &str) -> Result<()>;
}

/// Lists running processes.
pub trait ProcessLister: Send + Sync {
    /// Command names of all running processes, in the order the OS reports
    /// them.
    fn command_names(&self) -> Result<Vec<String>>;
}

/// Data of a single preference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceData {
    Text(&'static str),
    Dword(u32),
}

/// A named preference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceValue {
    pub name: &'static str,
    pub data: PreferenceData,
}

/// Per-user preference storage (the Windows registry under HKCU).
pub trait PreferenceStore: Send + Sync {
    fn key_exists(&self, key: &str) -> Result<bool>;

    /// Create `key` if needed and write every value into it.
    fn write_values(&self, key: &str, values: &[PreferenceValue]) -> Result<()>;
}

/// Captures the environment of the current process.
pub trait EnvironmentSource: Send + Sync {
    fn snapshot(&self) -> Result<EnvironmentSnapshot>;
}

/// Opaque handle of a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Finds and retitles top-level windows.
pub trait WindowTitler: Send + Sync {
    /// The first top-level window owned by `pid`, if one exists yet.
    fn find_window(&self, pid: u32) -> Result<Option<WindowHandle>>;

    fn set_title(&self, window: WindowHandle, title: &str) -> Result<()>;
}

/// Looks up the login shell of the current user.
pub trait LoginShellSource: Send + Sync {
    fn login_shell(&self) -> Result<String>;
}
