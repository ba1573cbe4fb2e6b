//! Desktop session detection for picking a default terminal.
//!
//! The running desktop is recognised from the command names of running
//! processes. The first process whose name starts with a known session
//! prefix decides; process names are truncated by the kernel, hence the
//! odd-looking `cinnamon-sessio`.

use crate::error::Result;
use crate::platform::ProcessLister;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// Known desktop sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowManager {
    Gnome,
    Cinnamon,
    Xfce,
    Kde,
    Lxde,
    Mate,
    Unknown,
}

/// Process name prefixes, checked in this order for each process.
const SESSION_PREFIXES: &[(&str, WindowManager)] = &[
    ("gnome-session", WindowManager::Gnome),
    ("cinnamon-sessio", WindowManager::Cinnamon),
    ("xfce4-session", WindowManager::Xfce),
    ("ksmserver", WindowManager::Kde),
    ("lxsession", WindowManager::Lxde),
    ("mate-panel", WindowManager::Mate),
];

impl WindowManager {
    /// Every variant, `Unknown` last.
    pub const ALL: [WindowManager; 7] = [
        WindowManager::Gnome,
        WindowManager::Cinnamon,
        WindowManager::Xfce,
        WindowManager::Kde,
        WindowManager::Lxde,
        WindowManager::Mate,
        WindowManager::Unknown,
    ];

    /// Recognise the session from process names, in listing order.
    pub fn from_process_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            if let Some((_, wm)) = SESSION_PREFIXES
                .iter()
                .find(|(prefix, _)| name.starts_with(prefix))
            {
                return *wm;
            }
        }
        WindowManager::Unknown
    }

    /// The terminal emulator this session ships with.
    pub fn terminal(self) -> &'static str {
        match self {
            WindowManager::Gnome | WindowManager::Cinnamon => "gnome-terminal",
            WindowManager::Xfce => "xfce4-terminal",
            WindowManager::Kde => "konsole",
            WindowManager::Lxde => "lxterminal",
            WindowManager::Mate => "mate-terminal",
            WindowManager::Unknown => "xterm",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WindowManager::Gnome => "gnome",
            WindowManager::Cinnamon => "cinnamon",
            WindowManager::Xfce => "xfce",
            WindowManager::Kde => "kde",
            WindowManager::Lxde => "lxde",
            WindowManager::Mate => "mate",
            WindowManager::Unknown => "unknown",
        }
    }
}

impl fmt::Display for WindowManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the running session through `lister`.
pub fn detect(lister: &dyn ProcessLister) -> Result<WindowManager> {
    let names = lister.command_names()?;
    let wm = WindowManager::from_process_names(&names);
    debug!("Detected window manager {} from {} processes", wm, names.len());
    Ok(wm)
}

/// Remembers the detected session for the life of a launcher.
///
/// Failed detections are not stored, so the next call tries again. Two
/// threads racing on an empty cache may both run detection; the first result
/// stored wins.
#[derive(Debug, Default)]
pub struct WindowManagerCache {
    cell: OnceLock<WindowManager>,
}

impl WindowManagerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached session, detecting it on first use.
    pub fn get_or_detect(&self, lister: &dyn ProcessLister) -> Result<WindowManager> {
        if let Some(wm) = self.cell.get() {
            return Ok(*wm);
        }
        let detected = detect(lister)?;
        Ok(*self.cell.get_or_init(|| detected))
    }

    pub fn cached(&self) -> Option<WindowManager> {
        self.cell.get().copied()
    }

    /// Forget the cached session.
    pub fn reset(&mut self) {
        self.cell.take();
    }
}
