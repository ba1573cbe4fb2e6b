//! PowerShell and cmd.exe consoles on Windows.
//!
//! PowerShell is started the way its Start menu shortcut starts it: console
//! preferences seeded in the registry and the shortcut's colors applied. The
//! title is fixed up afterwards, because setting `lpTitle` would stop
//! PowerShell from reading those registry preferences.
//!
//! The environment block and command line helpers here are plain string
//! manipulation and are shared with the generic strategy.

use crate::cancel::CancellationToken;
use crate::config::{ConsoleConfig, LaunchConfig};
use crate::dispatch::{LaunchContext, LaunchOutcome};
use crate::error::{NewtermError, Result};
use crate::overlay::EnvironmentSnapshot;
use crate::platform::{
    ConsoleWindow, PreferenceData, PreferenceStore, PreferenceValue, SpawnSpec, WindowTitler,
};
use crate::request::LaunchRequest;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which console program to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleVariant {
    PowerShell,
    Cmd,
}

/// Console settings matching the stock PowerShell shortcut.
pub const POWERSHELL_PREFERENCES: &[PreferenceValue] = &[
    PreferenceValue { name: "FaceName", data: PreferenceData::Text("Lucida Console") },
    PreferenceValue { name: "FontFamily", data: PreferenceData::Dword(0x0000_0036) },
    PreferenceValue { name: "FontSize", data: PreferenceData::Dword(0x000c_0000) },
    PreferenceValue { name: "FontWeight", data: PreferenceData::Dword(0x0000_0190) },
    PreferenceValue { name: "HistoryNoDup", data: PreferenceData::Dword(0x0000_0000) },
    PreferenceValue { name: "QuickEdit", data: PreferenceData::Dword(0x0000_0001) },
    PreferenceValue { name: "ScreenBufferSize", data: PreferenceData::Dword(0x0bb8_0078) },
    PreferenceValue { name: "WindowSize", data: PreferenceData::Dword(0x0032_0078) },
    PreferenceValue { name: "ColorTable05", data: PreferenceData::Dword(0x0056_2401) },
    PreferenceValue { name: "ColorTable06", data: PreferenceData::Dword(0x00f0_edee) },
];

/// Write the PowerShell console preferences unless the user already has
/// some. Returns whether anything was written.
pub fn ensure_console_preferences(store: &dyn PreferenceStore) -> Result<bool> {
    let key = ConsoleConfig::POWERSHELL_PREFERENCES_KEY;
    if store.key_exists(key)? {
        debug!("Console preferences already present at HKCU\\{}", key);
        return Ok(false);
    }
    store.write_values(key, POWERSHELL_PREFERENCES)?;
    info!("Created console preferences at HKCU\\{}", key);
    Ok(true)
}

/// Build a snapshot from raw `NAME=VALUE` environment strings.
///
/// A leading entry that starts with `=` is the per-drive directory entry and
/// is kept verbatim. Other entries starting with `=` are hidden cmd.exe state
/// and are dropped. Names are upper-cased.
pub fn snapshot_from_entries(entries: &[String]) -> EnvironmentSnapshot {
    let mut snapshot = EnvironmentSnapshot::default();
    let mut rest = entries;

    if let Some((first, tail)) = entries.split_first() {
        if first.starts_with('=') {
            snapshot.drive_entry = Some(first.clone());
            rest = tail;
        }
    }

    for entry in rest {
        if entry.starts_with('=') {
            continue;
        }
        if let Some((name, value)) = entry.split_once('=') {
            snapshot.vars.insert(name.to_uppercase(), value.to_string());
        }
    }
    snapshot
}

/// Serialise `env` as a `CREATE_UNICODE_ENVIRONMENT` block: the drive entry,
/// then `NAME=VALUE` entries sorted case-insensitively, each NUL-terminated,
/// then a final NUL.
pub fn environment_block(env: &EnvironmentSnapshot) -> Vec<u16> {
    let mut block: Vec<u16> = Vec::new();

    if let Some(drive) = &env.drive_entry {
        block.extend(drive.encode_utf16());
        block.push(0);
    }

    let mut names: Vec<&String> = env.vars.keys().collect();
    names.sort_by_key(|name| name.to_lowercase());
    for name in names {
        block.extend(name.encode_utf16());
        block.push(u16::from(b'='));
        block.extend(env.vars[name].encode_utf16());
        block.push(0);
    }

    // An empty block still needs two terminators.
    if block.is_empty() {
        block.push(0);
    }
    block.push(0);
    block
}

/// Command line for `CreateProcessW`: the program always quoted, each
/// argument quoted only when it contains a space, tab or `"`.
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = format!("\"{}\"", program);
    for arg in args {
        line.push(' ');
        if arg.contains([' ', '\t', '"']) {
            line.push('"');
            line.push_str(&arg.replace('"', "\\\""));
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Full path of the console program, looked up in the launch environment.
pub fn console_program(variant: ConsoleVariant, env: &EnvironmentSnapshot) -> Result<String> {
    match variant {
        ConsoleVariant::PowerShell => {
            let root = env
                .get("WINDIR")
                .or_else(|| env.get("SYSTEMROOT"))
                .ok_or_else(|| NewtermError::Resolution {
                    message: "neither WINDIR nor SYSTEMROOT is set".to_string(),
                })?;
            Ok(format!(
                "{}\\{}",
                root.trim_end_matches('\\'),
                ConsoleConfig::POWERSHELL_RELATIVE_PATH
            ))
        }
        ConsoleVariant::Cmd => env
            .get("COMSPEC")
            .map(str::to_owned)
            .ok_or_else(|| NewtermError::Resolution {
                message: "COMSPEC is not set".to_string(),
            }),
    }
}

/// How a title fixup ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleFixupOutcome {
    Titled,
    TimedOut,
    Cancelled,
    Failed(String),
}

/// Handle to a background title fixup.
#[derive(Debug)]
pub struct TitleFixup {
    token: CancellationToken,
    handle: JoinHandle<TitleFixupOutcome>,
}

impl TitleFixup {
    /// Ask the thread to stop at its next poll.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the thread to finish.
    pub fn join(self) -> TitleFixupOutcome {
        self.handle
            .join()
            .unwrap_or_else(|_| TitleFixupOutcome::Failed("title thread panicked".to_string()))
    }
}

fn poll_for_window(
    titler: &dyn WindowTitler,
    pid: u32,
    title: &str,
    interval: Duration,
    timeout: Duration,
    token: &CancellationToken,
) -> TitleFixupOutcome {
    let started = Instant::now();
    loop {
        if token.is_cancelled() {
            debug!("Title fixup for pid {} cancelled", pid);
            return TitleFixupOutcome::Cancelled;
        }

        match titler.find_window(pid) {
            Ok(Some(window)) => {
                return match titler.set_title(window, title) {
                    Ok(()) => {
                        debug!("Set title of pid {} to {:?}", pid, title);
                        TitleFixupOutcome::Titled
                    }
                    Err(e) => {
                        warn!("Failed to set console title for pid {}: {}", pid, e);
                        TitleFixupOutcome::Failed(e.to_string())
                    }
                };
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to enumerate windows for pid {}: {}", pid, e);
                return TitleFixupOutcome::Failed(e.to_string());
            }
        }

        if started.elapsed() >= timeout {
            warn!(
                "No window appeared for pid {} within {:?}, title left unchanged",
                pid, timeout
            );
            return TitleFixupOutcome::TimedOut;
        }
        thread::sleep(interval);
    }
}

/// Start a thread that waits for a top-level window of `pid` and retitles it.
pub fn spawn_title_fixup(
    titler: Arc<dyn WindowTitler>,
    pid: u32,
    title: &str,
    interval: Duration,
    timeout: Duration,
) -> Result<TitleFixup> {
    let token = CancellationToken::new();
    let thread_token = token.clone();
    let title = title.to_string();

    let handle = thread::Builder::new()
        .name(format!("title-{pid}"))
        .spawn(move || {
            poll_for_window(titler.as_ref(), pid, &title, interval, timeout, &thread_token)
        })
        .map_err(|e| NewtermError::io("starting the title thread", e))?;

    Ok(TitleFixup { token, handle })
}

/// Open PowerShell or cmd.exe at the request's directory.
pub fn launch(
    variant: ConsoleVariant,
    request: &LaunchRequest,
    ctx: &LaunchContext<'_>,
) -> Result<LaunchOutcome> {
    if variant == ConsoleVariant::PowerShell {
        ensure_console_preferences(ctx.adapters.preferences.as_ref())?;
    }

    let environment = ctx
        .adapters
        .environment
        .snapshot()?
        .overlaid(&request.environment, true);
    let program = console_program(variant, &environment)?;

    let fill_attribute = match variant {
        ConsoleVariant::PowerShell => ConsoleConfig::POWERSHELL_FILL_ATTRIBUTE,
        ConsoleVariant::Cmd => 0,
    };
    let spec = SpawnSpec {
        program,
        args: Vec::new(),
        working_directory: request.working_directory.clone(),
        environment,
        console: Some(ConsoleWindow {
            width: request.window_width,
            height: LaunchConfig::WINDOW_HEIGHT,
            fill_attribute,
        }),
    };

    let pid = ctx.adapters.spawner.spawn(&spec)?;
    info!("Started {} (pid {}) in {}", spec.program, pid, spec.working_directory);

    let title_fixup = match variant {
        ConsoleVariant::PowerShell => Some(spawn_title_fixup(
            Arc::clone(&ctx.adapters.windows),
            pid,
            ConsoleConfig::POWERSHELL_TITLE,
            ConsoleConfig::TITLE_POLL_INTERVAL,
            ctx.title_timeout,
        )?),
        ConsoleVariant::Cmd => None,
    };

    Ok(LaunchOutcome {
        pid: Some(pid),
        title_fixup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::WindowHandle;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn units(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    #[derive(Default)]
    struct MemoryStore {
        existing: bool,
        written: Mutex<Vec<(String, Vec<PreferenceValue>)>>,
    }

    impl PreferenceStore for MemoryStore {
        fn key_exists(&self, _key: &str) -> Result<bool> {
            Ok(self.existing)
        }

        fn write_values(&self, key: &str, values: &[PreferenceValue]) -> Result<()> {
            self.written
                .lock()
                .unwrap()
                .push((key.to_string(), values.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_preferences_written_once() {
        let store = MemoryStore::default();
        assert!(ensure_console_preferences(&store).unwrap());

        let written = store.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(
            written[0].0,
            "Console\\%SystemRoot%_system32_WindowsPowerShell_v1.0_powershell.exe"
        );
        assert_eq!(written[0].1.len(), 10);
        assert_eq!(
            written[0].1[0],
            PreferenceValue { name: "FaceName", data: PreferenceData::Text("Lucida Console") }
        );
    }

    #[test]
    fn test_existing_preferences_untouched() {
        let store = MemoryStore {
            existing: true,
            ..Default::default()
        };
        assert!(!ensure_console_preferences(&store).unwrap());
        assert!(store.written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_from_entries() {
        let entries: Vec<String> = ["=C:=C:\\Users\\ada", "Path=C:\\Windows", "=ExitCode=00000000", "temp=C:\\Temp"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let snapshot = snapshot_from_entries(&entries);

        assert_eq!(snapshot.drive_entry.as_deref(), Some("=C:=C:\\Users\\ada"));
        assert_eq!(snapshot.get("PATH"), Some("C:\\Windows"));
        assert_eq!(snapshot.get("TEMP"), Some("C:\\Temp"));
        assert_eq!(snapshot.vars.len(), 2);
    }

    #[test]
    fn test_snapshot_without_drive_entry() {
        let entries = vec!["ALLUSERSPROFILE=C:\\ProgramData".to_string()];
        let snapshot = snapshot_from_entries(&entries);
        assert!(snapshot.drive_entry.is_none());
        assert_eq!(snapshot.vars.len(), 1);
    }

    #[test]
    fn test_environment_block_shape() {
        let mut vars = BTreeMap::new();
        vars.insert("PATH".to_string(), "C:\\Windows".to_string());
        vars.insert("ALLUSERSPROFILE".to_string(), "C:\\ProgramData".to_string());
        vars.insert("_DEBUG".to_string(), "1".to_string());
        let env = EnvironmentSnapshot {
            drive_entry: Some("=C:=C:\\".to_string()),
            vars,
        };

        let block = environment_block(&env);

        let mut expected = Vec::new();
        for entry in ["=C:=C:\\", "_DEBUG=1", "ALLUSERSPROFILE=C:\\ProgramData", "PATH=C:\\Windows"] {
            expected.extend(units(entry));
            expected.push(0);
        }
        expected.push(0);
        assert_eq!(block, expected);
        assert_eq!(&block[block.len() - 2..], &[0, 0]);
    }

    #[test]
    fn test_environment_block_sorts_case_insensitively() {
        let mut vars = BTreeMap::new();
        vars.insert("b".to_string(), "2".to_string());
        vars.insert("A".to_string(), "1".to_string());
        vars.insert("C".to_string(), "3".to_string());
        let block = environment_block(&EnvironmentSnapshot::from_vars(vars));

        let text = String::from_utf16(&block).unwrap();
        assert_eq!(text, "A=1\0b=2\0C=3\0\0");
    }

    #[test]
    fn test_environment_block_counts_overlaid_entries() {
        let mut vars = BTreeMap::new();
        for (name, value) in [
            ("Path", "C:\\Windows"),
            ("TEMP", "C:\\Temp"),
            ("USERNAME", "ada"),
            ("OS", "Windows_NT"),
        ] {
            vars.insert(name.to_string(), value.to_string());
        }
        let base = EnvironmentSnapshot::from_vars(vars);
        let overlay = crate::overlay::EnvironmentOverlay::new()
            .with_set("NEW_ONE", "1")
            .with_set("new_two", "2")
            .with_set("path", "C:\\Tools")
            .with_unset("Temp")
            .with_unset("NEVER_SET");

        let block = environment_block(&base.overlaid(&overlay, true));

        // 4 existing, 2 added, 1 removed; the overwrite and the missing unset change nothing.
        let entries: Vec<String> = block
            .split(|unit| *unit == 0)
            .filter(|entry| !entry.is_empty())
            .map(|entry| String::from_utf16(entry).unwrap())
            .collect();
        assert_eq!(entries.len(), 4 + 2 - 1);
        assert_eq!(block.iter().filter(|unit| **unit == 0).count(), entries.len() + 1);
        assert!(entries.contains(&"PATH=C:\\Tools".to_string()));
        assert!(!entries.iter().any(|entry| entry.starts_with("TEMP=")));
    }

    #[test]
    fn test_empty_environment_block() {
        assert_eq!(environment_block(&EnvironmentSnapshot::default()), vec![0, 0]);
    }

    #[test]
    fn test_command_line_quoting() {
        let args = vec![
            "/START".to_string(),
            "C:\\My Projects".to_string(),
            "say \"hi\"".to_string(),
            "tab\there".to_string(),
            "plain".to_string(),
        ];
        assert_eq!(
            command_line("C:\\cmder\\cmder.exe", &args),
            "\"C:\\cmder\\cmder.exe\" /START \"C:\\My Projects\" \"say \\\"hi\\\"\" \"tab\there\" plain"
        );
        assert_eq!(command_line("cmd.exe", &[]), "\"cmd.exe\"");
    }

    #[test]
    fn test_console_program_paths() {
        let mut vars = BTreeMap::new();
        vars.insert("WINDIR".to_string(), "C:\\Windows".to_string());
        vars.insert("COMSPEC".to_string(), "C:\\Windows\\system32\\cmd.exe".to_string());
        let env = EnvironmentSnapshot::from_vars(vars);

        assert_eq!(
            console_program(ConsoleVariant::PowerShell, &env).unwrap(),
            "C:\\Windows\\system32\\WindowsPowerShell\\v1.0\\powershell.exe"
        );
        assert_eq!(
            console_program(ConsoleVariant::Cmd, &env).unwrap(),
            "C:\\Windows\\system32\\cmd.exe"
        );
    }

    #[test]
    fn test_console_program_missing_variable() {
        let env = EnvironmentSnapshot::default();
        assert!(matches!(
            console_program(ConsoleVariant::Cmd, &env),
            Err(NewtermError::Resolution { .. })
        ));
        assert!(matches!(
            console_program(ConsoleVariant::PowerShell, &env),
            Err(NewtermError::Resolution { .. })
        ));
    }

    /// A window appears for the pid after a number of polls.
    struct DelayedWindow {
        pid: u32,
        appears_after: usize,
        polls: AtomicUsize,
        titles: Mutex<Vec<(WindowHandle, String)>>,
    }

    impl DelayedWindow {
        fn new(pid: u32, appears_after: usize) -> Self {
            Self {
                pid,
                appears_after,
                polls: AtomicUsize::new(0),
                titles: Mutex::new(Vec::new()),
            }
        }
    }

    impl WindowTitler for DelayedWindow {
        fn find_window(&self, pid: u32) -> Result<Option<WindowHandle>> {
            let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if pid == self.pid && polls > self.appears_after {
                Ok(Some(WindowHandle(0x1234)))
            } else {
                Ok(None)
            }
        }

        fn set_title(&self, window: WindowHandle, title: &str) -> Result<()> {
            self.titles.lock().unwrap().push((window, title.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_title_fixup_sets_title() {
        let titler = Arc::new(DelayedWindow::new(42, 3));
        let fixup = spawn_title_fixup(
            titler.clone(),
            42,
            "Windows PowerShell",
            Duration::from_millis(1),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(fixup.join(), TitleFixupOutcome::Titled);
        assert_eq!(
            *titler.titles.lock().unwrap(),
            vec![(WindowHandle(0x1234), "Windows PowerShell".to_string())]
        );
        assert_eq!(titler.polls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_title_fixup_times_out() {
        let titler = Arc::new(DelayedWindow::new(42, usize::MAX));
        let fixup = spawn_title_fixup(
            titler.clone(),
            7,
            "Windows PowerShell",
            Duration::from_millis(1),
            Duration::from_millis(20),
        )
        .unwrap();

        assert_eq!(fixup.join(), TitleFixupOutcome::TimedOut);
        assert!(titler.titles.lock().unwrap().is_empty());
    }

    #[test]
    fn test_title_fixup_cancel() {
        let titler = Arc::new(DelayedWindow::new(42, usize::MAX));
        let fixup = spawn_title_fixup(
            titler,
            7,
            "Windows PowerShell",
            Duration::from_millis(5),
            Duration::from_secs(60),
        )
        .unwrap();

        fixup.cancel();
        assert_eq!(fixup.join(), TitleFixupOutcome::Cancelled);
    }
}
