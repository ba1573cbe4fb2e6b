//! Windows adapters: console process creation, environment strings, window
//! titles and registry preferences.

#![allow(unsafe_code)]

use super::traits::{
    EnvironmentSource, PreferenceData, PreferenceStore, PreferenceValue, ProcessSpawner,
    SpawnSpec, WindowHandle, WindowTitler,
};
use crate::error::{NewtermError, Result};
use crate::overlay::EnvironmentSnapshot;
use crate::strategies::windows_console::{command_line, environment_block, snapshot_from_entries};
use std::ffi::OsStr;
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::ptr;
use tracing::debug;
use windows_sys::Win32::Foundation::{CloseHandle, BOOL, FALSE, HWND, LPARAM, TRUE};
use windows_sys::Win32::System::Environment::{FreeEnvironmentStringsW, GetEnvironmentStringsW};
use windows_sys::Win32::System::Threading::{
    CreateProcessW, CREATE_NEW_CONSOLE, CREATE_UNICODE_ENVIRONMENT, PROCESS_INFORMATION,
    STARTF_USEFILLATTRIBUTE, STARTF_USESIZE, STARTUPINFOW,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowThreadProcessId, SetWindowTextW,
};
use winreg::enums::HKEY_CURRENT_USER;
use winreg::RegKey;

fn wide(text: &str) -> Vec<u16> {
    OsStr::new(text)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Creates processes in a new console window with an explicit environment
/// block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSpawner;

impl ProcessSpawner for ConsoleSpawner {
    fn spawn(&self, spec: &SpawnSpec) -> Result<u32> {
        let mut cmdline = wide(&command_line(&spec.program, &spec.args));
        let cwd = wide(&spec.working_directory);
        let block = environment_block(&spec.environment);

        // SAFETY: STARTUPINFOW is a plain C struct for which all-zero is the
        // documented "no options" value.
        let mut startup: STARTUPINFOW = unsafe { std::mem::zeroed() };
        startup.cb = std::mem::size_of::<STARTUPINFOW>() as u32;
        if let Some(console) = spec.console {
            startup.dwXSize = console.width;
            startup.dwYSize = console.height;
            startup.dwFillAttribute = console.fill_attribute;
            if console.width != 0 || console.height != 0 {
                startup.dwFlags |= STARTF_USESIZE;
            }
            if console.fill_attribute != 0 {
                startup.dwFlags |= STARTF_USEFILLATTRIBUTE;
            }
        }

        // SAFETY: PROCESS_INFORMATION is an out parameter, zero is valid.
        let mut info: PROCESS_INFORMATION = unsafe { std::mem::zeroed() };

        debug!("CreateProcessW {:?}", String::from_utf16_lossy(&cmdline));

        // SAFETY: every pointer refers to a NUL-terminated buffer owned by
        // this frame. `cmdline` is mutable as CreateProcessW requires, and
        // `block` is a double-NUL terminated UTF-16 environment block.
        let created = unsafe {
            CreateProcessW(
                ptr::null(),
                cmdline.as_mut_ptr(),
                ptr::null(),
                ptr::null(),
                FALSE,
                CREATE_NEW_CONSOLE | CREATE_UNICODE_ENVIRONMENT,
                block.as_ptr().cast(),
                cwd.as_ptr(),
                &startup,
                &mut info,
            )
        };
        if created == 0 {
            return Err(NewtermError::platform(
                format!("starting {}", spec.program),
                io::Error::last_os_error().to_string(),
            ));
        }

        // SAFETY: both handles were just returned by CreateProcessW and are
        // not used afterwards.
        unsafe {
            CloseHandle(info.hThread);
            CloseHandle(info.hProcess);
        }

        Ok(info.dwProcessId)
    }
}

/// Reads the process environment block, including its drive entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentStrings;

impl EnvironmentSource for EnvironmentStrings {
    fn snapshot(&self) -> Result<EnvironmentSnapshot> {
        // SAFETY: GetEnvironmentStringsW returns a block of NUL-terminated
        // strings ending with an empty string. It is read up to that end and
        // released exactly once.
        let entries = unsafe {
            let block = GetEnvironmentStringsW();
            if block.is_null() {
                return Err(NewtermError::platform(
                    "reading the environment",
                    io::Error::last_os_error().to_string(),
                ));
            }

            let mut entries = Vec::new();
            let mut cursor = block;
            loop {
                let mut len = 0;
                while *cursor.add(len) != 0 {
                    len += 1;
                }
                if len == 0 {
                    break;
                }
                let entry = std::slice::from_raw_parts(cursor, len);
                entries.push(String::from_utf16_lossy(entry));
                cursor = cursor.add(len + 1);
            }

            FreeEnvironmentStringsW(block);
            entries
        };

        Ok(snapshot_from_entries(&entries))
    }
}

struct WindowSearch {
    pid: u32,
    found: Option<HWND>,
}

unsafe extern "system" fn match_process(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam is the address of the WindowSearch owned by
    // `find_window`, which outlives the EnumWindows call.
    let search = unsafe { &mut *(lparam as *mut WindowSearch) };
    let mut owner = 0u32;
    // SAFETY: hwnd comes from EnumWindows and `owner` is a valid out pointer.
    unsafe { GetWindowThreadProcessId(hwnd, &mut owner) };
    if owner == search.pid {
        search.found = Some(hwnd);
        return FALSE;
    }
    TRUE
}

/// Enumerates top-level windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopLevelWindows;

impl WindowTitler for TopLevelWindows {
    fn find_window(&self, pid: u32) -> Result<Option<WindowHandle>> {
        let mut search = WindowSearch { pid, found: None };
        // SAFETY: the callback only dereferences lparam as the WindowSearch
        // above. A FALSE return just means the callback stopped early.
        unsafe {
            EnumWindows(Some(match_process), &mut search as *mut WindowSearch as LPARAM);
        }
        Ok(search.found.map(|hwnd| WindowHandle(hwnd as isize)))
    }

    fn set_title(&self, window: WindowHandle, title: &str) -> Result<()> {
        let title = wide(title);
        // SAFETY: the handle came from `find_window`; a stale handle makes the
        // call fail rather than misbehave.
        let ok = unsafe { SetWindowTextW(window.0 as HWND, title.as_ptr()) };
        if ok == 0 {
            return Err(NewtermError::platform(
                "setting the console title",
                io::Error::last_os_error().to_string(),
            ));
        }
        Ok(())
    }
}

/// Preferences under `HKEY_CURRENT_USER`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryPreferences;

impl PreferenceStore for RegistryPreferences {
    fn key_exists(&self, key: &str) -> Result<bool> {
        match RegKey::predef(HKEY_CURRENT_USER).open_subkey(key) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(NewtermError::platform(
                format!("opening HKCU\\{}", key),
                e.to_string(),
            )),
        }
    }

    fn write_values(&self, key: &str, values: &[PreferenceValue]) -> Result<()> {
        let (subkey, _) = RegKey::predef(HKEY_CURRENT_USER)
            .create_subkey(key)
            .map_err(|e| NewtermError::platform(format!("creating HKCU\\{}", key), e.to_string()))?;

        for value in values {
            let written = match value.data {
                PreferenceData::Text(text) => subkey.set_value(value.name, &text),
                PreferenceData::Dword(number) => subkey.set_value(value.name, &number),
            };
            written.map_err(|e| {
                NewtermError::platform(format!("writing {} under HKCU\\{}", value.name, key), e.to_string())
            })?;
        }
        Ok(())
    }
}
