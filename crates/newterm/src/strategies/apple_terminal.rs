//! Terminal.app launching.

use super::applescript::{applescript_quote, cd_command, set_commands, ShellGrammar};
use crate::config::ScriptingConfig;
use crate::dispatch::{LaunchContext, LaunchOutcome};
use crate::error::Result;
use crate::request::LaunchRequest;
use tracing::info;

/// AppleScript that opens a new Terminal tab and changes into `dir`.
///
/// When Terminal is already running a ⌘T keystroke creates the tab. The
/// screen is cleared afterwards unless environment commands will follow.
pub fn new_tab_script(dir: &str, clear: bool) -> String {
    let app = ScriptingConfig::TERMINAL_APPLICATION;
    let cd = format!(
        "do script {} in window 1",
        applescript_quote(&cd_command(dir))
    );
    let clear = if clear {
        "do script \"clear\" in window 1"
    } else {
        ""
    };

    format!(
        r#"tell application "System Events"
    if (count(processes whose name is "{app}")) is 0 then
        tell application "{app}"
            activate
        end tell
    else
        tell application "{app}"
            activate
        end tell
        tell application "System Events" to tell process "{app}" to keystroke "t" using command down
    end if
    tell application "{app}"
        {cd}
        {clear}
    end tell
end tell"#
    )
}

/// AppleScript that types `commands` into the front Terminal window, then
/// clears it.
pub fn environment_script(commands: &[String]) -> String {
    let app = ScriptingConfig::TERMINAL_APPLICATION;
    let lines: Vec<String> = commands
        .iter()
        .map(|command| format!("do script {} in window 1", applescript_quote(command)))
        .collect();
    let lines = lines.join("\n            ");

    format!(
        r#"try
    tell application "System Events"
        tell application "{app}"
            {lines}
            do script "clear" in window 1
        end tell
    end tell
end try"#
    )
}

/// Open Terminal.app at the request's directory.
pub fn launch(request: &LaunchRequest, ctx: &LaunchContext<'_>) -> Result<LaunchOutcome> {
    let dir = request.working_directory.as_str();

    // Resolve the grammar up front so a lookup failure opens no window.
    let commands = if request.environment.is_empty() {
        Vec::new()
    } else {
        let shell = ctx.adapters.login_shell.login_shell()?;
        set_commands(&request.environment, ShellGrammar::from_shell_path(&shell))?
    };

    if request.use_tabs {
        ctx.adapters
            .scripting
            .run(&new_tab_script(dir, commands.is_empty()))?;
    } else {
        ctx.adapters
            .scripting
            .open_with_application(dir, ScriptingConfig::TERMINAL_APPLICATION)?;
    }

    if !commands.is_empty() {
        ctx.adapters.scripting.run(&environment_script(&commands))?;
    }

    info!("Opened Terminal.app at {}", dir);
    Ok(LaunchOutcome::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tab_script_quotes_directory() {
        let script = new_tab_script("/Users/ada/it's \"here\"", true);
        assert!(script.contains(
            r#"do script "cd '/Users/ada/it'\\''s \"here\"'" in window 1"#
        ));
        assert!(script.contains("keystroke \"t\" using command down"));
        assert!(script.contains("do script \"clear\" in window 1"));
    }

    #[test]
    fn test_new_tab_script_skips_clear_when_env_follows() {
        let script = new_tab_script("/tmp", false);
        assert!(!script.contains("\"clear\""));
    }

    #[test]
    fn test_environment_script_lines() {
        let script = environment_script(&["export FOO='bar'".to_string(), "unset -v BAZ".to_string()]);
        assert!(script.starts_with("try"));
        assert!(script.ends_with("end try"));
        let foo = script.find("do script \"export FOO='bar'\" in window 1").unwrap();
        let baz = script.find("do script \"unset -v BAZ\" in window 1").unwrap();
        let clear = script.find("do script \"clear\" in window 1").unwrap();
        assert!(foo < baz && baz < clear);
    }
}
