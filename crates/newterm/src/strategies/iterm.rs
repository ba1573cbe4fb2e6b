//! iTerm.app launching.

use super::applescript::{applescript_quote, cd_command, set_commands, ShellGrammar};
use crate::config::ScriptingConfig;
use crate::dispatch::{LaunchContext, LaunchOutcome};
use crate::error::{NewtermError, Result};
use crate::request::LaunchRequest;
use tracing::{debug, info};

/// Asks System Events how many iTerm processes are running.
pub fn running_count_script() -> String {
    format!(
        r#"tell application "System Events"
    count(processes whose name is "{}")
end tell"#,
        ScriptingConfig::ITERM_APPLICATION
    )
}

/// Commands typed into the new session: a blank write to wake it, a short
/// pause for the prompt, environment commands, `cd`, `clear`.
pub fn session_body(dir: &str, commands: &[String]) -> String {
    let mut lines = vec![
        "write \"\"".to_string(),
        format!("delay {}", ScriptingConfig::ITERM_PROMPT_DELAY),
    ];
    lines.extend(
        commands
            .iter()
            .map(|command| format!("write text {}", applescript_quote(command))),
    );
    lines.push(format!("write text {}", applescript_quote(&cd_command(dir))));
    lines.push("write text \"clear\"".to_string());
    lines.join("\n                ")
}

/// Where the new session goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTarget {
    /// iTerm was not running: use the session it opens on activation.
    Fresh,
    /// A new tab in the current terminal window.
    Tab,
    /// A new terminal window.
    Window,
}

impl SessionTarget {
    pub fn choose(running: i64, use_tabs: bool) -> Self {
        if running < 1 {
            SessionTarget::Fresh
        } else if use_tabs {
            SessionTarget::Tab
        } else {
            SessionTarget::Window
        }
    }
}

/// Full AppleScript for `target` running `body` in the session.
pub fn launch_script(target: SessionTarget, body: &str) -> String {
    let app = ScriptingConfig::ITERM_APPLICATION;
    let profile = ScriptingConfig::ITERM_SESSION_PROFILE;
    match target {
        SessionTarget::Fresh => format!(
            r#"tell application "{app}"
    activate
    set term to current terminal
    tell term
        tell the last session
                {body}
        end tell
    end tell
end tell"#
        ),
        SessionTarget::Tab => format!(
            r#"tell application "{app}"
    if (count of terminals) = 0 then
        set term to (make new terminal)
    else
        set term to current terminal
    end if
    tell term
        launch session "{profile}"
        tell the last session
                {body}
        end tell
    end tell
end tell"#
        ),
        SessionTarget::Window => format!(
            r#"tell application "{app}"
    set term to (make new terminal)
    tell term
        launch session "{profile}"
        tell the last session
                {body}
        end tell
    end tell
end tell"#
        ),
    }
}

fn parse_count(reply: &str) -> Result<i64> {
    reply.trim().parse::<i64>().map_err(|_| {
        NewtermError::platform(
            "counting iTerm processes",
            format!("unexpected reply {:?}", reply),
        )
    })
}

/// Open an iTerm session at the request's directory.
pub fn launch(request: &LaunchRequest, ctx: &LaunchContext<'_>) -> Result<LaunchOutcome> {
    let commands = if request.environment.is_empty() {
        Vec::new()
    } else {
        let shell = ctx.adapters.login_shell.login_shell()?;
        set_commands(&request.environment, ShellGrammar::from_shell_path(&shell))?
    };
    let body = session_body(&request.working_directory, &commands);

    let running = parse_count(&ctx.adapters.scripting.run(&running_count_script())?)?;
    let target = SessionTarget::choose(running, request.use_tabs);
    debug!("iTerm processes: {}, opening {:?}", running, target);

    ctx.adapters.scripting.run(&launch_script(target, &body))?;

    info!("Opened iTerm at {}", request.working_directory);
    Ok(LaunchOutcome::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_body_order() {
        let body = session_body("/tmp/x", &["export A='1'".to_string()]);
        let lines: Vec<&str> = body.lines().map(str::trim).collect();
        assert_eq!(
            lines,
            vec![
                "write \"\"",
                "delay 0.25",
                "write text \"export A='1'\"",
                "write text \"cd '/tmp/x'\"",
                "write text \"clear\"",
            ]
        );
    }

    #[test]
    fn test_target_choice() {
        assert_eq!(SessionTarget::choose(0, true), SessionTarget::Fresh);
        assert_eq!(SessionTarget::choose(0, false), SessionTarget::Fresh);
        assert_eq!(SessionTarget::choose(1, true), SessionTarget::Tab);
        assert_eq!(SessionTarget::choose(2, false), SessionTarget::Window);
    }

    #[test]
    fn test_launch_scripts() {
        let fresh = launch_script(SessionTarget::Fresh, "BODY");
        assert!(fresh.contains("activate"));
        assert!(fresh.contains("set term to current terminal"));
        assert!(!fresh.contains("launch session"));

        let tab = launch_script(SessionTarget::Tab, "BODY");
        assert!(tab.contains("if (count of terminals) = 0 then"));
        assert!(tab.contains("launch session \"Default Session\""));

        let window = launch_script(SessionTarget::Window, "BODY");
        assert!(window.contains("set term to (make new terminal)"));
        assert!(!window.contains("current terminal"));

        for script in [fresh, tab, window] {
            assert!(script.contains("tell the last session"));
            assert!(script.contains("BODY"));
        }
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("2\n").unwrap(), 2);
        assert!(matches!(
            parse_count("missing value"),
            Err(NewtermError::Platform { .. })
        ));
    }
}
