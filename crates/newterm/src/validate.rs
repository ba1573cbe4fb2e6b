//! Input validation at the library boundary.
//!
//! Callers such as editor plugins hand parameters over as JSON. Every
//! parameter is checked before any OS work happens, and a violation names the
//! parameter and the type that was actually received. OS strings coming from
//! the command line or the filesystem must be valid UTF-8.

use crate::error::{NewtermError, Result};
use crate::overlay::{EnvEdit, EnvironmentOverlay};
use crate::request::LaunchRequest;
use serde_json::{Map, Value};
use std::ffi::OsStr;

/// User-readable name of a JSON value's type.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Convert an OS string to text, rejecting invalid UTF-8.
pub fn text_from_os(value: &OsStr, param: &str) -> Result<String> {
    value.to_str().map(str::to_owned).ok_or_else(|| {
        NewtermError::validation(param, "a unicode string", "non-UTF-8 OS string")
    })
}

fn as_object<'a>(params: &'a Value, param: &str) -> Result<&'a Map<String, Value>> {
    params
        .as_object()
        .ok_or_else(|| NewtermError::validation(param, "an object", type_name(params)))
}

/// Fetch a parameter, accepting an optional camelCase alias.
fn lookup<'a>(params: &'a Map<String, Value>, name: &str, alias: Option<&str>) -> Option<&'a Value> {
    params
        .get(name)
        .or_else(|| alias.and_then(|alias| params.get(alias)))
}

/// A text parameter. `None` when absent or null and `allow_null` is set.
pub fn verify_text(value: Option<&Value>, param: &str, allow_null: bool) -> Result<Option<String>> {
    match value {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        None | Some(Value::Null) if allow_null => Ok(None),
        None => Err(NewtermError::validation(param, "a unicode string", "null")),
        Some(other) => Err(NewtermError::validation(
            param,
            if allow_null {
                "a unicode string or null"
            } else {
                "a unicode string"
            },
            type_name(other),
        )),
    }
}

/// A list of text values. Absent or null yields an empty list.
pub fn verify_text_list(value: Option<&Value>, param: &str) -> Result<Vec<String>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(NewtermError::validation(
                param,
                "a list of unicode strings",
                type_name(other),
            ))
        }
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(NewtermError::validation(
                param,
                "a list containing only unicode strings",
                type_name(other),
            )),
        })
        .collect()
}

/// An environment variable name: non-empty, without `=` or NUL.
pub fn verify_env_name(name: &str, param: &str) -> Result<()> {
    if name.is_empty() {
        return Err(NewtermError::validation(
            param,
            "an object with non-empty variable names",
            "empty name",
        ));
    }
    if name.contains(['=', '\0']) {
        return Err(NewtermError::validation(
            param,
            "variable names without '=' or NUL",
            format!("{:?}", name),
        ));
    }
    Ok(())
}

/// A mapping of text keys to text or null values. Null values become unsets.
pub fn verify_text_map(value: Option<&Value>, param: &str) -> Result<EnvironmentOverlay> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(EnvironmentOverlay::new()),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            return Err(NewtermError::validation(
                param,
                "an object of unicode strings",
                type_name(other),
            ))
        }
    };

    let mut overlay = EnvironmentOverlay::new();
    for (name, value) in entries {
        verify_env_name(name, param)?;
        let edit = match value {
            Value::String(s) => EnvEdit::Set(s.clone()),
            Value::Null => EnvEdit::Unset,
            other => {
                return Err(NewtermError::validation(
                    param,
                    "an object containing only unicode strings or null for values",
                    type_name(other),
                ))
            }
        };
        overlay.insert(name.clone(), edit);
    }
    Ok(overlay)
}

/// A positive integer that fits in `u32`.
pub fn verify_positive_int(value: Option<&Value>, param: &str) -> Result<Option<u32>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| NewtermError::validation(param, "a positive integer", n.to_string())),
        Some(other) => Err(NewtermError::validation(
            param,
            "a positive integer",
            type_name(other),
        )),
    }
}

/// A boolean flag.
pub fn verify_bool(value: Option<&Value>, param: &str) -> Result<Option<bool>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(NewtermError::validation(param, "a boolean", type_name(other))),
    }
}

/// Build a [`LaunchRequest`] from JSON parameters.
///
/// Recognised keys: `cwd` (required), `env`, `terminal`, `args`, `width`,
/// `use_tabs` (alias `useTabs`).
pub fn launch_request_from_params(params: &Value) -> Result<LaunchRequest> {
    let params = as_object(params, "params")?;

    let cwd = verify_text(lookup(params, "cwd", None), "cwd", false)?.unwrap_or_default();
    let environment = verify_text_map(lookup(params, "env", None), "env")?;
    let terminal = verify_text(lookup(params, "terminal", None), "terminal", true)?;
    let args = verify_text_list(lookup(params, "args", None), "args")?;
    let width = verify_positive_int(lookup(params, "width", None), "width")?;
    let use_tabs = verify_bool(lookup(params, "use_tabs", Some("useTabs")), "use_tabs")?;

    let mut request = LaunchRequest::new(cwd).with_environment(environment);
    request.terminal = terminal;
    request.extra_args = args;
    if let Some(width) = width {
        request.window_width = width;
    }
    if let Some(use_tabs) = use_tabs {
        request.use_tabs = use_tabs;
    }

    request.validate()?;
    Ok(request)
}

/// Parameters of a shell environment query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellQuery {
    pub shell_path: Option<String>,
    pub for_subprocess: bool,
}

/// Build a [`ShellQuery`] from JSON parameters: `shell` (optional) and
/// `for_subprocess` (alias `forSubprocess`).
pub fn shell_query_from_params(params: &Value) -> Result<ShellQuery> {
    let params = as_object(params, "params")?;
    Ok(ShellQuery {
        shell_path: verify_text(lookup(params, "shell", None), "shell", true)?,
        for_subprocess: verify_bool(
            lookup(params, "for_subprocess", Some("forSubprocess")),
            "for_subprocess",
        )?
        .unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn param_of(params: Value) -> String {
        launch_request_from_params(&params)
            .unwrap_err()
            .param()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_full_request() {
        let request = launch_request_from_params(&json!({
            "cwd": "/home/ada/project",
            "env": {"FOO": "bar", "EDITOR": null},
            "terminal": "konsole",
            "args": ["--new-tab"],
            "width": 800,
            "useTabs": true
        }))
        .unwrap();

        assert_eq!(request.working_directory, "/home/ada/project");
        assert_eq!(request.terminal.as_deref(), Some("konsole"));
        assert_eq!(request.extra_args, vec!["--new-tab"]);
        assert_eq!(request.window_width, 800);
        assert!(request.use_tabs);

        let edits: Vec<(&str, Option<&str>)> = request
            .environment
            .iter()
            .map(|(name, edit)| (name, edit.value()))
            .collect();
        assert!(edits.contains(&("FOO", Some("bar"))));
        assert!(edits.contains(&("EDITOR", None)));
    }

    #[test]
    fn test_minimal_request_uses_defaults() {
        let request = launch_request_from_params(&json!({"cwd": "/tmp", "terminal": null})).unwrap();
        assert_eq!(request.window_width, 1024);
        assert!(!request.use_tabs);
        assert!(request.terminal.is_none());
        assert!(request.extra_args.is_empty());
    }

    #[test]
    fn test_rejects_non_text_cwd() {
        assert_eq!(param_of(json!({"cwd": 42})), "cwd");
        assert_eq!(param_of(json!({"cwd": null})), "cwd");
        assert_eq!(param_of(json!({})), "cwd");

        let err = launch_request_from_params(&json!({"cwd": ["/tmp"]})).unwrap_err();
        assert_eq!(err.to_string(), "cwd must be a unicode string, not array");
    }

    #[test]
    fn test_rejects_non_text_terminal() {
        assert_eq!(param_of(json!({"cwd": "/tmp", "terminal": true})), "terminal");
        let err = launch_request_from_params(&json!({"cwd": "/tmp", "terminal": 1})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "terminal must be a unicode string or null, not number"
        );
    }

    #[test]
    fn test_rejects_bad_args() {
        assert_eq!(param_of(json!({"cwd": "/tmp", "args": "--flag"})), "args");
        let err =
            launch_request_from_params(&json!({"cwd": "/tmp", "args": ["ok", 3]})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "args must be a list containing only unicode strings, not number"
        );
    }

    #[test]
    fn test_rejects_bad_env() {
        assert_eq!(param_of(json!({"cwd": "/tmp", "env": ["FOO"]})), "env");
        let err = launch_request_from_params(&json!({"cwd": "/tmp", "env": {"FOO": 1}}))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().ends_with("not number"));
    }

    #[test]
    fn test_rejects_bad_width_and_tabs() {
        assert_eq!(param_of(json!({"cwd": "/tmp", "width": -5})), "width");
        assert_eq!(param_of(json!({"cwd": "/tmp", "width": "wide"})), "width");
        assert_eq!(param_of(json!({"cwd": "/tmp", "use_tabs": "yes"})), "use_tabs");
    }

    #[test]
    fn test_rejects_non_object_params() {
        assert_eq!(param_of(json!(["/tmp"])), "params");
    }

    #[cfg(unix)]
    #[test]
    fn test_text_from_os_rejects_invalid_utf8() {
        use std::os::unix::ffi::OsStrExt;

        let bad = OsStr::from_bytes(b"/tmp/\xff");
        let err = text_from_os(bad, "cwd").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cwd must be a unicode string, not non-UTF-8 OS string"
        );
        assert_eq!(text_from_os(OsStr::new("/tmp"), "cwd").unwrap(), "/tmp");
    }

    #[test]
    fn test_env_keeps_caller_order() {
        let request = launch_request_from_params(&json!({
            "cwd": "/tmp",
            "env": {"ZED": "1", "ALPHA": "2", "MID": null}
        }))
        .unwrap();
        let names: Vec<&str> = request.environment.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["ZED", "ALPHA", "MID"]);
    }

    #[test]
    fn test_env_names_checked() {
        for name in ["", "A=B", "X\0Y"] {
            let mut env = Map::new();
            env.insert(name.to_string(), json!("x"));
            let err = launch_request_from_params(&json!({"cwd": "/tmp", "env": env})).unwrap_err();
            assert_eq!(err.param(), Some("env"), "{name:?}");
        }
        assert!(verify_env_name("X;touch /tmp/owned;Y", "env").is_ok());
    }

    #[test]
    fn test_shell_query() {
        let query = shell_query_from_params(&json!({"shell": "/bin/zsh", "forSubprocess": true}))
            .unwrap();
        assert_eq!(query.shell_path.as_deref(), Some("/bin/zsh"));
        assert!(query.for_subprocess);

        assert_eq!(shell_query_from_params(&json!({})).unwrap(), ShellQuery::default());

        let err = shell_query_from_params(&json!({"shell": 7})).unwrap_err();
        assert_eq!(err.param(), Some("shell"));
    }
}
