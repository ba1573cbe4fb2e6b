//! Environment overlays: ordered edits applied on top of a base environment.
//!
//! Applying an overlay always produces a new map. The base passed in is only
//! read, so repeated or concurrent launches never see each other's edits.

use std::collections::BTreeMap;

/// A single edit to an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvEdit {
    /// Set or overwrite the variable.
    Set(String),
    /// Remove the variable if present.
    Unset,
}

impl EnvEdit {
    /// The replacement value, or `None` for an unset.
    pub fn value(&self) -> Option<&str> {
        match self {
            EnvEdit::Set(value) => Some(value),
            EnvEdit::Unset => None,
        }
    }
}

impl From<Option<String>> for EnvEdit {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(value) => EnvEdit::Set(value),
            None => EnvEdit::Unset,
        }
    }
}

/// Insertion-ordered set of environment edits.
///
/// Editing a name that is already present replaces the earlier edit but keeps
/// its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentOverlay {
    entries: Vec<(String, EnvEdit)>,
}

impl EnvironmentOverlay {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit for `name`.
    pub fn insert(&mut self, name: impl Into<String>, edit: impl Into<EnvEdit>) {
        let name = name.into();
        let edit = edit.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = edit,
            None => self.entries.push((name, edit)),
        }
    }

    /// Set `name` to `value`.
    pub fn with_set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, EnvEdit::Set(value.into()));
        self
    }

    /// Remove `name`.
    pub fn with_unset(mut self, name: impl Into<String>) -> Self {
        self.insert(name, EnvEdit::Unset);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over the edits in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnvEdit)> {
        self.entries.iter().map(|(name, edit)| (name.as_str(), edit))
    }

    /// Apply the overlay to a copy of `base`.
    pub fn apply(&self, base: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut env = base.clone();
        for (name, edit) in &self.entries {
            match edit {
                EnvEdit::Set(value) => {
                    env.insert(name.clone(), value.clone());
                }
                EnvEdit::Unset => {
                    env.remove(name);
                }
            }
        }
        env
    }

    /// Apply the overlay to a copy of `base`, treating names
    /// case-insensitively as Windows does. Every name in the result is upper
    /// case.
    pub fn apply_case_insensitive(
        &self,
        base: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut env: BTreeMap<String, String> = base
            .iter()
            .map(|(name, value)| (name.to_uppercase(), value.clone()))
            .collect();
        for (name, edit) in &self.entries {
            let name = name.to_uppercase();
            match edit {
                EnvEdit::Set(value) => {
                    env.insert(name, value.clone());
                }
                EnvEdit::Unset => {
                    env.remove(&name);
                }
            }
        }
        env
    }
}

/// A process environment as captured from the operating system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    /// Windows only: the leading `=C:=C:\...` per-drive directory entry,
    /// copied through to new processes untouched.
    pub drive_entry: Option<String>,
    /// Variable names and values.
    pub vars: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    /// Create a snapshot without a drive entry.
    pub fn from_vars(vars: BTreeMap<String, String>) -> Self {
        Self {
            drive_entry: None,
            vars,
        }
    }

    /// Apply `overlay` to a copy of this snapshot.
    pub fn overlaid(&self, overlay: &EnvironmentOverlay, case_insensitive: bool) -> Self {
        let vars = if case_insensitive {
            overlay.apply_case_insensitive(&self.vars)
        } else {
            overlay.apply(&self.vars)
        };
        Self {
            drive_entry: self.drive_entry.clone(),
            vars,
        }
    }

    /// Look up a variable by exact name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for EnvironmentOverlay
where
    K: Into<String>,
    V: Into<EnvEdit>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut overlay = Self::new();
        for (name, edit) in iter {
            overlay.insert(name, edit);
        }
        overlay
    }
}
