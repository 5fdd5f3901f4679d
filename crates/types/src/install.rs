//! Install plan value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// What an install plan will do once executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallAction {
    /// No usable row exists; one will be created under the buildpacks lock
    Create,
    /// An existing row will receive the new artifact
    Upgrade,
}

impl InstallAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Upgrade => "upgrade",
        }
    }
}

impl fmt::Display for InstallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute updates applied to a buildpack after its artifact uploads.
///
/// `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

impl InstallOptions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.locked.is_none() && self.position.is_none()
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_toml_table() {
        let opts: InstallOptions = toml::from_str("enabled = false\nposition = 3\n").unwrap();
        assert_eq!(opts, InstallOptions::default().with_enabled(false).with_position(3));
        assert!(!opts.is_empty());
    }

    #[test]
    fn empty_options_serialize_to_empty_object() {
        let json = serde_json::to_string(&InstallOptions::default()).unwrap();
        assert_eq!(json, "{}");
        assert!(InstallOptions::default().is_empty());
    }

    #[test]
    fn action_display() {
        assert_eq!(InstallAction::Create.to_string(), "create");
        assert_eq!(
            serde_json::to_string(&InstallAction::Upgrade).unwrap(),
            r#""upgrade""#
        );
    }
}
