//! Container settings.
//!
//! Settings are plain data and deserialize with serde, so applications can
//! keep them next to the rest of their configuration.

use serde::Deserialize;

/// Per-container settings.
///
/// ```
/// use kasl_container::settings::ContainerSettings;
///
/// let settings = ContainerSettings::default()
///     .with_label("app")
///     .with_reserved_name("shutdown");
/// assert_eq!(settings.label.as_deref(), Some("app"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerSettings {
    /// Shown in `Debug` output and attached to tracing spans.
    pub label: Option<String>,

    /// Names reserved for this container on top of the built-in
    /// registration operation names.
    pub reserved_names: Vec<String>,
}

impl ContainerSettings {
    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Reserves one more name.
    pub fn with_reserved_name(mut self, name: impl Into<String>) -> Self {
        self.reserved_names.push(name.into());
        self
    }

    /// Returns `true` if `name` is reserved, built-in or configured.
    pub fn is_reserved(&self, name: &str) -> bool {
        kasl_support::naming::is_reserved(name) || self.reserved_names.iter().any(|r| r == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reserve_builtins_only() {
        let settings = ContainerSettings::default();
        assert!(settings.is_reserved("inject"));
        assert!(settings.is_reserved("inject_container"));
        assert!(!settings.is_reserved("shutdown"));
        assert_eq!(settings.label, None);
    }

    #[test]
    fn configured_names_are_reserved() {
        let settings = ContainerSettings::default().with_reserved_name("shutdown");
        assert!(settings.is_reserved("shutdown"));
    }

    #[test]
    fn deserialize_from_json() {
        let settings: ContainerSettings =
            serde_json::from_str(r#"{ "label": "app", "reserved_names": ["health"] }"#).unwrap();
        assert_eq!(settings.label.as_deref(), Some("app"));
        assert!(settings.is_reserved("health"));
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let settings: ContainerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ContainerSettings::default());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result = serde_json::from_str::<ContainerSettings>(r#"{ "allow_override": true }"#);
        assert!(result.is_err());
    }
}
