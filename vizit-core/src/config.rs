//! Configuration management
//!
//! Reads the optional `settings.json` from the vizit directory and
//! resolves the Firebase project id from the places operators expect:
//! explicit flag, environment, settings file, then `.firebaserc` in the
//! working directory.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Collection visits are stored in unless overridden.
pub const DEFAULT_COLLECTION: &str = "visits";

/// Procedure name used when a row does not carry one.
pub const DEFAULT_PROCEDURE: &str = "Консультація";

/// Operator settings, read from `settings.json`. Every field is
/// optional; flags and environment variables take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub project_id: Option<String>,
    pub collection: Option<String>,
    pub default_procedure: Option<String>,
    pub default_uid: Option<String>,
}

impl Config {
    /// Load config from the vizit directory. A missing or malformed
    /// file yields the defaults.
    pub fn load(vizit_dir: &Path) -> Result<Self> {
        let settings_path = vizit_dir.join("settings.json");

        if !settings_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&settings_path)?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    pub fn collection(&self) -> &str {
        self.collection.as_deref().unwrap_or(DEFAULT_COLLECTION)
    }

    pub fn default_procedure(&self) -> &str {
        self.default_procedure
            .as_deref()
            .unwrap_or(DEFAULT_PROCEDURE)
    }
}

/// Resolve the Firebase project id.
///
/// Order: explicit flag, `FIREBASE_PROJECT_ID`, `GOOGLE_CLOUD_PROJECT`,
/// `GCLOUD_PROJECT`, the settings file, then `projects.default` from a
/// `.firebaserc` in the working directory.
pub fn resolve_project_id(
    explicit: Option<&str>,
    config: &Config,
    working_dir: &Path,
) -> Option<String> {
    if let Some(id) = non_empty(explicit) {
        return Some(id);
    }

    for var in ["FIREBASE_PROJECT_ID", "GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"] {
        if let Some(id) = non_empty(std::env::var(var).ok().as_deref()) {
            return Some(id);
        }
    }

    if let Some(id) = non_empty(config.project_id.as_deref()) {
        return Some(id);
    }

    project_id_from_firebaserc(working_dir)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Read `projects.default` from `.firebaserc`.
fn project_id_from_firebaserc(working_dir: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(working_dir.join(".firebaserc")).ok()?;
    let parsed: serde_json::Value = serde_json::from_str(&raw).ok()?;
    non_empty(parsed.get("projects")?.get("default")?.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.project_id, None);
        assert_eq!(config.collection(), "visits");
        assert_eq!(config.default_procedure(), "Консультація");
    }

    #[test]
    fn test_load_reads_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{ "projectId": "demo-project", "collection": "visits_test", "defaultUid": "uid-1" }"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.project_id.as_deref(), Some("demo-project"));
        assert_eq!(config.collection(), "visits_test");
        assert_eq!(config.default_uid.as_deref(), Some("uid-1"));
    }

    #[test]
    fn test_load_tolerates_malformed_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{broken").unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.project_id, None);
    }

    #[test]
    fn test_explicit_project_id_wins() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            project_id: Some("from-config".to_string()),
            ..Default::default()
        };

        let resolved = resolve_project_id(Some("from-flag"), &config, dir.path());
        assert_eq!(resolved.as_deref(), Some("from-flag"));
    }

    #[test]
    fn test_blank_explicit_project_id_is_ignored() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            project_id: Some("from-config".to_string()),
            ..Default::default()
        };

        let resolved = resolve_project_id(Some("   "), &config, dir.path());
        assert_eq!(resolved.as_deref(), Some("from-config"));
    }

    #[test]
    fn test_project_id_from_firebaserc() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".firebaserc"),
            r#"{ "projects": { "default": "rc-project" } }"#,
        )
        .unwrap();

        assert_eq!(
            project_id_from_firebaserc(dir.path()).as_deref(),
            Some("rc-project")
        );
        // malformed file is treated as absent
        std::fs::write(dir.path().join(".firebaserc"), "{broken").unwrap();
        assert_eq!(project_id_from_firebaserc(dir.path()), None);
    }

    #[test]
    fn test_config_project_id_beats_firebaserc() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".firebaserc"),
            r#"{ "projects": { "default": "rc-project" } }"#,
        )
        .unwrap();
        let config = Config {
            project_id: Some("from-config".to_string()),
            ..Default::default()
        };

        let resolved = resolve_project_id(None, &config, dir.path());
        assert_eq!(resolved.as_deref(), Some("from-config"));
    }
}
