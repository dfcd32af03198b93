//! Configuration management for redmine-release
//!
//! Settings live in a YAML file under `~/.config/redmine-release/` and are
//! read once at startup. Only the `config` subcommand writes the file back.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The name of the package, used for config directory naming
const PKG_NAME: &str = "redmine-release";

/// Subject template applied to release issues when none is configured.
/// The release number replaces the `%s` marker.
pub const DEFAULT_SUBJECT_TEMPLATE: &str = "Релиз %s";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub redmine: RedmineSection,
    pub project: ProjectSection,
    pub release: ReleaseSection,
}

/// Connection settings for the Redmine server.
///
/// Either `token` must be set, or both `username` and `password`.
#[derive(Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedmineSection {
    pub host: String,
    pub username: String,
    pub password: String,
    pub token: String,
}

impl fmt::Debug for RedmineSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedmineSection")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Numeric project id or identifier slug, passed through to the API as-is.
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseSection {
    /// Tracker that release issues are created under.
    pub tracker_id: Option<u32>,

    /// Status id that marks a release as published.
    pub done_status_id: Option<u32>,

    /// Subject template for release issues, with a single `%s` marker.
    pub subject: String,

    /// Custom field ids (as strings) to surface in the release wizard.
    /// Empty means every promptable field is surfaced.
    pub filter_custom_fields: Vec<String>,
}

impl Default for ReleaseSection {
    fn default() -> Self {
        Self {
            tracker_id: None,
            done_status_id: None,
            subject: DEFAULT_SUBJECT_TEMPLATE.to_string(),
            filter_custom_fields: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from the given file, falling back to defaults
    /// when the file does not exist yet.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the given file, creating parent directories
    /// as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_yaml::to_string(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// The Redmine host, checked for presence.
    pub fn host(&self) -> Result<&str> {
        if self.redmine.host.is_empty() {
            return Err(Error::Config(
                "redmine.host is not set, run `redmine-release config` first".into(),
            ));
        }
        Ok(&self.redmine.host)
    }

    /// The configured project, checked for presence.
    pub fn project_id(&self) -> Result<&str> {
        if self.project.id.is_empty() {
            return Err(Error::Config("project.id is not set".into()));
        }
        Ok(&self.project.id)
    }

    /// The release tracker id, checked for presence.
    pub fn tracker_id(&self) -> Result<u32> {
        self.release
            .tracker_id
            .ok_or_else(|| Error::Config("release.tracker_id is not set".into()))
    }

    /// The done status id, checked for presence.
    pub fn done_status_id(&self) -> Result<u32> {
        self.release
            .done_status_id
            .ok_or_else(|| Error::Config("release.done_status_id is not set".into()))
    }

    /// Subject template for release issues.
    pub fn subject_template(&self) -> &str {
        if self.release.subject.is_empty() {
            DEFAULT_SUBJECT_TEMPLATE
        } else {
            &self.release.subject
        }
    }

    /// Custom field ids to surface in the release wizard.
    /// Entries that do not parse as ids are skipped with a warning.
    pub fn filter_custom_field_ids(&self) -> Vec<u32> {
        self.release
            .filter_custom_fields
            .iter()
            .filter_map(|raw| match raw.trim().parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!("ignoring non-numeric custom field id {:?} in config", raw);
                    None
                }
            })
            .collect()
    }
}

/// Resolve the default config file path: `~/.config/redmine-release/config.yaml`
pub fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("HOME environment variable not set".into()))?;

    Ok(PathBuf::from(home)
        .join(".config")
        .join(PKG_NAME)
        .join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let config = Config::load(&path).unwrap();

        assert!(config.redmine.host.is_empty());
        assert_eq!(config.subject_template(), DEFAULT_SUBJECT_TEMPLATE);
        assert!(config.release.tracker_id.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.redmine.host = "https://redmine.example.com".to_string();
        config.redmine.token = "secret".to_string();
        config.project.id = "billing".to_string();
        config.release.tracker_id = Some(7);
        config.release.done_status_id = Some(5);
        config.release.subject = "Release %s".to_string();
        config.release.filter_custom_fields = vec!["12".to_string(), "15".to_string()];

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded.redmine.host, "https://redmine.example.com");
        assert_eq!(loaded.redmine.token, "secret");
        assert_eq!(loaded.project.id, "billing");
        assert_eq!(loaded.release.tracker_id, Some(7));
        assert_eq!(loaded.release.done_status_id, Some(5));
        assert_eq!(loaded.subject_template(), "Release %s");
        assert_eq!(loaded.filter_custom_field_ids(), vec![12, 15]);
    }

    #[test]
    fn test_load_partial_file_applies_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "redmine:\n  host: http://localhost\n").unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.redmine.host, "http://localhost");
        assert_eq!(config.subject_template(), DEFAULT_SUBJECT_TEMPLATE);
        assert!(config.release.filter_custom_fields.is_empty());
    }

    #[test]
    fn test_filter_custom_field_ids_skips_garbage() {
        let mut config = Config::default();
        config.release.filter_custom_fields =
            vec!["3".to_string(), "abc".to_string(), " 8 ".to_string()];

        assert_eq!(config.filter_custom_field_ids(), vec![3, 8]);
    }

    #[test]
    fn test_missing_required_settings_are_reported() {
        let config = Config::default();

        assert!(config.host().is_err());
        assert!(config.project_id().is_err());
        assert!(config.tracker_id().is_err());
        assert!(config.done_status_id().is_err());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let mut config = Config::default();
        config.redmine.password = "hunter2".to_string();
        config.redmine.token = "abcdef".to_string();

        let printed = format!("{:?}", config.redmine);

        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("abcdef"));
        assert!(printed.contains("[REDACTED]"));
    }
}
