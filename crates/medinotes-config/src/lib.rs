use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field} in {config_path}: {reason}")]
    InvalidValue {
        config_path: PathBuf,
        field: &'static str,
        reason: String,
    },
}

/// Editing behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSection {
    /// Undo depth; 0 disables undo
    pub history_limit: usize,
    /// Pointer travel before a pressed block handle starts a drag
    pub drag_threshold: f32,
}

impl Default for EditorSection {
    fn default() -> Self {
        Self {
            history_limit: 100,
            drag_threshold: 3.0,
        }
    }
}

/// Floating formatting menu placement, in the host's layout units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuSection {
    pub gap: f32,
    pub gutter: f32,
}

impl Default for MenuSection {
    fn default() -> Self {
        Self {
            gap: 1.0,
            gutter: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory that relative notebook paths are resolved against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_path: Option<PathBuf>,
    #[serde(default)]
    pub editor: EditorSection,
    #[serde(default)]
    pub menu: MenuSection,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        config.validate(config_path)?;

        // Expand shell variables and tilde in the loaded notes path
        config.notes_path = config
            .notes_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    /// Load the user's config, falling back to defaults when there is none
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        Ok(Self::load_from_path(&config_path)?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        PathBuf::from(shellexpand::tilde("~/.config/medinotes").as_ref())
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Resolve a notebook path given on the command line. Relative paths are
    /// taken from `notes_path` when one is configured.
    pub fn resolve_document(&self, path: &Path) -> PathBuf {
        let path = Self::expand_path(path).unwrap_or_else(|| path.to_path_buf());
        match &self.notes_path {
            Some(notes) if path.is_relative() => notes.join(path),
            _ => path,
        }
    }

    fn validate(&self, config_path: &Path) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| ConfigError::InvalidValue {
            config_path: config_path.to_path_buf(),
            field,
            reason: reason.to_string(),
        };
        if !self.editor.drag_threshold.is_finite() || self.editor.drag_threshold < 0.0 {
            return Err(invalid(
                "editor.drag_threshold",
                "must be a non-negative number",
            ));
        }
        if !self.menu.gap.is_finite() || self.menu.gap < 0.0 {
            return Err(invalid("menu.gap", "must be a non-negative number"));
        }
        if !self.menu.gutter.is_finite() || self.menu.gutter < 0.0 {
            return Err(invalid("menu.gutter", "must be a non-negative number"));
        }
        Ok(())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/medinotes/config.toml"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.editor.history_limit, 100);
        assert_eq!(config.editor.drag_threshold, 3.0);
        assert_eq!(config.menu.gap, 1.0);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[editor]
drag_threshold = 5.0

[menu]
gutter = 2.0
"#,
        )
        .unwrap();
        assert_eq!(config.editor.history_limit, 100);
        assert_eq!(config.editor.drag_threshold, 5.0);
        assert_eq!(config.menu.gap, 1.0);
        assert_eq!(config.menu.gutter, 2.0);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            notes_path: Some(PathBuf::from("/tmp/test-notes")),
            editor: EditorSection {
                history_limit: 20,
                drag_threshold: 4.0,
            },
            menu: MenuSection::default(),
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path(&PathBuf::from("~/test/path")).unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("MEDINOTES_TEST_VAR", "/test/env/path");
        }

        let expanded = Config::expand_path(&PathBuf::from("$MEDINOTES_TEST_VAR/subdir"));
        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("MEDINOTES_TEST_VAR");
        }
    }

    #[test]
    fn test_resolve_document_against_notes_path() {
        let config = Config {
            notes_path: Some(PathBuf::from("/srv/notes")),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_document(Path::new("cardio.json")),
            PathBuf::from("/srv/notes/cardio.json")
        );
        assert_eq!(
            config.resolve_document(Path::new("/tmp/x.json")),
            PathBuf::from("/tmp/x.json")
        );
        assert_eq!(
            Config::default().resolve_document(Path::new("cardio.json")),
            PathBuf::from("cardio.json")
        );
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_rejects_negative_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[editor]\ndrag_threshold = -1.0\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "editor.drag_threshold",
                ..
            }
        ));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[editor\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            notes_path: Some(PathBuf::from("/tmp/test-notes")),
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_notes_path_with_tilde_is_expanded_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "notes_path = \"~/test/notes\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        let notes = config.notes_path.unwrap();
        assert!(!notes.to_string_lossy().starts_with('~'));
        assert!(notes.to_string_lossy().ends_with("test/notes"));
    }
}
