use listweave_model::{Schema, SchemaError};
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

    #[error("Configured schema is invalid: {0}")]
    SchemaError(#[from] SchemaError),
}

/// The list kinds a command can create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[default]
    Bullet,
    Ordered,
}

impl ListKind {
    /// Name of the node type for this kind of list
    pub fn type_name(self) -> &'static str {
        match self {
            ListKind::Bullet => "bullet_list",
            ListKind::Ordered => "ordered_list",
        }
    }
}

/// How list nodes are registered in the document schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Content expression for list items
    pub item_content: String,
    /// Group lists join. When empty, lists can only appear where a node
    /// names them explicitly.
    pub list_group: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            item_content: "paragraph block*".to_string(),
            list_group: "block".to_string(),
        }
    }
}

impl SchemaConfig {
    pub fn build_schema(&self) -> Result<Schema, ConfigError> {
        Ok(listweave_engine::schema::list_schema(
            &self.item_content,
            Some(self.list_group.as_str()).filter(|group| !group.is_empty()),
        )?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// List created by `wrap` when none is asked for
    pub default_list: ListKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema: SchemaConfig,
    pub commands: CommandConfig,
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

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
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

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/listweave");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Expand shell variables and tilde in a user supplied path
    pub fn expand_path(path: &Path) -> Option<PathBuf> {
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
        assert!(path_str.ends_with(".config/listweave/config.toml"));
    }

    #[test]
    fn test_defaults_match_the_default_schema() {
        let config = Config::default();

        assert_eq!(config.schema.item_content, "paragraph block*");
        assert_eq!(config.schema.list_group, "block");
        assert_eq!(config.commands.default_list, ListKind::Bullet);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config_content = r#"
[commands]
default_list = "ordered"
"#;

        let config: Config = toml::from_str(config_content).unwrap();

        assert_eq!(config.commands.default_list, ListKind::Ordered);
        assert_eq!(config.schema, SchemaConfig::default());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            schema: SchemaConfig {
                item_content: "paragraph*".to_string(),
                list_group: String::new(),
            },
            commands: CommandConfig {
                default_list: ListKind::Ordered,
            },
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_build_schema_registers_lists() {
        let schema = SchemaConfig::default().build_schema().unwrap();

        for name in ["ordered_list", "bullet_list", "list_item"] {
            assert!(schema.node_type(name).is_some(), "missing {name}");
        }
        assert!(schema.node_type("bullet_list").unwrap().is_in_group("block"));
    }

    #[test]
    fn test_empty_group_keeps_lists_out_of_blocks() {
        let config = SchemaConfig {
            list_group: String::new(),
            ..SchemaConfig::default()
        };

        let schema = config.build_schema().unwrap();

        assert!(schema.node_type("bullet_list").unwrap().groups().is_empty());
    }

    #[test]
    fn test_build_schema_reports_bad_content() {
        let config = SchemaConfig {
            item_content: "paragraph (".to_string(),
            list_group: "block".to_string(),
        };

        let err = config.build_schema().unwrap_err();

        assert!(matches!(err, ConfigError::SchemaError(_)));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("LISTWEAVE_TEST_DIR", "/test/env/path");
        }

        let path = PathBuf::from("$LISTWEAVE_TEST_DIR/config.toml");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/config.toml")));

        unsafe {
            env::remove_var("LISTWEAVE_TEST_DIR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_config_parse_error_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[schema\nitem_content = 1").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        match err {
            ConfigError::ConfigParseError { config_path, .. } => assert_eq!(config_path, config_file),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            commands: CommandConfig {
                default_list: ListKind::Ordered,
            },
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        assert!(config_file.exists(), "Config file should exist");

        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}
