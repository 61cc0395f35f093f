use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trellis_editor::model::ElementType;
use trellis_editor::NormalizerContext;

pub const DEFAULT_CONFIG_NAME: &str = "trellis.config.json";

/// Trellis configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Restricted element types this project permits
    #[serde(default)]
    pub allowed_elements: Vec<ElementType>,

    /// Pretty-print JSON and HTML output
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allowed_elements: Vec::new(),
            pretty: default_pretty(),
        }
    }
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Load the config next to a document, or from the working directory
    pub fn for_document(document: &Path) -> anyhow::Result<Self> {
        let dir = match document.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        Self::load(&dir)
    }

    /// Normalizer context with the configured allow-list plus any extras
    pub fn context(&self, extra: &[String]) -> NormalizerContext {
        let extra = extra.iter().map(|name| ElementType::from_name(name));
        NormalizerContext::allowing(self.allowed_elements.iter().cloned().chain(extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trellis-config-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = temp_dir("missing");
        let config = Config::load(&dir).unwrap();
        assert!(config.allowed_elements.is_empty());
        assert!(config.pretty);
    }

    #[test]
    fn test_default_matches_empty_config_file() {
        let parsed: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, Config::default());
        assert!(Config::default().pretty);
    }

    #[test]
    fn test_load_camel_case_config() {
        let dir = temp_dir("camel");
        std::fs::write(
            dir.join(DEFAULT_CONFIG_NAME),
            r#"{"allowedElements": ["input_ref"], "pretty": false}"#,
        )
        .unwrap();

        let config = Config::load(&dir).unwrap();
        assert_eq!(config.allowed_elements, vec![ElementType::InputRef]);
        assert!(!config.pretty);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_context_merges_extra_types() {
        let config = Config::default();
        let context = config.context(&["input_ref".to_string()]);
        assert!(context.allows(&ElementType::InputRef));
        assert!(!context.is_restricted(&ElementType::InputRef));
    }
}
