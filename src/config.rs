//! Configuration for typeslice.
//!
//! Configuration is optional. Without a file every key takes its default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::extract::{ExtractOptions, IgnoreList, RenderOptions, DEFAULT_IGNORED_INTERFACES};

/// Default config file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["typeslice.yaml", ".typeslice.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    /// Spaces per indentation level (default: 2)
    #[serde(default = "default_indent")]
    pub indent: usize,
    /// Prefix definitions with `export` and the namespace with
    /// `export declare` (default: false)
    #[serde(default)]
    pub export: bool,
    /// Glob patterns for interface names that are never extracted
    #[serde(default = "default_ignored_interfaces")]
    pub ignored_interfaces: Vec<String>,
    /// Fail when the entry point is not found (default: false)
    #[serde(default)]
    pub strict: bool,
    /// Extension of the written file (default: ".d.ts")
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_indent() -> usize {
    2
}

fn default_ignored_interfaces() -> Vec<String> {
    DEFAULT_IGNORED_INTERFACES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_extension() -> String {
    ".d.ts".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: String::new(),
            indent: default_indent(),
            export: false,
            ignored_interfaces: default_ignored_interfaces(),
            strict: false,
            extension: default_extension(),
        }
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config at `path`, or the first default-named file in `dir`,
    /// or the defaults when neither exists.
    pub fn load(path: Option<&Path>, dir: &Path) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => discover(dir),
        };
        match path {
            Some(p) => {
                let config = Self::parse_file(&p)
                    .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", p.display(), e))?;
                validate(&config)?;
                Ok((config, Some(p)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    pub fn extract_options(&self) -> anyhow::Result<ExtractOptions> {
        let ignored = IgnoreList::new(self.ignored_interfaces.as_slice())
            .map_err(|e| anyhow::anyhow!("invalid ignored_interfaces pattern: {}", e))?;
        Ok(ExtractOptions {
            ignored,
            strict: self.strict,
        })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            indent: self.indent,
            export: self.export,
        }
    }

    /// Path of the file written for `entry_point` under `dir`.
    pub fn output_path(&self, dir: &Path, entry_point: &str) -> PathBuf {
        dir.join(format!("{}{}", entry_point, self.extension))
    }
}

/// Find a default-named config file in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Validate a config for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if !(1..=8).contains(&config.indent) {
        anyhow::bail!("invalid indent {}, must be between 1 and 8", config.indent);
    }

    if config.extension.is_empty() {
        anyhow::bail!("extension must not be empty");
    }
    if config.extension.contains(['/', '\\']) {
        anyhow::bail!("invalid extension {:?}, must not contain path separators", config.extension);
    }

    // Validate ignored_interfaces glob patterns compile
    for pattern in &config.ignored_interfaces {
        globset::Glob::new(pattern).map_err(|e| {
            anyhow::anyhow!("invalid ignored_interfaces pattern {:?}: {}", pattern, e)
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
version: "1"
indent: 4
export: true
ignored_interfaces:
  - "Html*"
strict: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.indent, 4);
        assert!(config.export);
        assert!(config.strict);
        assert_eq!(config.ignored_interfaces, vec!["Html*".to_string()]);
        assert_eq!(config.extension, ".d.ts");
        validate(&config).unwrap();
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.indent, 2);
        assert!(!config.export);
        assert_eq!(config.ignored_interfaces.len(), 3);

        let options = config.extract_options().unwrap();
        assert!(options.ignored.is_ignored("Console"));
        assert!(!options.strict);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config {
            indent: 0,
            ..Default::default()
        };
        assert!(validate(&config).is_err());

        config.indent = 2;
        config.extension = String::new();
        assert!(validate(&config).is_err());

        config.extension = "../x".to_string();
        assert!(validate(&config).is_err());

        config.extension = ".ts".to_string();
        config.ignored_interfaces = vec!["[oops".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_output_path() {
        let config = Config::default();
        assert_eq!(
            config.output_path(Path::new("out"), "IntStudent"),
            Path::new("out").join("IntStudent.d.ts")
        );
    }

    #[test]
    fn test_load_discovers_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let (config, path) = Config::load(None, dir.path()).unwrap();
        assert!(path.is_none());
        assert_eq!(config.indent, 2);

        fs::write(dir.path().join(".typeslice.yaml"), "indent: 3\n").unwrap();
        let (config, path) = Config::load(None, dir.path()).unwrap();
        assert_eq!(path, Some(dir.path().join(".typeslice.yaml")));
        assert_eq!(config.indent, 3);

        fs::write(dir.path().join("bad.yaml"), "indent: 12\n").unwrap();
        assert!(Config::load(Some(&dir.path().join("bad.yaml")), dir.path()).is_err());
    }

    #[test]
    fn test_init_template_is_valid() {
        let config: Config = serde_yaml::from_str(crate::cli::CONFIG_TEMPLATE).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.ignored_interfaces.len(), 3);
    }
}
