//! Configuration loading
//!
//! `defaults/storyscript.default.toml` is embedded into the binary so the documented
//! defaults and the runtime behavior stay in sync. User files are layered on top via
//! [`Loader`] before deserializing into [`StoryConfig`]:
//!
//!     defaults < `storyscript.toml` beside the story < `--config` file < overrides

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::story::engine::Algorithm;

const DEFAULT_TOML: &str = include_str!("../../defaults/storyscript.default.toml");

/// Name of the per-directory configuration file picked up next to a story.
pub const PROJECT_FILE: &str = "storyscript.toml";

/// The project file that applies to `story`.
pub fn project_file(story: impl AsRef<Path>) -> PathBuf {
    story.as_ref().with_file_name(PROJECT_FILE)
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryConfig {
    pub parser: ParserConfig,
    pub output: OutputConfig,
}

/// Knobs of the parsing pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParserConfig {
    pub algorithm: Algorithm,
    pub tab_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Layers user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files are an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer the project file next to `story`, when there is one.
    pub fn with_project_file(mut self, story: impl AsRef<Path>) -> Self {
        let source = File::from(project_file(story))
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<StoryConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<StoryConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.parser.algorithm, Algorithm::Packrat);
        assert_eq!(config.parser.tab_len, 8);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("parser.algorithm", "backtracking")
            .expect("override to apply")
            .set_override("output.format", "yaml")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.parser.algorithm, Algorithm::Backtracking);
        assert_eq!(config.output.format, OutputFormat::Yaml);
    }

    #[test]
    fn missing_required_file_fails() {
        let result = Loader::new().with_file("/nonexistent/storyscript.toml").build();
        assert!(result.is_err());
    }

    #[test]
    fn project_file_sits_beside_the_story() {
        assert_eq!(
            project_file("stories/intro.story"),
            PathBuf::from("stories/storyscript.toml")
        );
        assert_eq!(project_file("intro.story"), PathBuf::from(PROJECT_FILE));
    }

    #[test]
    fn missing_project_file_is_ignored() {
        let config = Loader::new()
            .with_project_file("/nonexistent/intro.story")
            .build()
            .expect("config to build");
        assert_eq!(config.parser.tab_len, 8);
    }

    #[test]
    fn project_file_is_layered_under_explicit_settings() {
        let dir = std::env::temp_dir().join(format!("storyscript-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(PROJECT_FILE), "[parser]\ntab_len = 4\n").unwrap();

        let story = dir.join("intro.story");
        let config = Loader::new().with_project_file(&story).build().unwrap();
        assert_eq!(config.parser.tab_len, 4);
        assert_eq!(config.parser.algorithm, Algorithm::Packrat);

        let config = Loader::new()
            .with_project_file(&story)
            .set_override("parser.tab_len", 2i64)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.parser.tab_len, 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
