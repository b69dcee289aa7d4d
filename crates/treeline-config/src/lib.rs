use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use treeline_engine::dialects::{
    DIALECT_NAMES, FoldMarkerDialect, FoldMarkerOptions, HtmlDialect, InverseAtxDialect,
    InverseAtxOptions, LatexDialect, LatexOptions, MarkdownDialect, ParagraphDialect,
    ParagraphStyle, PythonDialect, PythonOptions, TaskpaperDialect, Txt2tagsDialect, WikiDialect,
    WikiOptions,
};
use treeline_engine::MarkupDialect;

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

    #[error("Unknown dialect name: {0}")]
    UnknownDialect(String),

    #[error("Invalid options for dialect {name}: {message}")]
    InvalidDialectOptions { name: String, message: String },
}

/// Filename pattern mapped to a dialect name: `*.tex` → `latex`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialectRule {
    pub pattern: String,
    pub dialect: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dialect used when no rule matches.
    pub default_dialect: String,
    /// Checked in order; first matching pattern wins.
    pub rules: Vec<DialectRule>,
    pub wiki: WikiOptions,
    pub inverse_atx: InverseAtxOptions,
    pub latex: LatexOptions,
    pub python: PythonOptions,
    pub fold_marker: FoldMarkerOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_dialect: "markdown".to_string(),
            rules: vec![
                DialectRule {
                    pattern: "*.md".to_string(),
                    dialect: "markdown".to_string(),
                },
                DialectRule {
                    pattern: "*.tex".to_string(),
                    dialect: "latex".to_string(),
                },
                DialectRule {
                    pattern: "*.html".to_string(),
                    dialect: "html".to_string(),
                },
                DialectRule {
                    pattern: "*.py".to_string(),
                    dialect: "python".to_string(),
                },
                DialectRule {
                    pattern: "*.taskpaper".to_string(),
                    dialect: "taskpaper".to_string(),
                },
                DialectRule {
                    pattern: "*.t2t".to_string(),
                    dialect: "txt2tags".to_string(),
                },
            ],
            wiki: WikiOptions::default(),
            inverse_atx: InverseAtxOptions::default(),
            latex: LatexOptions::default(),
            python: PythonOptions::default(),
            fold_marker: FoldMarkerOptions::default(),
        }
    }
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

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/treeline");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Dialect name for a document path: first matching rule, else the
    /// default.
    pub fn dialect_for_path(&self, path: &Path) -> &str {
        for rule in &self.rules {
            let Ok(pattern) = glob::Pattern::new(&rule.pattern) else {
                continue;
            };
            let matches = pattern.matches_path(path)
                || path
                    .file_name()
                    .is_some_and(|name| pattern.matches(&name.to_string_lossy()));
            if matches {
                return &rule.dialect;
            }
        }
        &self.default_dialect
    }

    /// Construct a dialect by name with this configuration's options.
    pub fn build_dialect(&self, name: &str) -> Result<Box<dyn MarkupDialect>, ConfigError> {
        let dialect: Box<dyn MarkupDialect> = match name {
            "markdown" => Box::new(MarkdownDialect::new()),
            "wiki" => Box::new(WikiDialect::new(self.wiki.clone())),
            "inverse-atx" => Box::new(InverseAtxDialect::new(self.inverse_atx.clone())),
            "txt2tags" => Box::new(Txt2tagsDialect::new()),
            "latex" => Box::new(LatexDialect::new(self.latex.clone()).map_err(|err| {
                ConfigError::InvalidDialectOptions {
                    name: name.to_string(),
                    message: err.to_string(),
                }
            })?),
            "html" => Box::new(HtmlDialect::new()),
            "python" => Box::new(PythonDialect::new(self.python.clone())),
            "taskpaper" => Box::new(TaskpaperDialect::new()),
            "fold-marker" => Box::new(FoldMarkerDialect::new(self.fold_marker.clone())),
            "paragraph" => Box::new(ParagraphDialect::new(ParagraphStyle::BlankSeparated)),
            "paragraph-indent" => Box::new(ParagraphDialect::new(ParagraphStyle::Indented)),
            "paragraph-flush" => Box::new(ParagraphDialect::new(ParagraphStyle::Flush)),
            _ => return Err(ConfigError::UnknownDialect(name.to_string())),
        };
        Ok(dialect)
    }
}

/// Names accepted by [`Config::build_dialect`], for help text.
pub fn known_dialects() -> &'static [&'static str] {
    DIALECT_NAMES
}
