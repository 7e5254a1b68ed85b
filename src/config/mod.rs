// src/config/mod.rs - Configuration files for the argument and preprocessor pipelines

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::args::{AnyParser, ArgumentPipeline, Lexer, ParserStrategy};
use crate::preprocessor::{TextPreprocessor, TextPreprocessorOptions};
use crate::types::{FlagMetadata, QuotePair};

/// Preprocessor settings as they appear in a config file
pub type PreprocessorConfig = TextPreprocessorOptions;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextpipeConfig {
    pub args: ArgsConfig,
    pub preprocessor: PreprocessorConfig,
}

impl TextpipeConfig {
    pub fn pipeline(&self) -> ArgumentPipeline {
        self.args.pipeline()
    }

    pub fn preprocessor(&self) -> TextPreprocessor {
        TextPreprocessor::new(&self.preprocessor)
    }
}

/// Command argument settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgsConfig {
    /// Command prefixes, e.g. `!`
    pub prefixes: Vec<String>,
    /// Open and close quote pairs
    pub quotes: Vec<[char; 2]>,
    pub flags: Vec<FlagMetadata>,
    pub options: Vec<FlagMetadata>,
    pub strategy: ParserStrategy,
}

impl Default for ArgsConfig {
    fn default() -> Self {
        Self {
            prefixes: vec!["!".to_string()],
            quotes: vec![['"', '"'], ['\u{201C}', '\u{201D}']],
            flags: Vec::new(),
            options: Vec::new(),
            strategy: ParserStrategy::Standard,
        }
    }
}

impl ArgsConfig {
    pub fn quote_pairs(&self) -> impl Iterator<Item = QuotePair> + '_ {
        self.quotes.iter().map(|&[open, close]| QuotePair::new(open, close))
    }

    pub fn lexer(&self) -> Lexer {
        let mut lexer = Lexer::new();
        lexer.set_quotes(self.quote_pairs());
        lexer
    }

    pub fn parser(&self) -> AnyParser {
        AnyParser::build(self.strategy, &self.flags, &self.options)
    }

    pub fn pipeline(&self) -> ArgumentPipeline {
        ArgumentPipeline::new(self.lexer(), self.parser()).with_prefixes(self.prefixes.iter().cloned())
    }
}

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Reads and validates configuration files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads a config file, choosing the parser from its extension.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<TextpipeConfig, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&content, format)?;
        info!(
            "Loaded configuration from {} ({} flags, {} options)",
            path.display(),
            config.args.flags.len(),
            config.args.options.len()
        );
        Ok(config)
    }

    /// Parses and validates config text.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<TextpipeConfig, ConfigError> {
        let config: TextpipeConfig = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        };

        ConfigValidator::new().validate(&config)?;
        debug!("Validated {:?} configuration", format);
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<TextpipeConfig, ConfigError> {
        Self::parse(content, ConfigFormat::Yaml)
    }
}

/// Configuration validator
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, config: &TextpipeConfig) -> Result<(), ConfigError> {
        self.validate_args(&config.args)?;
        self.validate_preprocessor(&config.preprocessor)?;
        Ok(())
    }

    pub fn validate_args(&self, args: &ArgsConfig) -> Result<(), ConfigError> {
        if args.prefixes.iter().any(String::is_empty) {
            return Err(ConfigError::invalid("Command prefixes cannot be empty"));
        }

        for &[open, close] in &args.quotes {
            self.validate_quote_char(open)?;
            self.validate_quote_char(close)?;
        }

        // Prefix -> whether it was registered as a flag
        let mut registered: HashMap<&str, bool> = HashMap::new();
        for (entries, is_flag) in [(&args.flags, true), (&args.options, false)] {
            for entry in entries {
                self.validate_flag_metadata(entry)?;
                for prefix in &entry.prefixes {
                    if let Some(&was_flag) = registered.get(prefix.as_str()) {
                        if was_flag != is_flag {
                            return Err(ConfigError::invalid(format!(
                                "Prefix '{}' is registered as both a flag and an option",
                                prefix
                            )));
                        }
                    }
                    registered.insert(prefix.as_str(), is_flag);
                }
            }
        }

        Ok(())
    }

    fn validate_quote_char(&self, c: char) -> Result<(), ConfigError> {
        if c.is_whitespace() || c == '\\' {
            return Err(ConfigError::invalid(format!("Quote character {:?} cannot be whitespace or a backslash", c)));
        }
        if c.len_utf16() != 1 {
            return Err(ConfigError::invalid(format!("Quote character {:?} must be a single UTF-16 code unit", c)));
        }
        Ok(())
    }

    fn validate_flag_metadata(&self, entry: &FlagMetadata) -> Result<(), ConfigError> {
        if entry.id.is_empty() {
            return Err(ConfigError::invalid("Flag and option IDs cannot be empty"));
        }
        if entry.prefixes.is_empty() {
            return Err(ConfigError::invalid(format!("'{}' must have at least one prefix", entry.id)));
        }
        if entry.prefixes.iter().any(String::is_empty) {
            return Err(ConfigError::invalid(format!("'{}' has an empty prefix", entry.id)));
        }
        Ok(())
    }

    pub fn validate_preprocessor(&self, options: &PreprocessorConfig) -> Result<(), ConfigError> {
        let lengths = [
            ("max_character_run_length", options.max_character_run_length),
            ("max_whitespace_run_length", options.max_whitespace_run_length),
            ("max_symbol_run_length", options.max_symbol_run_length),
        ];
        for (name, value) in lengths {
            if value == 0 {
                return Err(ConfigError::invalid(format!("{} must be at least 1", name)));
            }
        }

        for (c, &value) in &options.max_character_run_length_overrides {
            if value == 0 {
                return Err(ConfigError::invalid(format!("Run length override for '{}' must be at least 1", c)));
            }
        }

        if options.leet_speak.keys().any(String::is_empty) {
            return Err(ConfigError::invalid("Leet-speak bases cannot be empty"));
        }
        if options.confusables.keys().any(String::is_empty) {
            return Err(ConfigError::invalid("Confusable bases cannot be empty"));
        }

        Ok(())
    }
}
