//! Configuration management for twirl
//!
//! Supports configuration via:
//! 1. Config file (~/.config/twirl/config.toml)
//! 2. Environment variables (TWIRL_MESSAGE, TWIRL_SYMBOLS, NO_COLOR, etc.)
//! 3. The [`SpinnerBuilder`] (overrides file/env settings)

use crate::context::{env_flag, Context};
use crate::spinner::Spinner;
use crate::symbols::FrameSource;
use crate::terminal::{ColorSettings, Palette, Sink, Style};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default tick interval
pub const DEFAULT_FREQUENCY_MS: u64 = 100;

/// Non-breaking space
pub const DEFAULT_DELIMITER: &str = "\u{00A0}";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Spinner frequency must be greater than zero")]
    InvalidFrequency,

    #[error("Unknown frame set: {0}")]
    UnknownSymbols(String),

    #[error("Frame list is empty")]
    EmptySymbols,
}

/// Spinner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinnerConfig {
    /// Message shown next to the frame
    pub message: String,

    /// Label shown before the frame
    pub prefix: String,

    /// Separator between prefix and frame
    pub delimiter: String,

    /// Catalog name or explicit frame list
    pub symbols: FrameSource,

    /// Tick interval in milliseconds
    pub frequency_ms: u64,

    /// Glyph printed by `done`
    pub done_symbol: String,

    /// Glyph printed by `fail`
    pub fail_symbol: String,

    /// Never animate, even on a terminal
    pub non_interactive: bool,

    /// Per-element color names
    pub colors: ColorSettings,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            message: "Loading...".to_string(),
            prefix: String::new(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            symbols: FrameSource::default(),
            frequency_ms: DEFAULT_FREQUENCY_MS,
            done_symbol: "✓".to_string(),
            fail_symbol: "✗".to_string(),
            non_interactive: false,
            colors: ColorSettings::default(),
        }
    }
}

impl SpinnerConfig {
    /// Get default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("twirl")
            .join("config.toml")
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load config from specific path
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default().with_env_overrides());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: SpinnerConfig = toml::from_str(&content)?;

        Ok(config.with_env_overrides())
    }

    /// Load config from a path that must exist
    pub fn load_required(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        Self::load_from(path)
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(message) = std::env::var("TWIRL_MESSAGE") {
            self.message = message;
        }
        if let Ok(prefix) = std::env::var("TWIRL_PREFIX") {
            self.prefix = prefix;
        }
        if let Ok(name) = std::env::var("TWIRL_SYMBOLS") {
            self.symbols = FrameSource::Named(name);
        }
        if let Ok(raw) = std::env::var("TWIRL_FREQUENCY_MS") {
            match raw.trim().parse() {
                Ok(ms) => self.frequency_ms = ms,
                Err(_) => warn!(value = %raw, "ignoring invalid TWIRL_FREQUENCY_MS"),
            }
        }
        if env_flag("TWIRL_NON_INTERACTIVE") {
            self.non_interactive = true;
        }

        // https://no-color.org: any value disables color
        if std::env::var_os("NO_COLOR").is_some() {
            self.colors = ColorSettings::default();
        }

        self
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path())
    }

    /// Save config to specific path
    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frequency_ms == 0 {
            return Err(ConfigError::InvalidFrequency);
        }

        match &self.symbols {
            FrameSource::Named(name) if self.symbols.resolve().is_none() => {
                Err(ConfigError::UnknownSymbols(name.clone()))
            }
            FrameSource::Literal(frames) if frames.is_empty() => Err(ConfigError::EmptySymbols),
            _ => Ok(()),
        }
    }

    /// Tick interval as a `Duration`
    pub fn frequency(&self) -> Duration {
        Duration::from_millis(self.frequency_ms)
    }

    /// Generate example config content
    pub fn example() -> String {
        let example = SpinnerConfig::default();
        toml::to_string_pretty(&example).unwrap_or_default()
    }
}

/// Builder for creating a [`Spinner`] programmatically.
///
/// Setters apply in call order; a later call for the same field wins.
pub struct SpinnerBuilder {
    config: SpinnerConfig,
    palette: Palette,
    sink: Option<Sink>,
    context: Option<Context>,
}

impl SpinnerBuilder {
    pub fn new() -> Self {
        Self::from_config(SpinnerConfig::default())
    }

    /// Start from loaded settings; color names are resolved here
    pub fn from_config(config: SpinnerConfig) -> Self {
        let palette = Palette::from_settings(&config.colors);
        Self {
            config,
            palette,
            sink: None,
            context: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.config.message = message.into();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.delimiter = delimiter.into();
        self
    }

    /// Frames: a catalog name or an explicit list
    pub fn symbols(mut self, symbols: impl Into<FrameSource>) -> Self {
        self.config.symbols = symbols.into();
        self
    }

    pub fn frequency(mut self, frequency: Duration) -> Self {
        self.config.frequency_ms = u64::try_from(frequency.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn done_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.config.done_symbol = symbol.into();
        self
    }

    pub fn fail_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.config.fail_symbol = symbol.into();
        self
    }

    pub fn non_interactive(mut self, enabled: bool) -> Self {
        self.config.non_interactive = enabled;
        self
    }

    pub fn message_color(mut self, style: impl Into<Style>) -> Self {
        self.palette.message = style.into();
        self
    }

    pub fn prefix_color(mut self, style: impl Into<Style>) -> Self {
        self.palette.prefix = style.into();
        self
    }

    pub fn delimiter_color(mut self, style: impl Into<Style>) -> Self {
        self.palette.delimiter = style.into();
        self
    }

    pub fn spinner_color(mut self, style: impl Into<Style>) -> Self {
        self.palette.spinner = style.into();
        self
    }

    pub fn done_color(mut self, style: impl Into<Style>) -> Self {
        self.palette.done = style.into();
        self
    }

    pub fn fail_color(mut self, style: impl Into<Style>) -> Self {
        self.palette.fail = style.into();
        self
    }

    /// Output sink (default: stdout)
    pub fn sink(mut self, sink: Sink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Shared context (default: a fresh one without interrupt handling)
    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Settings as they stand
    pub fn config(&self) -> &SpinnerConfig {
        &self.config
    }

    /// Check the settings without building
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    /// Build the spinner. Invalid settings are logged and replaced by
    /// defaults rather than rejected.
    pub fn build(self) -> Spinner {
        let context = self.context.unwrap_or_default();
        Spinner::assemble(
            &self.config,
            self.palette,
            self.sink.unwrap_or_default(),
            &context,
        )
    }
}

impl Default for SpinnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
