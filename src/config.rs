use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::categorical::DEFAULT_ALL_LABEL;
use crate::dataset::DIGIT_COLUMN;
use crate::resource::DEFAULT_DATASET_FILE;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub dataset: DatasetConfig,
    pub filters: FiltersConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Explicit dataset location; when unset the default file is searched for.
    pub path: Option<PathBuf>,
    pub file_name: String,
    pub delimiter: Option<u8>,
    pub infer_schema_length: Option<usize>,
    pub drop_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    pub institution_column: String,
    pub city_column: String,
    /// Label of the "no constraint" option
    pub all_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub dimmed: String,
    pub error: String,
    pub table_header: String,
    pub table_border: String,
    pub selector_active: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            dataset: DatasetConfig::default(),
            filters: FiltersConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            file_name: DEFAULT_DATASET_FILE.to_string(),
            delimiter: None,
            infer_schema_length: None,
            drop_columns: vec![DIGIT_COLUMN.to_string()],
        }
    }
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            institution_column: "Universitat".to_string(),
            city_column: "Ciutat".to_string(),
            all_label: DEFAULT_ALL_LABEL.to_string(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            dimmed: "dark_gray".to_string(),
            error: "red".to_string(),
            table_header: "white".to_string(),
            table_border: "cyan".to_string(),
            selector_active: "yellow".to_string(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_file: "tallview.log".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let mut config = AppConfig::default();

        let config_manager = ConfigManager::new(app_name)?;
        if let Some(user_config) = Self::load_from(&config_manager)? {
            config.merge(user_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Read `config.toml` from the manager's directory; `None` when absent.
    pub fn load_from(config_manager: &ConfigManager) -> Result<Option<AppConfig>> {
        let config_path = config_manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map(Some).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.dataset.merge(other.dataset);
        self.filters.merge(other.filters);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
    }

    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if self.dataset.infer_schema_length == Some(0) {
            return Err(eyre!("infer_schema_length must be greater than 0"));
        }

        if self.filters.institution_column.trim().is_empty()
            || self.filters.city_column.trim().is_empty()
        {
            return Err(eyre!("Filter column names must not be empty"));
        }

        if self.filters.all_label.trim().is_empty() {
            return Err(eyre!("all_label must not be empty"));
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }
}

impl DatasetConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DatasetConfig::default();
        if other.path.is_some() {
            self.path = other.path;
        }
        if other.file_name != default.file_name {
            self.file_name = other.file_name;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.infer_schema_length.is_some() {
            self.infer_schema_length = other.infer_schema_length;
        }
        if other.drop_columns != default.drop_columns {
            self.drop_columns = other.drop_columns;
        }
    }
}

impl FiltersConfig {
    pub fn merge(&mut self, other: Self) {
        let default = FiltersConfig::default();
        if other.institution_column != default.institution_column {
            self.institution_column = other.institution_column;
        }
        if other.city_column != default.city_column {
            self.city_column = other.city_column;
        }
        if other.all_label != default.all_label {
            self.all_label = other.all_label;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        self.colors.merge(other.colors);
    }
}

impl ColorConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        let fields = [
            (&mut self.primary, other.primary, default.primary),
            (&mut self.dimmed, other.dimmed, default.dimmed),
            (&mut self.error, other.error, default.error),
            (&mut self.table_header, other.table_header, default.table_header),
            (&mut self.table_border, other.table_border, default.table_border),
            (
                &mut self.selector_active,
                other.selector_active,
                default.selector_active,
            ),
        ];
        for (field, value, default) in fields {
            if value != default {
                *field = value;
            }
        }
    }

    fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("primary", self.primary.as_str()),
            ("dimmed", self.dimmed.as_str()),
            ("error", self.error.as_str()),
            ("table_header", self.table_header.as_str()),
            ("table_border", self.table_border.as_str()),
            ("selector_active", self.selector_active.as_str()),
        ]
    }

    /// Validate that all colors can be parsed
    pub fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }
        Ok(())
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.log_file != default.log_file {
            self.log_file = other.log_file;
        }
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex, indexed or named) into a terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();

        let color = if trimmed.starts_with('#') {
            let (r, g, b) = parse_hex(trimmed)?;
            if self.supports_true_color {
                Color::Rgb(r, g, b)
            } else {
                Color::Indexed(rgb_to_256_color(r, g, b))
            }
        } else if lower.starts_with("indexed(") && lower.ends_with(')') {
            let num_str = &trimmed[8..trimmed.len() - 1];
            let num = num_str.parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            Color::Indexed(num)
        } else {
            match lower.as_str() {
                "black" => Color::Black,
                "red" => Color::Red,
                "green" => Color::Green,
                "yellow" => Color::Yellow,
                "blue" => Color::Blue,
                "magenta" => Color::Magenta,
                "cyan" => Color::Cyan,
                "white" => Color::White,
                "gray" | "grey" | "dark_gray" | "dark_grey" => Color::Indexed(8),
                "light_gray" | "light_grey" => Color::Indexed(7),
                "reset" => Color::Reset,
                _ => {
                    return Err(eyre!(
                        "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                         gray variants, indexed(N) or hex colors (#ff0000)",
                        trimmed
                    ))
                }
            }
        };

        if self.no_color {
            return Ok(Color::Reset);
        }
        if matches!(color, Color::Indexed(_)) && !self.supports_256 && !self.supports_true_color
        {
            // Terminals without 256 colors still get readable output.
            return Ok(Color::Reset);
        }
        Ok(color)
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.is_ascii() || !s.starts_with('#') || s.len() != 7 {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

/// Nearest index in the xterm 6x6x6 color cube
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let level = |c: u8| ((c as u16 * 5 + 127) / 255) as u8;
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

/// Parsed colors used by the renderer
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let colors = config
            .colors
            .entries()
            .into_iter()
            .map(|(name, value)| -> Result<(String, Color)> {
                Ok((name.to_string(), parser.parse(value)?))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { colors })
    }

    /// Color by name, `Color::Reset` for unknown names
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default()).unwrap_or_else(|_| Self {
            colors: HashMap::new(),
        })
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
