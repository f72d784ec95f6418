use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_search")]
    pub search: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_toggle_select")]
    pub toggle_select: String,
    #[serde(default = "default_select_all")]
    pub select_all: String,
    #[serde(default = "default_clear_selection")]
    pub clear_selection: String,
    #[serde(default = "default_bulk")]
    pub bulk: String,
    #[serde(default = "default_templates")]
    pub templates: String,
    #[serde(default = "default_ai")]
    pub ai: String,
    #[serde(default = "default_center")]
    pub center: String,
    #[serde(default = "default_zoom_in")]
    pub zoom_in: String,
    #[serde(default = "default_zoom_out")]
    pub zoom_out: String,
    #[serde(default = "default_next_card")]
    pub next_card: String,
    #[serde(default = "default_prev_card")]
    pub prev_card: String,
    #[serde(default = "default_help")]
    pub help: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_grid")]
    pub grid: String,
}

/// Canvas navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Canvas units panned per arrow key press
    #[serde(default = "default_pan_step")]
    pub pan_step: f64,
    /// Canvas units a card moves per Shift+arrow press
    #[serde(default = "default_move_step")]
    pub move_step: f64,
    /// Canvas units per terminal column at startup
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file for the interactive UI; defaults to the data directory
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut themes = HashMap::new();

        // Example custom theme showing the format
        themes.insert("ocean".to_string(), Theme {
            fg: "lightcyan".to_string(),
            bg: "black".to_string(),
            highlight_bg: "blue".to_string(),
            highlight_fg: "white".to_string(),
            grid: "darkgray".to_string(),
        });

        Self {
            storage_path: default_storage_path(),
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes,
            canvas: CanvasConfig::default(),
            ai: AiConfig::default(),
            log: LogConfig::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            delete: default_delete(),
            search: default_search(),
            filter: default_filter(),
            toggle_select: default_toggle_select(),
            select_all: default_select_all(),
            clear_selection: default_clear_selection(),
            bulk: default_bulk(),
            templates: default_templates(),
            ai: default_ai(),
            center: default_center(),
            zoom_in: default_zoom_in(),
            zoom_out: default_zoom_out(),
            next_card: default_next_card(),
            prev_card: default_prev_card(),
            help: default_help(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            grid: default_grid(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            pan_step: default_pan_step(),
            move_step: default_move_step(),
            default_zoom: default_zoom(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_ai_enabled(),
            model: default_ai_model(),
            api_key_env: default_api_key_env(),
            endpoint: default_ai_endpoint(),
            timeout_secs: default_ai_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Theme {
    /// Themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();

        themes.insert("default".to_string(), Theme::default());

        themes.insert("light".to_string(), Theme {
            fg: "black".to_string(),
            bg: "white".to_string(),
            highlight_bg: "blue".to_string(),
            highlight_fg: "white".to_string(),
            grid: "gray".to_string(),
        });

        themes.insert("monochrome".to_string(), Theme {
            fg: "white".to_string(),
            bg: "black".to_string(),
            highlight_bg: "white".to_string(),
            highlight_fg: "black".to_string(),
            grid: "darkgray".to_string(),
        });

        themes
    }
}

// Default value functions
fn default_storage_path() -> String {
    Config::default_storage_path_for_profile(utils::Profile::Prod)
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_search() -> String {
    "/".to_string()
}

fn default_filter() -> String {
    "f".to_string()
}

fn default_toggle_select() -> String {
    "Space".to_string()
}

fn default_select_all() -> String {
    "a".to_string()
}

fn default_clear_selection() -> String {
    "Esc".to_string()
}

fn default_bulk() -> String {
    "b".to_string()
}

fn default_templates() -> String {
    "t".to_string()
}

fn default_ai() -> String {
    "i".to_string()
}

fn default_center() -> String {
    "c".to_string()
}

fn default_zoom_in() -> String {
    "+".to_string()
}

fn default_zoom_out() -> String {
    "-".to_string()
}

fn default_next_card() -> String {
    "Tab".to_string()
}

fn default_prev_card() -> String {
    "BackTab".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_grid() -> String {
    "darkgray".to_string()
}

fn default_pan_step() -> f64 {
    200.0
}

fn default_move_step() -> f64 {
    20.0
}

fn default_zoom() -> f64 {
    10.0
}

fn default_ai_enabled() -> bool {
    true
}

fn default_ai_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_ai_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Theme not found: {0}")]
    ThemeNotFound(String),
}

impl Config {
    /// Load configuration for a profile, or from `path` when given.
    /// A missing file is created with defaults.
    pub fn load_with_profile(profile: utils::Profile, path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(path) => utils::expand_path(&path.to_string_lossy()),
            None => Self::get_config_path(profile)?,
        };
        Self::load_from(&config_path, profile)
    }

    /// Load configuration using the production profile
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_profile(utils::Profile::Prod, None)
    }

    fn load_from(config_path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;
            if config.storage_path.trim().is_empty() {
                config.storage_path = Self::default_storage_path_for_profile(profile);
            }
            Ok(config)
        } else {
            let mut config = Config::default();
            config.storage_path = Self::default_storage_path_for_profile(profile);
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    /// Write configuration to `config_path`, creating parent directories
    pub fn save_to(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    fn default_storage_path_for_profile(profile: utils::Profile) -> String {
        match utils::get_data_dir(profile) {
            Some(data_dir) => data_dir.join("canvas.db").to_string_lossy().to_string(),
            None => format!("~/.local/share/{}/canvas.db", profile.app_name()),
        }
    }

    /// Storage path with `~` expanded
    pub fn get_storage_path(&self) -> PathBuf {
        utils::expand_path(&self.storage_path)
    }

    /// Log file for the interactive UI
    pub fn get_log_path(&self, profile: utils::Profile) -> Option<PathBuf> {
        match self.log.file {
            Some(ref file) => Some(utils::expand_path(file)),
            None => utils::get_data_dir(profile).map(|dir| dir.join("todo-canvas.log")),
        }
    }

    /// The active theme: user-defined first, then presets, then the default.
    /// An empty `highlight_fg` is derived from `highlight_bg`.
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color, parse_color};

        let mut theme = self
            .themes
            .get(&self.current_theme)
            .cloned()
            .or_else(|| Theme::get_preset_themes().remove(&self.current_theme))
            .unwrap_or_default();

        if theme.highlight_fg.is_empty() {
            let calculated_fg = get_contrast_text_color(parse_color(&theme.highlight_bg));
            theme.highlight_fg = format_color_for_display(&calculated_fg);
        }

        theme
    }

    /// Set the active theme by name
    pub fn set_theme(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.themes.contains_key(name) && !Theme::get_preset_themes().contains_key(name) {
            return Err(ConfigError::ThemeNotFound(name.to_string()));
        }

        self.current_theme = name.to_string();
        Ok(())
    }

    /// All theme names, presets and user-defined, sorted
    pub fn get_available_themes(&self) -> Vec<String> {
        let mut themes: Vec<String> = Theme::get_preset_themes().into_keys().collect();
        for name in self.themes.keys() {
            if !themes.contains(name) {
                themes.push(name.clone());
            }
        }
        themes.sort();
        themes
    }
}
