//! Configuration system for Tab
//!
//! Loads configuration from `tab.toml` in the working directory, or from
//! `~/.config/tab/config.toml`. Auto-generates the latter with defaults on
//! first run if neither exists.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub gl: ContextConfig,
    pub resources: ResourceConfig,
    pub overlay: OverlayConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if no file exists
    pub fn load() -> Result<Self> {
        let local = PathBuf::from("tab.toml");
        if local.exists() {
            return Self::load_from(&local);
        }

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            // Auto-generate default config file
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("tab");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in pixels; also the width of the orthographic projection
    pub width: u32,
    /// Window height in pixels; also the height of the orthographic projection
    pub height: u32,
    pub title: String,
    /// Swap interval 1 when enabled
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 600,
            title: "Tab".to_string(),
            vsync: true,
        }
    }
}

/// OpenGL context configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Request a debug context
    pub debug_context: bool,
    /// Install the debug message callback
    pub debug_output: bool,
    /// Exit on any debug message (requires `debug_output`)
    pub strict: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            debug_context: true,
            debug_output: false,
            strict: false,
        }
    }
}

/// Shader and texture locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub shader: PathBuf,
    pub texture: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            shader: PathBuf::from("res/shaders/basic.shader"),
            texture: PathBuf::from("res/textures/grass.png"),
        }
    }
}

impl ResourceConfig {
    /// Resolve a relative resource path against the working directory,
    /// falling back to the crate root
    pub fn resolve(path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            return path.to_path_buf();
        }
        let fallback = Path::new(env!("CARGO_MANIFEST_DIR")).join(path);
        if fallback.exists() {
            fallback
        } else {
            path.to_path_buf()
        }
    }
}

/// Overlay and frame appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Frame clear color: RGBA values 0.0-1.0
    pub clear_color: [f32; 4],
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
