// ============================================================================
// ENGINE SETTINGS - persisted key=value configuration
// ============================================================================

use std::path::PathBuf;

use crate::canvas::{DEFAULT_GRID_SIZE, GridSize, MAX_GRID_SIZE, MIN_GRID_SIZE};
use crate::components::history::MAX_HISTORY_SIZE;
use crate::logger::LogLevel;

/// Longest edge, in output pixels, a raster export may have.
pub const MAX_EXPORT_SIZE: u32 = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    /// Undo steps kept before the oldest is evicted.
    pub max_history_size: usize,
    pub default_grid_width: u32,
    pub default_grid_height: u32,
    /// Upper bound for new, resized and imported grids.
    pub max_grid_size: u32,
    pub max_export_size: u32,
    pub log_level: LogLevel,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_history_size: MAX_HISTORY_SIZE,
            default_grid_width: DEFAULT_GRID_SIZE.x,
            default_grid_height: DEFAULT_GRID_SIZE.y,
            max_grid_size: MAX_GRID_SIZE,
            max_export_size: MAX_EXPORT_SIZE,
            log_level: LogLevel::Info,
        }
    }
}

impl EngineSettings {
    /// Default grid, clamped to the configured maximum.
    pub fn default_grid_size(&self) -> GridSize {
        GridSize::new(self.default_grid_width, self.default_grid_height).clamped(self.max_grid_size)
    }

    /// Path to the settings file.
    /// On Linux:   ~/.config/pixelsmith/pixelsmith_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\PixelSmith\pixelsmith_settings.cfg
    /// On macOS:   ~/Library/Application Support/PixelSmith/pixelsmith_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("PixelSmith").join("pixelsmith_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("PixelSmith")
                    .join("pixelsmith_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("pixelsmith").join("pixelsmith_settings.cfg"))
        }
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "max_history_size={}\n\
             default_grid_width={}\n\
             default_grid_height={}\n\
             max_grid_size={}\n\
             max_export_size={}\n\
             log_level={}\n",
            self.max_history_size,
            self.default_grid_width,
            self.default_grid_height,
            self.max_grid_size,
            self.max_export_size,
            self.log_level.tag().to_ascii_lowercase(),
        )
    }

    /// Parse `key=value` lines over the defaults. Unknown keys and values
    /// that fail to parse are skipped one by one.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "max_history_size" => {
                    if let Ok(v) = val.parse::<usize>() {
                        s.max_history_size = v.max(1);
                    }
                }
                "default_grid_width" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.default_grid_width = v.max(MIN_GRID_SIZE);
                    }
                }
                "default_grid_height" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.default_grid_height = v.max(MIN_GRID_SIZE);
                    }
                }
                "max_grid_size" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.max_grid_size = v.max(MIN_GRID_SIZE);
                    }
                }
                "max_export_size" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.max_export_size = v.max(1);
                    }
                }
                "log_level" => {
                    if let Some(level) = LogLevel::parse(val) {
                        s.log_level = level;
                    }
                }
                _ => {}
            }
        }
        s
    }

    /// Save settings to disk. Failures are logged and otherwise ignored.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Err(e) = std::fs::write(&path, self.to_config_string()) {
            crate::log_warn!("could not save settings to {}: {}", path.display(), e);
        }
    }

    /// Load settings from disk (returns default if file missing or corrupt).
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };
        Self::parse(&content)
    }
}
