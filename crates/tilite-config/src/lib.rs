use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Error types for configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// X11 modifier bits, as used in key and button grabs.
pub const SHIFT_MASK: u16 = 1 << 0;
pub const MOD1_MASK: u16 = 1 << 3;
pub const MOD3_MASK: u16 = 1 << 5;
pub const MOD4_MASK: u16 = 1 << 6;
pub const MOD5_MASK: u16 = 1 << 7;

/// User configuration as written in `config.toml`. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TiliteConfig {
    /// One of `mod1`/`alt`, `mod3`, `mod4`/`super`, `mod5`.
    pub modkey: String,
    pub gaps: u32,
    pub border_width: u32,
    pub focused_border_color: String,
    pub unfocused_border_color: String,
    pub swap_border_color: String,
    pub move_window_amt: u32,
    pub resize_window_amt: u32,
    pub snap_distance: u32,
    /// Maximum number of drag motion events processed per second.
    pub motion_throttle: u32,
    pub new_win_focus: bool,
    pub warp_cursor: bool,
    pub floating_on_top: bool,
}

impl Default for TiliteConfig {
    fn default() -> Self {
        Self {
            modkey: "mod4".to_string(),
            gaps: 5,
            border_width: 3,
            focused_border_color: "#89B4FA".to_string(),
            unfocused_border_color: "#1E1E2E".to_string(),
            swap_border_color: "#1E1E2E".to_string(),
            move_window_amt: 50,
            resize_window_amt: 50,
            snap_distance: 5,
            motion_throttle: 60,
            new_win_focus: true,
            warp_cursor: true,
            floating_on_top: true,
        }
    }
}

/// Validated configuration with colors resolved to pixels and the modifier
/// resolved to its mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub modkey: u16,
    pub gaps: i32,
    pub border_width: i32,
    pub focused_border: u32,
    pub unfocused_border: u32,
    pub swap_border: u32,
    pub move_window_amt: i32,
    pub resize_window_amt: i32,
    pub snap_distance: i32,
    pub motion_throttle: u32,
    pub new_win_focus: bool,
    pub warp_cursor: bool,
    pub floating_on_top: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            modkey: MOD4_MASK,
            gaps: 5,
            border_width: 3,
            focused_border: 0xff89b4fa,
            unfocused_border: 0xff1e1e2e,
            swap_border: 0xff1e1e2e,
            move_window_amt: 50,
            resize_window_amt: 50,
            snap_distance: 5,
            motion_throttle: 60,
            new_win_focus: true,
            warp_cursor: true,
            floating_on_top: true,
        }
    }
}

impl TiliteConfig {
    /// `$XDG_CONFIG_HOME/tilite/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tilite")
            .join("config.toml")
    }

    /// Loads the configuration. An explicit path must exist; a missing file
    /// at the default location means built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                Self::load_from_file(path)
            }
            None => {
                let path = Self::default_path();
                if !path.exists() {
                    debug!("No config at {}, using defaults", path.display());
                    return Ok(Self::default());
                }
                Self::load_from_file(&path)
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        if self.motion_throttle == 0 {
            return Err(ConfigError::InvalidValue {
                key: "motion_throttle",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Settings {
            modkey: parse_modkey(&self.modkey)?,
            gaps: to_i32("gaps", self.gaps)?,
            border_width: to_i32("border_width", self.border_width)?,
            focused_border: parse_color("focused_border_color", &self.focused_border_color)?,
            unfocused_border: parse_color("unfocused_border_color", &self.unfocused_border_color)?,
            swap_border: parse_color("swap_border_color", &self.swap_border_color)?,
            move_window_amt: to_i32("move_window_amt", self.move_window_amt)?,
            resize_window_amt: to_i32("resize_window_amt", self.resize_window_amt)?,
            snap_distance: to_i32("snap_distance", self.snap_distance)?,
            motion_throttle: self.motion_throttle,
            new_win_focus: self.new_win_focus,
            warp_cursor: self.warp_cursor,
            floating_on_top: self.floating_on_top,
        })
    }
}

fn to_i32(key: &'static str, value: u32) -> Result<i32, ConfigError> {
    i32::try_from(value).map_err(|_| ConfigError::InvalidValue {
        key,
        reason: format!("{value} is out of range"),
    })
}

pub fn parse_modkey(name: &str) -> Result<u16, ConfigError> {
    match name.to_ascii_lowercase().as_str() {
        "mod1" | "alt" => Ok(MOD1_MASK),
        "mod3" => Ok(MOD3_MASK),
        "mod4" | "super" => Ok(MOD4_MASK),
        "mod5" => Ok(MOD5_MASK),
        other => Err(ConfigError::InvalidValue {
            key: "modkey",
            reason: format!("unknown modifier `{other}`"),
        }),
    }
}

/// Parses `#RRGGBB` into a border pixel. The alpha byte is forced to opaque so
/// borders stay visible under a compositor.
pub fn parse_color(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key,
        reason: format!("`{value}` is not a #RRGGBB color"),
    };

    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let rgb = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
    Ok(rgb | (0xff << 24))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_defaults_resolve() {
        let settings = TiliteConfig::default().resolve().unwrap();
        assert_eq!(settings.modkey, MOD4_MASK);
        assert_eq!(settings.gaps, 5);
        assert_eq!(settings.border_width, 3);
        assert_eq!(settings.focused_border, 0xff89b4fa);
        assert_eq!(settings.motion_throttle, 60);
        assert_eq!(Settings::default(), settings);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gaps = 12\nmodkey = \"alt\"\nwarp_cursor = false").unwrap();

        let config = TiliteConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.gaps, 12);
        assert!(!config.warp_cursor);
        assert_eq!(config.border_width, 3);

        let settings = config.resolve().unwrap();
        assert_eq!(settings.modkey, MOD1_MASK);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            TiliteConfig::load(Some(&path)),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gapz = 3").unwrap();
        assert!(matches!(
            TiliteConfig::load(Some(file.path())),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_throttle_is_rejected() {
        let config = TiliteConfig {
            motion_throttle: 0,
            ..TiliteConfig::default()
        };
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidValue { key: "motion_throttle", .. })
        ));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("c", "#000000").unwrap(), 0xff000000);
        assert_eq!(parse_color("c", "#fff4c0").unwrap(), 0xfffff4c0);
        assert!(parse_color("c", "fff4c0").is_err());
        assert!(parse_color("c", "#fff").is_err());
        assert!(parse_color("c", "#gg0000").is_err());
    }

    #[test]
    fn test_parse_modkey() {
        assert_eq!(parse_modkey("Mod4").unwrap(), MOD4_MASK);
        assert_eq!(parse_modkey("super").unwrap(), MOD4_MASK);
        assert!(parse_modkey("hyper").is_err());
    }
}
