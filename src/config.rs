//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Missing keys take their defaults; a missing, unreadable or invalid file
//! falls back to defaults entirely with a logged warning.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::grid::{LEVEL_WIDTH_RANGE, SHAFT_DEPTH_RANGE};

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub stage: StageConfig,
    pub timing: TimingConfig,
    pub soil: SoilConfig,
    pub camera: CameraConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StageConfig {
    pub level_width: u32,
    pub shaft_depth: u32,
    pub player_start_x: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub walk_ticks: u32, // move-block after a plain step
    pub dig_ticks: u32,  // move-block after opening a tile
}

#[derive(Clone, Debug, PartialEq)]
pub struct SoilConfig {
    /// A closed neighbor shows a hint with odds `1 / hint_luck` per move.
    pub hint_luck: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub default_fov: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub zoom: Vec<String>,
    pub pause: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("stage.level_width must be at least 3 (got {0})")]
    LevelTooNarrow(u32),
    #[error("stage.shaft_depth must be at least 1")]
    EmptyShaft,
    #[error("stage.{key} = {value} exceeds the maximum of {max}")]
    StageTooLarge { key: &'static str, value: u32, max: u32 },
    #[error("stage.player_start_x {start} is outside a level {width} wide")]
    StartOutsideLevel { start: u32, width: u32 },
    #[error("timing.{0} must be positive")]
    ZeroTicks(&'static str),
    #[error("soil.hint_luck must be at least 1")]
    ZeroHintLuck,
    #[error("camera.zoom_step must be positive (got {0})")]
    BadZoomStep(f32),
    #[error("camera.{key} must be a positive finite number (got {value})")]
    BadFov { key: &'static str, value: f32 },
    #[error("camera.default_fov {fov} exceeds camera.max_zoom {max}")]
    FovAboveMaxZoom { fov: f32, max: f32 },
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    stage: TomlStage,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    soil: TomlSoil,
    #[serde(default)]
    camera: TomlCamera,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlStage {
    #[serde(default = "default_level_width")]
    level_width: u32,
    #[serde(default = "default_shaft_depth")]
    shaft_depth: u32,
    #[serde(default = "default_player_start_x")]
    player_start_x: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_walk_ticks")]
    walk_ticks: u32,
    #[serde(default = "default_dig_ticks")]
    dig_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlSoil {
    #[serde(default = "default_hint_luck")]
    hint_luck: u32,
}

#[derive(Deserialize, Debug)]
struct TomlCamera {
    #[serde(default = "default_fov")]
    default_fov: f32,
    #[serde(default = "default_max_zoom")]
    max_zoom: f32,
    #[serde(default = "default_zoom_step")]
    zoom_step: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_zoom_buttons")]
    zoom: Vec<String>,
    #[serde(default = "default_pause_buttons")]
    pause: Vec<String>,
    #[serde(default = "default_quit_buttons")]
    quit: Vec<String>,
}

// ── Defaults ──

fn default_level_width() -> u32 { 35 }
fn default_shaft_depth() -> u32 { 30 }
fn default_player_start_x() -> u32 { 30 }

fn default_tick_rate() -> u64 { 16 }
fn default_walk_ticks() -> u32 { 10 }
fn default_dig_ticks() -> u32 { 20 }

fn default_hint_luck() -> u32 { 8 }

fn default_fov() -> f32 { 1.1 }
fn default_max_zoom() -> f32 { 2.5 }
fn default_zoom_step() -> f32 { 0.1 }

fn default_zoom_buttons() -> Vec<String> { vec!["A".into()] }
fn default_pause_buttons() -> Vec<String> { vec!["Start".into()] }
fn default_quit_buttons() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlStage {
    fn default() -> Self {
        TomlStage {
            level_width: default_level_width(),
            shaft_depth: default_shaft_depth(),
            player_start_x: default_player_start_x(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            walk_ticks: default_walk_ticks(),
            dig_ticks: default_dig_ticks(),
        }
    }
}

impl Default for TomlSoil {
    fn default() -> Self {
        TomlSoil { hint_luck: default_hint_luck() }
    }
}

impl Default for TomlCamera {
    fn default() -> Self {
        TomlCamera {
            default_fov: default_fov(),
            max_zoom: default_max_zoom(),
            zoom_step: default_zoom_step(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            zoom: default_zoom_buttons(),
            pause: default_pause_buttons(),
            quit: default_quit_buttons(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            stage: StageConfig {
                level_width: t.stage.level_width,
                shaft_depth: t.stage.shaft_depth,
                player_start_x: t.stage.player_start_x,
            },
            timing: TimingConfig {
                tick_rate_ms: t.timing.tick_rate_ms,
                walk_ticks: t.timing.walk_ticks,
                dig_ticks: t.timing.dig_ticks,
            },
            soil: SoilConfig { hint_luck: t.soil.hint_luck },
            camera: CameraConfig {
                default_fov: t.camera.default_fov,
                max_zoom: t.camera.max_zoom,
                zoom_step: t.camera.zoom_step,
            },
            gamepad: GamepadConfig {
                zoom: t.gamepad.zoom,
                pause: t.gamepad.pause,
                quit: t.gamepad.quit,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        let Some(path) = find_config(&candidate_dirs()) else {
            info!("no config.toml found, using defaults");
            return GameConfig::default();
        };
        match Self::from_file(&path) {
            Ok(cfg) => {
                info!(path = %path.display(), "loaded config");
                cfg
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using default settings");
                GameConfig::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: TomlConfig = toml::from_str(text)?;
        let cfg = GameConfig::from(raw);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.stage;
        if s.level_width < 3 {
            return Err(ConfigError::LevelTooNarrow(s.level_width));
        }
        if s.shaft_depth == 0 {
            return Err(ConfigError::EmptyShaft);
        }
        let too_large = [
            ("level_width", s.level_width, *LEVEL_WIDTH_RANGE.end()),
            ("shaft_depth", s.shaft_depth, *SHAFT_DEPTH_RANGE.end()),
        ];
        if let Some((key, value, max)) = too_large.into_iter().find(|(_, v, max)| v > max) {
            return Err(ConfigError::StageTooLarge { key, value, max });
        }
        if s.player_start_x >= s.level_width {
            return Err(ConfigError::StartOutsideLevel {
                start: s.player_start_x,
                width: s.level_width,
            });
        }
        if self.timing.walk_ticks == 0 {
            return Err(ConfigError::ZeroTicks("walk_ticks"));
        }
        if self.timing.dig_ticks == 0 {
            return Err(ConfigError::ZeroTicks("dig_ticks"));
        }
        if self.soil.hint_luck == 0 {
            return Err(ConfigError::ZeroHintLuck);
        }
        let c = &self.camera;
        if !(c.zoom_step > 0.0) {
            return Err(ConfigError::BadZoomStep(c.zoom_step));
        }
        for (key, value) in [("default_fov", c.default_fov), ("max_zoom", c.max_zoom)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::BadFov { key, value });
            }
        }
        if c.default_fov > c.max_zoom {
            return Err(ConfigError::FovAboveMaxZoom { fov: c.default_fov, max: c.max_zoom });
        }
        Ok(())
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Follow symlinks so an installed link still finds the real
        // binary's neighbours.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn find_config(search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs
        .iter()
        .map(|d| d.join("config.toml"))
        .find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, GameConfig::default());
        assert_eq!(cfg.stage.level_width, 35);
        assert_eq!(cfg.stage.shaft_depth, 30);
        assert_eq!(cfg.stage.player_start_x, 30);
        assert_eq!(cfg.timing.walk_ticks, 10);
        assert_eq!(cfg.timing.dig_ticks, 20);
        assert_eq!(cfg.soil.hint_luck, 8);
        assert_eq!(cfg.camera.max_zoom, 2.5);
        assert_eq!(cfg.gamepad.pause, vec!["Start".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[stage]\nshaft_depth = 12\n\n[soil]\nhint_luck = 1\n",
        )
        .unwrap();
        assert_eq!(cfg.stage.shaft_depth, 12);
        assert_eq!(cfg.stage.level_width, 35);
        assert_eq!(cfg.soil.hint_luck, 1);
        assert_eq!(cfg.timing.tick_rate_ms, 16);
    }

    #[test]
    fn gamepad_lists_parse() {
        let cfg = GameConfig::from_toml_str("[gamepad]\nzoom = [\"X\", \"R1\"]\n").unwrap();
        assert_eq!(cfg.gamepad.zoom, vec!["X".to_string(), "R1".to_string()]);
        assert_eq!(cfg.gamepad.quit, vec!["Select".to_string()]);
    }

    #[test]
    fn syntax_error_is_parse_error() {
        let err = GameConfig::from_toml_str("[stage\nlevel_width = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            ("[stage]\nlevel_width = 2\nplayer_start_x = 0", "LevelTooNarrow"),
            ("[stage]\nshaft_depth = 0", "EmptyShaft"),
            ("[stage]\nlevel_width = 10", "StartOutsideLevel"),
            ("[timing]\ndig_ticks = 0", "ZeroTicks"),
            ("[soil]\nhint_luck = 0", "ZeroHintLuck"),
            ("[camera]\nzoom_step = 0.0", "BadZoomStep"),
            ("[camera]\ndefault_fov = 3.0", "FovAboveMaxZoom"),
            ("[stage]\nlevel_width = 2147483648\nplayer_start_x = 0", "StageTooLarge"),
            ("[stage]\nlevel_width = 257", "StageTooLarge"),
            ("[stage]\nshaft_depth = 1000000", "StageTooLarge"),
            ("[camera]\ndefault_fov = nan", "BadFov"),
            ("[camera]\nmax_zoom = inf", "BadFov"),
            ("[camera]\ndefault_fov = -1.0", "BadFov"),
        ];
        for (text, expected) in cases {
            let err = GameConfig::from_toml_str(text).unwrap_err();
            assert!(format!("{err:?}").starts_with(expected), "{text} -> {err:?}");
        }
    }

    #[test]
    fn largest_stage_is_accepted() {
        let cfg = GameConfig::from_toml_str("[stage]\nlevel_width = 256\nshaft_depth = 256\n").unwrap();
        assert_eq!(cfg.stage.level_width, 256);
        let err = GameConfig::from_toml_str("[stage]\nshaft_depth = 257\n").unwrap_err();
        assert_eq!(err.to_string(), "stage.shaft_depth = 257 exceeds the maximum of 256");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = GameConfig::from_file(Path::new("/nonexistent/soilminer/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("could not read"));
    }
}
