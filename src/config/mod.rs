use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::editor::region::BLUR_RADIUS;
use crate::editor::shapes::{FontSpec, StrokeStyle};
use crate::geometry::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "shotmark";
const APP_CONFIG_FILE: &str = "config.json";

const DEFAULT_STROKE_COLOR: u32 = 0xFFFF_0000;
const DEFAULT_STROKE_THICKNESS: f64 = 10.0;
const DEFAULT_HIGHLIGHTER_COLOR: u32 = 0x64FF_FF00;

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stroke_color: u32,
    pub stroke_thickness: f64,
    pub highlighter_color: u32,
    pub font_family: String,
    pub font_size: f64,
    pub font_path: Option<PathBuf>,
    pub blur_radius: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let font = FontSpec::default();
        Self {
            stroke_color: DEFAULT_STROKE_COLOR,
            stroke_thickness: DEFAULT_STROKE_THICKNESS,
            highlighter_color: DEFAULT_HIGHLIGHTER_COLOR,
            font_family: font.family,
            font_size: font.size,
            font_path: None,
            blur_radius: BLUR_RADIUS,
        }
    }
}

impl AppConfig {
    /// Style given to shapes drawn with the stroke tools.
    pub fn stroke_style(&self) -> StrokeStyle {
        let mut style = StrokeStyle::new(Color::from_argb(self.stroke_color), DEFAULT_STROKE_THICKNESS);
        style.set_thickness(self.stroke_thickness);
        style
    }

    pub fn highlighter_style(&self) -> StrokeStyle {
        StrokeStyle::new(Color::from_argb(self.highlighter_color), DEFAULT_STROKE_THICKNESS)
    }

    pub fn font(&self) -> FontSpec {
        FontSpec {
            family: self.font_family.clone(),
            size: self.font_size.max(1.0),
            ..FontSpec::default()
        }
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
