//! Immutable experiment configuration.
//!
//! A [`Config`] is built once at startup (defaults, or a JSON file via
//! [`Config::from_json_file`]) and handed by reference to every component
//! constructor. Nothing reads configuration from global state.
//!
//! Every field has a default, so a JSON file only needs to name the values it
//! changes:
//!
//! ```json
//! { "zoom": { "max_scale": 8.0 }, "experiment": { "main_trials": 4 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use slint::Color;

use crate::error::{ExperimentError, Result};
use crate::transform::Size;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas: CanvasConfig,
    pub zoom: ZoomConfig,
    pub token: TokenConfig,
    pub placement: PlacementConfig,
    pub controls: ControlsConfig,
    pub experiment: ExperimentConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
    /// Extra logical space kept around the token bounds by `clamp_offset`.
    pub safety_margin: f32,
    /// How much larger than the token bounds the view is when recentering.
    pub padding_factor: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1240.0,
            height: 700.0,
            safety_margin: 50.0,
            padding_factor: 1.2,
        }
    }
}

impl CanvasConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Multiplier applied per wheel notch (its inverse when zooming out).
    pub zoom_factor: f32,
    /// Percentage shown when the scale sits at `max_scale`.
    pub max_display_percentage: u32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_scale: 1.0,
            max_scale: 5.0,
            zoom_factor: 1.111_111_1,
            max_display_percentage: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Device-space size; tokens do not grow with zoom.
    pub width: f32,
    pub height: f32,
    pub outline_width: f32,
    pub highlight_width: f32,
    pub fill_rgb: [u8; 3],
    pub outline_rgb: [u8; 3],
    pub highlight_rgb: [u8; 3],
    pub text_rgb: [u8; 3],
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            width: 60.0,
            height: 60.0,
            outline_width: 2.0,
            highlight_width: 4.0,
            fill_rgb: [128, 128, 128],
            outline_rgb: [0, 0, 0],
            highlight_rgb: [255, 0, 0],
            text_rgb: [255, 255, 255],
        }
    }
}

impl TokenConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn fill_color(&self) -> Color {
        rgb(self.fill_rgb)
    }

    pub fn outline_color(&self) -> Color {
        rgb(self.outline_rgb)
    }

    pub fn highlight_color(&self) -> Color {
        rgb(self.highlight_rgb)
    }

    pub fn text_color(&self) -> Color {
        rgb(self.text_rgb)
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::from_rgb_u8(r, g, b)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Full width of the uniform jitter window around the view centre.
    pub jitter_x: f32,
    pub jitter_y: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            jitter_x: 60.0,
            jitter_y: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Offset shift per arrow key press, in device pixels.
    pub pan_step: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self { pan_step: 30.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub training_trials: usize,
    pub main_trials: usize,
    /// When set, every trial of the word list must contain exactly this many
    /// words. When unset, each trial's size comes from the word list.
    pub words_per_trial: Option<usize>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            training_trials: 2,
            main_trials: 9,
            words_per_trial: None,
        }
    }
}

impl ExperimentConfig {
    pub fn total_trials(&self) -> usize {
        self.training_trials + self.main_trials
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Canvas y grows downwards, output y grows upwards.
    pub invert_y: bool,
    pub data_directory: String,
    /// `{timestamp}` is replaced with the formatted completion time.
    pub results_filename_template: String,
    /// chrono `strftime` format.
    pub timestamp_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            invert_y: true,
            data_directory: "data".into(),
            results_filename_template: "experiment_results_{timestamp}.csv".into(),
            timestamp_format: "%Y%m%d_%H%M%S".into(),
        }
    }
}

impl Config {
    /// Load a configuration file, filling unspecified fields with defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the viewport math cannot work with.
    pub fn validate(&self) -> Result<()> {
        let zoom = &self.zoom;
        if !(zoom.min_scale > 0.0 && zoom.min_scale < zoom.max_scale) {
            return Err(ExperimentError::configuration(format!(
                "zoom range must satisfy 0 < min_scale < max_scale (got {} .. {})",
                zoom.min_scale, zoom.max_scale
            )));
        }
        if zoom.zoom_factor <= 1.0 {
            return Err(ExperimentError::configuration(format!(
                "zoom_factor must be greater than 1 (got {})",
                zoom.zoom_factor
            )));
        }
        if self.canvas.width <= 0.0 || self.canvas.height <= 0.0 {
            return Err(ExperimentError::configuration("canvas size must be positive"));
        }
        if self.canvas.padding_factor < 1.0 {
            return Err(ExperimentError::configuration(
                "padding_factor must be at least 1",
            ));
        }
        if self.token.width <= 0.0 || self.token.height <= 0.0 {
            return Err(ExperimentError::configuration("token size must be positive"));
        }
        if self.token.width > self.canvas.width || self.token.height > self.canvas.height {
            return Err(ExperimentError::configuration(
                "token size must fit inside the canvas",
            ));
        }
        if self.placement.jitter_x < 0.0 || self.placement.jitter_y < 0.0 {
            return Err(ExperimentError::configuration("jitter range must not be negative"));
        }
        if self.experiment.total_trials() == 0 {
            return Err(ExperimentError::configuration(
                "experiment needs at least one trial",
            ));
        }
        if self.experiment.words_per_trial == Some(0) {
            return Err(ExperimentError::configuration(
                "words_per_trial must be positive",
            ));
        }
        if !self.output.results_filename_template.contains("{timestamp}") {
            return Err(ExperimentError::configuration(
                "results_filename_template must contain {timestamp}",
            ));
        }
        Ok(())
    }
}
