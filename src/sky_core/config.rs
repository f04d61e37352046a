use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::sky_core::color::{ColorSpace, ColorTriple, Rgb};
use crate::sky_core::palette::SkyPalettes;
use crate::sky_core::time::{HOUR_MS, MINUTE_MS, SECOND_MS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    pub color_space: ColorSpace,
    /// Painted whenever no sunrise/sunset is known for the displayed time.
    pub default_colors: ColorTriple,
    pub palettes: SkyPalettes,
    pub animator: AnimatorConfig,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Oklab,
            default_colors: [
                Rgb::from_hex_u32(0x2b3a55),
                Rgb::from_hex_u32(0x1f2b44),
                Rgb::from_hex_u32(0x141c30),
            ],
            palettes: SkyPalettes::builtin(),
            animator: AnimatorConfig::default(),
        }
    }
}

impl SkyConfig {
    pub fn from_json_str(contents: &str) -> anyhow::Result<Self> {
        serde_json::from_str(contents).context("invalid sky config")
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::load_from(std::path::Path::new("config.json"))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            log::info!("no {} found, using defaults", path.display());
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(config) => {
                    log::info!("loaded {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("failed to parse {}: {e:#}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("failed to read {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }
}

/// Timing knobs for the animator. The defaults are tuned by eye; changing them changes
/// how scrubbing feels, not whether it is correct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub settle_ms: f64,
    pub transition_ms: f64,
    pub transition_fps: f64,
    pub snap_threshold_ms: f64,
    pub probe_offset_ms: f64,
    /// Perceptual color change aimed for on each scrub frame.
    pub target_delta_per_frame: f32,
    pub impending_step_ms: f64,
    pub min_step_ms: f64,
    pub max_step_ms: f64,
    /// Half-width of the window around sunrise and sunset treated as a transition zone.
    pub zone_half_width_ms: f64,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            settle_ms: 100.0,
            transition_ms: 300.0,
            transition_fps: 15.0,
            snap_threshold_ms: 30.0 * SECOND_MS,
            probe_offset_ms: 60.0 * SECOND_MS,
            target_delta_per_frame: 1.0,
            impending_step_ms: 6.0 * MINUTE_MS,
            min_step_ms: 30.0 * SECOND_MS,
            max_step_ms: 4.0 * HOUR_MS,
            zone_half_width_ms: HOUR_MS,
        }
    }
}

impl AnimatorConfig {
    pub fn frame_interval_ms(&self) -> f64 {
        if self.transition_fps > 0.0 {
            SECOND_MS / self.transition_fps
        } else {
            0.0
        }
    }
}
