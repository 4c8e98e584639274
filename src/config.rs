//! Overlay configuration.
//!
//! Defaults reproduce the stock look: 14px monospace glyphs on a 1.8x grid,
//! a 0.3-opacity canvas at z-index 2 and the `.header-logo` swap. Pages may
//! override any subset of fields with a JSON object before first activation.

use serde::{Deserialize, Serialize};

use crate::error::OverlayError;
use crate::model::FrameParams;

pub const FONT_SIZE: f64 = 14.0;
/// Lane and glyph pitch as a multiple of the font size.
pub const SPACING_FACTOR: f64 = 1.8;
pub const PRELOAD_CLEAR_MS: i32 = 150;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    pub font_size: f64,
    pub spacing_factor: f64,
    pub canvas_id: String,
    pub z_index: i32,
    /// CSS opacity of the whole canvas, keeps page content legible.
    pub opacity: f64,
    pub logo_selector: String,
    pub matrix_logo_src: String,
    /// Class kept on `<body>` while the rain is on.
    pub mode_class: String,
    /// Class flashed on `<body>` to replay the logo entrance animation.
    pub preload_class: String,
    pub preload_ms: i32,
    pub fade_alpha: f64,
    /// Per-column, per-frame chance of drawing a fresh digit run.
    pub regen_chance: f64,
    pub glyph_rgb: [u8; 3],
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_size: FONT_SIZE,
            spacing_factor: SPACING_FACTOR,
            canvas_id: "matrix-canvas".into(),
            z_index: 2,
            opacity: 0.3,
            logo_selector: ".header-logo".into(),
            matrix_logo_src: "images/logo-matrix.png".into(),
            mode_class: "matrix-mode".into(),
            preload_class: "is-preload".into(),
            preload_ms: PRELOAD_CLEAR_MS,
            fade_alpha: 0.05,
            regen_chance: 0.05,
            glyph_rgb: [0, 255, 65],
        }
    }
}

impl OverlayConfig {
    pub fn from_json(raw: &str) -> Result<Self, OverlayError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the layout math or the canvas styles.
    pub fn validate(&self) -> Result<(), OverlayError> {
        for (field, value) in [
            ("font_size", self.font_size),
            ("spacing_factor", self.spacing_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(OverlayError::InvalidConfig {
                    field,
                    reason: "must be finite and greater than 0",
                });
            }
        }
        // lanes must be at least a pixel apart
        let spacing = self.spacing();
        if !spacing.is_finite() || spacing < 1.0 {
            return Err(OverlayError::InvalidConfig {
                field: "spacing_factor",
                reason: "font_size * spacing_factor must be finite and at least 1",
            });
        }
        for (field, value) in [
            ("opacity", self.opacity),
            ("fade_alpha", self.fade_alpha),
            ("regen_chance", self.regen_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(OverlayError::InvalidConfig {
                    field,
                    reason: "must be within 0..=1",
                });
            }
        }
        if self.preload_ms < 0 {
            return Err(OverlayError::InvalidConfig {
                field: "preload_ms",
                reason: "must not be negative",
            });
        }
        Ok(())
    }

    /// Horizontal lane pitch, also the vertical pitch between glyphs.
    pub fn spacing(&self) -> f64 {
        self.font_size * self.spacing_factor
    }

    pub fn font(&self) -> String {
        format!("{}px monospace", self.font_size)
    }

    pub fn frame_params(&self, width: f64, height: f64) -> FrameParams {
        FrameParams {
            width,
            height,
            char_spacing: self.spacing(),
            fade_alpha: self.fade_alpha,
            regen_chance: self.regen_chance,
        }
    }
}
