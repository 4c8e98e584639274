//! Column state and the per-frame rain step.
//!
//! Nothing here touches the DOM: a frame is computed as a list of
//! [`DrawCommand`]s which the host paints however it likes.

use crate::rng::RandomSource;

/// Shortest and longest digit run a column can carry.
pub const MIN_TRAIL: usize = 15;
pub const MAX_TRAIL: usize = 39;
/// Initial columns start anywhere up to this far above the viewport.
pub const ENTRY_STAGGER: f64 = 1000.0;
/// Columns that fell off the bottom re-enter up to this far above the top.
pub const WRAP_STAGGER: f64 = 500.0;
pub const MIN_SPEED: f64 = 1.0;
pub const SPEED_SPREAD: f64 = 2.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Left edge of the lane in pixels.
    pub x: f64,
    /// Head offset in pixels; negative while still above the viewport.
    pub y: f64,
    /// Pixels per frame, fixed at creation.
    pub speed: f64,
    /// Digits currently shown, head first.
    pub chars: Vec<char>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    pub width: f64,
    pub height: f64,
    pub char_spacing: f64,
    pub fade_alpha: f64,
    pub regen_chance: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Translucent black wash over the whole surface (leaves fading trails).
    Fade { width: f64, height: f64, alpha: f64 },
    Glyph { ch: char, x: f64, y: f64, alpha: f64 },
}

pub fn column_count(width: f64, spacing: f64) -> usize {
    if !(width.is_finite() && width > 0.0) || !(spacing > 0.0) {
        return 0;
    }
    // never more lanes than pixels, whatever the pitch
    ((width / spacing).floor() as usize).min(width as usize)
}

pub fn init_columns(width: f64, spacing: f64, rng: &mut impl RandomSource) -> Vec<Column> {
    (0..column_count(width, spacing))
        .map(|i| Column {
            x: i as f64 * spacing,
            y: -rng.next_f64() * ENTRY_STAGGER,
            speed: rng.next_f64() * SPEED_SPREAD + MIN_SPEED,
            chars: Vec::new(),
        })
        .collect()
}

pub fn random_trail(rng: &mut impl RandomSource) -> Vec<char> {
    let spread = (MAX_TRAIL - MIN_TRAIL + 1) as f64;
    let len = MIN_TRAIL + ((rng.next_f64() * spread).floor() as usize).min(MAX_TRAIL - MIN_TRAIL);
    (0..len)
        .map(|_| if rng.chance(0.5) { '0' } else { '1' })
        .collect()
}

/// Advance every column by one frame and return what to paint.
///
/// Order per column: maybe regenerate the digit run, emit visible glyphs at
/// the current offset, then move. Regeneration and wrapping are independent;
/// a wrap only restages the offset.
pub fn step_frame(
    columns: &mut [Column],
    params: FrameParams,
    rng: &mut impl RandomSource,
) -> Vec<DrawCommand> {
    let mut out = Vec::with_capacity(1 + columns.len() * MIN_TRAIL);
    out.push(DrawCommand::Fade {
        width: params.width,
        height: params.height,
        alpha: params.fade_alpha,
    });

    for col in columns.iter_mut() {
        if rng.chance(params.regen_chance) {
            col.chars = random_trail(rng);
        }

        let len = col.chars.len() as f64;
        for (i, &ch) in col.chars.iter().enumerate() {
            let y = col.y + i as f64 * params.char_spacing;
            if y >= 0.0 && y < params.height {
                out.push(DrawCommand::Glyph {
                    ch,
                    x: col.x,
                    y,
                    alpha: 1.0 - i as f64 / len,
                });
            }
        }

        col.y += col.speed;
        if col.y > params.height {
            col.y = -rng.next_f64() * WRAP_STAGGER;
        }
    }
    out
}
