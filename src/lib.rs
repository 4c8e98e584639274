//! Matrix-style digital rain over a web page.
//!
//! [`RainOverlay`] holds all of the effect's state and is driven through the
//! [`Host`] trait; the `web` module (wasm32 only) supplies the DOM host and
//! exposes `toggleMatrix()` to the page.

pub mod config;
pub mod error;
pub mod host;
pub mod model;
pub mod overlay;
pub mod rng;

#[cfg(target_arch = "wasm32")]
pub mod components;
#[cfg(target_arch = "wasm32")]
mod util;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::OverlayConfig;
pub use error::OverlayError;
pub use host::{FrameHandle, Host};
pub use model::{Column, DrawCommand, FrameParams};
pub use overlay::RainOverlay;
pub use rng::{RandomSource, SeededRandom};
