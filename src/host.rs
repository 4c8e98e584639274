//! The page-side collaborator of the overlay.
//!
//! `RainOverlay` never talks to the DOM directly; it goes through [`Host`].
//! The browser implementation lives in `web::DomHost`, unit tests use the
//! in-memory `fake::FakeHost`.

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::model::DrawCommand;

/// Id returned by the display refresh scheduler (`requestAnimationFrame`).
pub type FrameHandle = i32;

pub trait Host {
    /// Create the drawing surface, size it to the viewport and keep it sized
    /// on every viewport resize for the rest of the page lifetime. Called at
    /// most once per overlay.
    fn create_surface(&mut self, config: &OverlayConfig) -> Result<(), OverlayError>;

    fn viewport_size(&self) -> (f64, f64);

    /// Pixel size of the surface, `(0, 0)` before it exists.
    fn surface_size(&self) -> (f64, f64);

    fn set_surface_visible(&mut self, visible: bool);

    fn paint(&mut self, commands: &[DrawCommand], config: &OverlayConfig)
    -> Result<(), OverlayError>;

    fn has_logo(&self, selector: &str) -> bool;

    fn logo_src(&self, selector: &str) -> Option<String>;

    fn set_logo_src(&mut self, selector: &str, src: &str);

    fn add_root_class(&mut self, class: &str);

    fn remove_root_class(&mut self, class: &str);

    /// One-shot: drop `class` from the root after `delay_ms`.
    fn remove_root_class_later(&mut self, class: &str, delay_ms: i32);

    fn request_frame(&mut self) -> Result<FrameHandle, OverlayError>;

    fn cancel_frame(&mut self, handle: FrameHandle);
}
