//! The rain controller: owns the columns and drives the host through
//! start / stop / per-frame rendering.

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::host::{FrameHandle, Host};
use crate::model::{Column, init_columns, step_frame};
use crate::rng::RandomSource;

pub struct RainOverlay<H, R> {
    host: H,
    rng: R,
    config: OverlayConfig,
    active: bool,
    /// Set once the host surface and the column set exist.
    surface_ready: bool,
    columns: Vec<Column>,
    /// Logo src seen at the first activation; never overwritten.
    original_logo_src: Option<String>,
    frame_handle: Option<FrameHandle>,
}

impl<H: Host, R: RandomSource> RainOverlay<H, R> {
    pub fn new(host: H, rng: R) -> Self {
        Self::with_config(host, rng, OverlayConfig::default())
    }

    pub fn with_config(host: H, rng: R, config: OverlayConfig) -> Self {
        Self {
            host,
            rng,
            config,
            active: false,
            surface_ready: false,
            columns: Vec::new(),
            original_logo_src: None,
            frame_handle: None,
        }
    }

    /// Swap the configuration. Only allowed until the surface has been built.
    pub fn configure(&mut self, config: OverlayConfig) -> Result<(), OverlayError> {
        if self.surface_ready {
            return Err(OverlayError::AlreadyInitialized);
        }
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn original_logo_src(&self) -> Option<&str> {
        self.original_logo_src.as_deref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn toggle(&mut self) {
        if self.active {
            self.stop();
        } else {
            self.start();
        }
    }

    pub fn start(&mut self) {
        if self.active {
            return;
        }
        if let Err(err) = self.ensure_surface() {
            log::warn!("matrix rain unavailable: {err}");
            return;
        }

        let selector = &self.config.logo_selector;
        if self.host.has_logo(selector) {
            if self.original_logo_src.is_none() {
                self.original_logo_src = self.host.logo_src(selector);
            }
            self.host.set_logo_src(selector, &self.config.matrix_logo_src);
        }

        self.active = true;
        self.host.set_surface_visible(true);
        self.host.add_root_class(&self.config.mode_class);
        // replays the css entrance animation of the logo
        self.host.add_root_class(&self.config.preload_class);
        self.host
            .remove_root_class_later(&self.config.preload_class, self.config.preload_ms);

        log::info!("matrix rain on, {} columns", self.columns.len());
        self.frame();
    }

    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(handle) = self.frame_handle.take() {
            self.host.cancel_frame(handle);
        }
        self.host.set_surface_visible(false);

        let selector = &self.config.logo_selector;
        if let Some(src) = &self.original_logo_src {
            if self.host.has_logo(selector) {
                self.host.set_logo_src(selector, src);
            }
        }
        self.host.remove_root_class(&self.config.mode_class);
        log::info!("matrix rain off");
    }

    /// Render one display refresh and schedule the next. Returns whether a
    /// follow-up frame was scheduled; an inactive overlay draws nothing.
    pub fn frame(&mut self) -> bool {
        // whatever handle we held has fired (or was cancelled)
        self.frame_handle = None;
        if !self.active {
            return false;
        }

        let (width, height) = self.host.surface_size();
        let params = self.config.frame_params(width, height);
        let commands = step_frame(&mut self.columns, params, &mut self.rng);
        if let Err(err) = self.host.paint(&commands, &self.config) {
            log::debug!("matrix frame not painted: {err}");
        }

        match self.host.request_frame() {
            Ok(handle) => {
                self.frame_handle = Some(handle);
                true
            }
            Err(err) => {
                log::warn!("matrix frame loop halted: {err}");
                false
            }
        }
    }

    fn ensure_surface(&mut self) -> Result<(), OverlayError> {
        if self.surface_ready {
            return Ok(());
        }
        // `with_config` takes the config as given
        self.config.validate()?;
        self.host.create_surface(&self.config)?;
        let (width, _) = self.host.viewport_size();
        self.columns = init_columns(width, self.config.spacing(), &mut self.rng);
        self.surface_ready = true;
        log::debug!("matrix surface ready, viewport width {width}");
        Ok(())
    }
}

// proptest does not build for wasm32-unknown-unknown
#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::model::DrawCommand;
    use crate::rng::SeededRandom;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const LOGO: &str = "images/logo.png";
    const MATRIX_LOGO: &str = "images/logo-matrix.png";

    fn overlay(host: FakeHost) -> RainOverlay<FakeHost, SeededRandom> {
        RainOverlay::new(host, SeededRandom::new(0xC0FFEE))
    }

    fn page() -> RainOverlay<FakeHost, SeededRandom> {
        overlay(FakeHost::new(1000.0, 800.0).with_logo(LOGO))
    }

    fn fade_size(cmds: &[DrawCommand]) -> (f64, f64) {
        match cmds.first() {
            Some(DrawCommand::Fade { width, height, .. }) => (*width, *height),
            other => panic!("frame must open with a fade, got {other:?}"),
        }
    }

    #[test]
    fn scenario_start_then_stop() {
        let mut o = page();
        o.start();
        assert!(o.is_active());
        assert!(o.host().visible);
        assert_eq!(o.columns().len(), 39);
        assert!(o.host().classes.contains("matrix-mode"));
        assert_eq!(o.host().current_logo(), Some(MATRIX_LOGO));
        assert_eq!(o.host().frames.len(), 1);
        let pending = o.host().pending_frame;
        assert!(pending.is_some());

        o.stop();
        assert!(!o.is_active());
        assert!(!o.host().visible);
        assert!(!o.host().classes.contains("matrix-mode"));
        assert_eq!(o.host().current_logo(), Some(LOGO));
        assert_eq!(o.host().cancelled, vec![pending.unwrap()]);
        assert_eq!(o.host().pending_frame, None);
    }

    #[test]
    fn second_start_changes_nothing() {
        let mut once = page();
        once.start();
        let mut twice = page();
        twice.start();
        twice.start();

        assert_eq!(once.is_active(), twice.is_active());
        assert_eq!(once.columns(), twice.columns());
        assert_eq!(once.host().frames, twice.host().frames);
        assert_eq!(once.host().logo_writes, twice.host().logo_writes);
        assert_eq!(once.host().classes, twice.host().classes);
        assert_eq!(once.host().timers, twice.host().timers);
        assert_eq!(once.host().requested, twice.host().requested);
        assert_eq!(twice.host().surfaces_created, 1);
    }

    #[test]
    fn start_start_stop_swaps_and_restores_once() {
        let mut o = page();
        o.start();
        o.start();
        o.stop();
        assert_eq!(o.host().logo_writes, vec![MATRIX_LOGO, LOGO]);
        assert_eq!(o.host().cancelled.len(), 1);
        assert_eq!(o.host().surfaces_created, 1);
    }

    #[test]
    fn stop_before_start_is_noop() {
        let mut o = page();
        o.stop();
        o.stop();
        let host = o.host();
        assert!(!o.is_active());
        assert_eq!(host.surfaces_created, 0);
        assert!(host.classes.is_empty());
        assert!(host.logo_writes.is_empty());
        assert!(host.cancelled.is_empty());
        assert!(host.frames.is_empty());
        assert_eq!(o.original_logo_src(), None);
    }

    #[test]
    fn logo_always_restored_to_first_value() {
        let mut o = page();
        for _ in 0..3 {
            o.start();
            assert_eq!(o.host().current_logo(), Some(MATRIX_LOGO));
            o.stop();
            assert_eq!(o.host().current_logo(), Some(LOGO));
        }
        assert_eq!(o.original_logo_src(), Some(LOGO));
        assert_eq!(o.host().surfaces_created, 1);
    }

    #[test]
    fn missing_logo_is_skipped() {
        let mut o = overlay(FakeHost::new(640.0, 480.0));
        o.start();
        assert!(o.is_active());
        assert!(o.host().classes.contains("matrix-mode"));
        o.stop();
        assert!(o.host().logo_writes.is_empty());
        assert_eq!(o.original_logo_src(), None);
    }

    #[test]
    fn preload_marker_is_transient() {
        let mut o = page();
        o.start();
        assert!(o.host().classes.contains("is-preload"));
        assert_eq!(o.host().timers, vec![("is-preload".to_string(), 150)]);
        o.host_mut().run_timers();
        assert!(!o.host().classes.contains("is-preload"));
        assert!(o.host().classes.contains("matrix-mode"));
    }

    #[test]
    fn frame_loop_runs_until_stopped() {
        let mut o = page();
        o.start();
        for _ in 0..10 {
            assert!(o.host_mut().take_frame().is_some());
            assert!(o.frame());
        }
        assert_eq!(o.host().frames.len(), 11);

        // a refresh already handed out before stop must be inert
        let in_flight = o.host_mut().take_frame();
        assert!(in_flight.is_some());
        o.stop();
        let requested = o.host().requested;
        assert!(!o.frame());
        assert_eq!(o.host().frames.len(), 11);
        assert_eq!(o.host().requested, requested);
        assert_eq!(o.host().pending_frame, None);
    }

    #[test]
    fn resize_while_inactive_sizes_next_frames() {
        let mut o = page();
        o.start();
        o.stop();
        o.host_mut().resize(1280.0, 720.0);
        assert_eq!(o.host().surface, Some((1280.0, 720.0)));

        o.start();
        let last = o.host().frames.last().expect("frame painted");
        assert_eq!(fade_size(last), (1280.0, 720.0));
        // lanes are laid out once per page lifetime
        assert_eq!(o.columns().len(), 39);
    }

    #[test]
    fn resize_before_first_start_uses_new_viewport() {
        let mut o = page();
        o.host_mut().resize(504.0, 300.0);
        assert_eq!(o.host().surface, None);
        o.start();
        assert_eq!(o.columns().len(), 20);
        assert_eq!(fade_size(&o.host().frames[0]), (504.0, 300.0));
    }

    #[test]
    fn drawn_glyphs_stay_inside_surface_across_resizes() {
        let mut o = page();
        o.start();
        for i in 0..400 {
            if i == 150 {
                o.host_mut().resize(1000.0, 200.0);
            }
            o.host_mut().take_frame();
            o.frame();
        }
        for frame in &o.host().frames {
            let (_, h) = fade_size(frame);
            for cmd in frame {
                if let DrawCommand::Glyph { y, .. } = *cmd {
                    assert!(y >= 0.0 && y < h, "glyph at {y} outside 0..{h}");
                }
            }
        }
    }

    #[test]
    fn failed_surface_keeps_overlay_off() {
        let mut host = FakeHost::new(800.0, 600.0).with_logo(LOGO);
        host.fail_surface = true;
        let mut o = overlay(host);
        o.start();
        assert!(!o.is_active());
        assert!(o.host().classes.is_empty());
        assert!(o.host().logo_writes.is_empty());

        o.host_mut().fail_surface = false;
        o.start();
        assert!(o.is_active());
        assert_eq!(o.host().surfaces_created, 1);
    }

    #[test]
    fn configure_only_before_surface_exists() {
        let mut o = page();
        let cfg = OverlayConfig {
            matrix_logo_src: "img/alt.png".into(),
            mode_class: "rain".into(),
            ..OverlayConfig::default()
        };
        o.configure(cfg.clone()).expect("not yet initialized");
        o.start();
        assert_eq!(o.host().current_logo(), Some("img/alt.png"));
        assert!(o.host().classes.contains("rain"));

        let err = o.configure(OverlayConfig::default()).unwrap_err();
        assert!(matches!(err, OverlayError::AlreadyInitialized));
        assert_eq!(o.config(), &cfg);
    }

    #[test]
    fn configure_rejects_out_of_range_values() {
        let mut o = page();
        let bad = OverlayConfig {
            regen_chance: 1.5,
            ..OverlayConfig::default()
        };
        let err = o.configure(bad).unwrap_err();
        assert!(
            matches!(err, OverlayError::InvalidConfig { field: "regen_chance", .. }),
            "got {err:?}"
        );
        assert_eq!(o.config(), &OverlayConfig::default());
    }

    #[test]
    fn degenerate_spacing_degrades_to_noop() {
        let cfg = OverlayConfig {
            font_size: 1e-300,
            ..OverlayConfig::default()
        };
        let mut o = RainOverlay::with_config(
            FakeHost::new(1000.0, 800.0).with_logo(LOGO),
            SeededRandom::new(5),
            cfg,
        );
        o.start();
        assert!(!o.is_active());
        assert!(o.columns().is_empty());
        assert_eq!(o.host().surfaces_created, 0);
        assert!(o.host().logo_writes.is_empty());
        o.toggle();
        assert!(!o.is_active());
    }

    proptest! {
        #[test]
        fn toggle_parity(n in 0usize..40) {
            let mut o = page();
            for _ in 0..n {
                o.toggle();
            }
            let on = n % 2 == 1;
            prop_assert_eq!(o.is_active(), on);
            prop_assert_eq!(o.host().visible, on);
            prop_assert_eq!(o.host().classes.contains("matrix-mode"), on);
            prop_assert_eq!(o.host().pending_frame.is_some(), on);
            prop_assert_eq!(o.host().surfaces_created, usize::from(n > 0));
        }
    }
}
