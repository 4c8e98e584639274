//! Browser side: the DOM host, the `requestAnimationFrame` adapter and the
//! functions the page calls.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement, Window};

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::host::{FrameHandle, Host};
use crate::model::DrawCommand;
use crate::overlay::RainOverlay;
use crate::rng::JsRandom;

struct Surface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

pub struct DomHost {
    window: Window,
    document: Document,
    body: HtmlElement,
    surface: Option<Surface>,
    /// Re-enters the overlay on every refresh; installed by `page_overlay`.
    frame_callback: Option<Closure<dyn FnMut()>>,
}

impl DomHost {
    pub fn new() -> Result<Self, OverlayError> {
        let window = web_sys::window().ok_or(OverlayError::NoWindow)?;
        let document = window.document().ok_or(OverlayError::NoDocument)?;
        let body = document.body().ok_or(OverlayError::NoBody)?;
        Ok(Self {
            window,
            document,
            body,
            surface: None,
            frame_callback: None,
        })
    }

    fn set_frame_callback(&mut self, callback: Closure<dyn FnMut()>) {
        self.frame_callback = Some(callback);
    }

    fn logo(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }
}

fn viewport(window: &Window) -> Option<(f64, f64)> {
    let width = window.inner_width().ok().and_then(|v| v.as_f64());
    let height = window.inner_height().ok().and_then(|v| v.as_f64());
    match (width, height) {
        (Some(width), Some(height)) => Some((width, height)),
        _ => {
            log::debug!("viewport size unreadable");
            None
        }
    }
}

/// Leaves the canvas at its last size when the viewport cannot be read.
fn fit_to_viewport(window: &Window, canvas: &HtmlCanvasElement) {
    let Some((width, height)) = viewport(window) else {
        return;
    };
    canvas.set_width(width.max(0.0) as u32);
    canvas.set_height(height.max(0.0) as u32);
}

impl Host for DomHost {
    fn create_surface(&mut self, config: &OverlayConfig) -> Result<(), OverlayError> {
        if self.surface.is_some() {
            return Ok(());
        }
        let canvas = self
            .document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| OverlayError::NoContext)?;
        canvas.set_id(&config.canvas_id);

        let z_index = config.z_index.to_string();
        let opacity = config.opacity.to_string();
        let style = canvas.style();
        for (prop, value) in [
            ("position", "fixed"),
            ("top", "0"),
            ("left", "0"),
            ("width", "100%"),
            ("height", "100%"),
            ("z-index", z_index.as_str()),
            ("pointer-events", "none"),
            ("display", "none"),
            ("opacity", opacity.as_str()),
        ] {
            style.set_property(prop, value)?;
        }
        self.body.append_child(&canvas)?;

        let ctx = canvas
            .get_context("2d")?
            .ok_or(OverlayError::NoContext)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| OverlayError::NoContext)?;

        fit_to_viewport(&self.window, &canvas);
        let resize_cb = {
            let window = self.window.clone();
            let canvas = canvas.clone();
            Closure::wrap(Box::new(move |_e: web_sys::Event| {
                fit_to_viewport(&window, &canvas);
            }) as Box<dyn FnMut(_)>)
        };
        self.window
            .add_event_listener_with_callback("resize", resize_cb.as_ref().unchecked_ref())?;
        // page lifetime
        resize_cb.forget();

        self.surface = Some(Surface { canvas, ctx });
        Ok(())
    }

    fn viewport_size(&self) -> (f64, f64) {
        // an unreadable viewport lays out no lanes
        viewport(&self.window).unwrap_or((0.0, 0.0))
    }

    fn surface_size(&self) -> (f64, f64) {
        self.surface
            .as_ref()
            .map(|s| (f64::from(s.canvas.width()), f64::from(s.canvas.height())))
            .unwrap_or((0.0, 0.0))
    }

    fn set_surface_visible(&mut self, visible: bool) {
        if let Some(surface) = &self.surface {
            let display = if visible { "block" } else { "none" };
            if let Err(err) = surface.canvas.style().set_property("display", display) {
                log::debug!("matrix canvas display not set: {err:?}");
            }
        }
    }

    fn paint(
        &mut self,
        commands: &[DrawCommand],
        config: &OverlayConfig,
    ) -> Result<(), OverlayError> {
        let Some(surface) = &self.surface else {
            return Err(OverlayError::NoContext);
        };
        let ctx = &surface.ctx;
        let [r, g, b] = config.glyph_rgb;
        ctx.set_font(&config.font());
        let mut buf = [0u8; 4];
        for cmd in commands {
            match *cmd {
                DrawCommand::Fade {
                    width,
                    height,
                    alpha,
                } => {
                    ctx.set_fill_style_str(&format!("rgba(0, 0, 0, {alpha})"));
                    ctx.fill_rect(0.0, 0.0, width, height);
                }
                DrawCommand::Glyph { ch, x, y, alpha } => {
                    ctx.set_fill_style_str(&format!("rgba({r}, {g}, {b}, {alpha})"));
                    ctx.fill_text(ch.encode_utf8(&mut buf), x, y)?;
                }
            }
        }
        Ok(())
    }

    fn has_logo(&self, selector: &str) -> bool {
        self.logo(selector).is_some()
    }

    fn logo_src(&self, selector: &str) -> Option<String> {
        self.logo(selector).and_then(|el| el.get_attribute("src"))
    }

    fn set_logo_src(&mut self, selector: &str, src: &str) {
        if let Some(el) = self.logo(selector) {
            if let Err(err) = el.set_attribute("src", src) {
                log::debug!("logo src not set: {err:?}");
            }
        }
    }

    fn add_root_class(&mut self, class: &str) {
        let _ = self.body.class_list().add_1(class);
    }

    fn remove_root_class(&mut self, class: &str) {
        let _ = self.body.class_list().remove_1(class);
    }

    fn remove_root_class_later(&mut self, class: &str, delay_ms: i32) {
        let body = self.body.clone();
        let class = class.to_owned();
        let clear = Closure::once_into_js(move || {
            let _ = body.class_list().remove_1(&class);
        });
        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(clear.unchecked_ref(), delay_ms)
        {
            log::debug!("preload marker timer not set: {err:?}");
        }
    }

    fn request_frame(&mut self) -> Result<FrameHandle, OverlayError> {
        let callback = self
            .frame_callback
            .as_ref()
            .ok_or_else(|| OverlayError::Js("frame callback not installed".into()))?;
        Ok(self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())?)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let _ = self.window.cancel_animation_frame(handle);
    }
}

type PageOverlay = RainOverlay<DomHost, JsRandom>;

/// Fired on `window` whenever the rain turns on or off, whoever asked.
pub const TOGGLE_EVENT: &str = "matrixtoggle";

thread_local! {
    static OVERLAY: RefCell<Option<Rc<RefCell<PageOverlay>>>> = const { RefCell::new(None) };
}

/// The page's single overlay, built on first use.
fn page_overlay() -> Result<Rc<RefCell<PageOverlay>>, OverlayError> {
    if let Some(existing) = OVERLAY.with(|cell| cell.borrow().clone()) {
        return Ok(existing);
    }
    let overlay = Rc::new(RefCell::new(RainOverlay::new(DomHost::new()?, JsRandom)));
    let weak: Weak<RefCell<PageOverlay>> = Rc::downgrade(&overlay);
    let on_frame = Closure::wrap(Box::new(move || {
        if let Some(overlay) = weak.upgrade() {
            overlay.borrow_mut().frame();
        }
    }) as Box<dyn FnMut()>);
    overlay.borrow_mut().host_mut().set_frame_callback(on_frame);
    OVERLAY.with(|cell| *cell.borrow_mut() = Some(overlay.clone()));
    Ok(overlay)
}

fn with_overlay(op: impl FnOnce(&mut PageOverlay)) {
    match page_overlay() {
        Ok(overlay) => apply(&overlay, op),
        Err(err) => log::warn!("matrix rain unavailable: {err}"),
    }
}

/// Run `op` and announce a state flip once the overlay borrow is released,
/// so listeners may query it.
fn apply(overlay: &Rc<RefCell<PageOverlay>>, op: impl FnOnce(&mut PageOverlay)) {
    let flipped = {
        let mut overlay = overlay.borrow_mut();
        let was_active = overlay.is_active();
        op(&mut overlay);
        overlay.is_active() != was_active
    };
    if flipped {
        notify_toggled();
    }
}

fn notify_toggled() {
    let Some(window) = web_sys::window() else {
        return;
    };
    match web_sys::Event::new(TOGGLE_EVENT) {
        Ok(event) => {
            if let Err(err) = window.dispatch_event(&event) {
                log::debug!("{TOGGLE_EVENT} not dispatched: {err:?}");
            }
        }
        Err(err) => log::debug!("{TOGGLE_EVENT} not created: {err:?}"),
    }
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    crate::util::init_logging();
    if let Err(err) = install_global_toggle() {
        log::warn!("window.toggleMatrix not installed: {err}");
    }
    crate::components::mount_toggle_button();
}

/// Expose `window.toggleMatrix()` for inline page handlers.
fn install_global_toggle() -> Result<(), OverlayError> {
    let window = web_sys::window().ok_or(OverlayError::NoWindow)?;
    let toggle = Closure::wrap(Box::new(toggle_matrix) as Box<dyn FnMut()>);
    js_sys::Reflect::set(&window, &JsValue::from_str("toggleMatrix"), toggle.as_ref())?;
    toggle.forget();
    Ok(())
}

#[wasm_bindgen(js_name = toggleMatrix)]
pub fn toggle_matrix() {
    with_overlay(|o| o.toggle());
}

#[wasm_bindgen(js_name = startMatrix)]
pub fn start_matrix() {
    with_overlay(|o| o.start());
}

#[wasm_bindgen(js_name = stopMatrix)]
pub fn stop_matrix() {
    // nothing to stop if the overlay was never built
    let existing = OVERLAY.with(|cell| cell.borrow().clone());
    if let Some(overlay) = existing {
        apply(&overlay, |o| o.stop());
    }
}

#[wasm_bindgen(js_name = isMatrixActive)]
pub fn is_matrix_active() -> bool {
    OVERLAY.with(|cell| {
        cell.borrow()
            .as_ref()
            .is_some_and(|overlay| overlay.borrow().is_active())
    })
}

/// Override the overlay configuration from a JSON object. Must run before
/// the first activation.
#[wasm_bindgen(js_name = configureMatrix)]
pub fn configure_matrix(json: &str) -> Result<(), JsValue> {
    let config = OverlayConfig::from_json(json)?;
    let overlay = page_overlay()?;
    let result = overlay.borrow_mut().configure(config);
    if let Err(err) = &result {
        log::warn!("matrix config rejected: {err}");
    }
    Ok(result?)
}
