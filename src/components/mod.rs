pub mod matrix_toggle;

pub use matrix_toggle::{MatrixToggle, MatrixToggleProps};

/// Render the toggle button into `#matrix-toggle` when the page has one.
pub fn mount_toggle_button() {
    let root = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id("matrix-toggle"));
    if let Some(root) = root {
        yew::Renderer::<MatrixToggle>::with_root_and_props(root, MatrixToggleProps::default())
            .render();
    }
}
