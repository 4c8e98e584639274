use crate::web::{TOGGLE_EVENT, is_matrix_active, toggle_matrix};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct MatrixToggleProps {
    pub enter_label: AttrValue,
    pub exit_label: AttrValue,
}

impl Default for MatrixToggleProps {
    fn default() -> Self {
        Self {
            enter_label: AttrValue::from("Enter the Matrix"),
            exit_label: AttrValue::from("Exit the Matrix"),
        }
    }
}

#[function_component(MatrixToggle)]
pub fn matrix_toggle(props: &MatrixToggleProps) -> Html {
    let active = use_state(is_matrix_active);
    {
        // follow flips from window.toggleMatrix and the JS exports too
        let active = active.clone();
        use_effect_with((), move |_| {
            let window = web_sys::window();
            let sync_cb = Closure::wrap(Box::new(move |_e: web_sys::Event| {
                active.set(is_matrix_active());
            }) as Box<dyn FnMut(_)>);
            if let Some(window) = &window {
                window
                    .add_event_listener_with_callback(TOGGLE_EVENT, sync_cb.as_ref().unchecked_ref())
                    .ok();
            }
            // Cleanup
            move || {
                if let Some(window) = window {
                    let _ = window.remove_event_listener_with_callback(
                        TOGGLE_EVENT,
                        sync_cb.as_ref().unchecked_ref(),
                    );
                }
            }
        });
    }
    let toggle_cb = Callback::from(|_: MouseEvent| toggle_matrix());
    let label = if *active {
        props.exit_label.clone()
    } else {
        props.enter_label.clone()
    };
    html! {
        <button type="button" class="matrix-toggle" aria-pressed={(*active).to_string()} onclick={toggle_cb}>
            { label }
        </button>
    }
}
