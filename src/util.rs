use wasm_bindgen::JsValue;

pub fn clog(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

/// Route `log` records to the browser console.
pub fn init_logging() {
    if console_log::init_with_level(log::Level::Info).is_err() {
        clog("matrix rain: a logger is already installed, keeping it");
    }
}
