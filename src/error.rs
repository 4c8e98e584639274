use wasm_bindgen::JsValue;

/// Everything that can keep the rain from rendering. None of these abort the
/// page: callers log them and carry on without the effect.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("no global `window` exists")]
    NoWindow,
    #[error("window has no document")]
    NoDocument,
    #[error("document has no body")]
    NoBody,
    #[error("2d canvas context unavailable")]
    NoContext,
    #[error("dom call failed: {0}")]
    Js(String),
    #[error("overlay surface already exists, configuration is fixed")]
    AlreadyInitialized,
    #[error("invalid overlay config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("overlay config field `{field}` {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
}

impl From<JsValue> for OverlayError {
    fn from(value: JsValue) -> Self {
        OverlayError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<OverlayError> for JsValue {
    fn from(err: OverlayError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
