use formats::StoryCollectionError;
use stories::ConfigError;
use wasm_bindgen::JsValue;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    /// The map widget constructor threw.
    WidgetInit(String),
    MissingElement(String),
    Fetch(String),
    Parse(StoryCollectionError),
    Js(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "{e}"),
            AppError::WidgetInit(msg) => write!(f, "map widget failed to initialize: {msg}"),
            AppError::MissingElement(id) => write!(f, "element #{id} not found"),
            AppError::Fetch(msg) => write!(f, "dataset fetch failed: {msg}"),
            AppError::Parse(e) => write!(f, "dataset is not usable: {e}"),
            AppError::Js(msg) => write!(f, "javascript error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<StoryCollectionError> for AppError {
    fn from(e: StoryCollectionError) -> Self {
        AppError::Parse(e)
    }
}

impl From<JsValue> for AppError {
    fn from(value: JsValue) -> Self {
        AppError::Js(js_message(&value))
    }
}

impl From<AppError> for JsValue {
    fn from(e: AppError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

/// Best-effort text of a thrown JS value.
pub fn js_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
