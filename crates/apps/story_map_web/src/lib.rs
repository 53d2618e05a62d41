//! Browser entry points for the story map.

use console_error_panic_hook::set_once;
use pickers::PickerHost;
use std::cell::RefCell;
use stories::{MapConfig, PickerVariant, YearToken};
use wasm_bindgen::prelude::*;

mod app;
pub mod dom;
mod error;
mod logging;
mod mapbox;
pub mod pickers;

pub use app::{SharedApp, StoryMapApp};
pub use error::AppError;

thread_local! {
    static APP: RefCell<Option<SharedApp>> = const { RefCell::new(None) };
}

fn with_app<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut StoryMapApp) -> R,
{
    APP.with(|slot| {
        let slot = slot.borrow();
        let app = slot.as_ref()?;
        let mut app = app.try_borrow_mut().ok()?;
        Some(f(&mut app))
    })
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Creates the map, pickers and event wiring. `config_json` is an optional
/// JSON object overriding any `MapConfig` field.
///
/// Calling again after a successful start does nothing. A map widget that
/// fails to construct leaves the fallback message in the container and is
/// not reported as an error.
#[wasm_bindgen]
pub fn start_story_map(config_json: Option<String>) -> Result<(), JsValue> {
    if APP.with(|slot| slot.borrow().is_some()) {
        return Ok(());
    }

    let config = match MapConfig::from_json(config_json.as_deref().unwrap_or("")) {
        Ok(config) => config,
        Err(err) => {
            logging::init(tracing::Level::INFO);
            tracing::error!(%err, "story map not started");
            return Err(AppError::from(err).into());
        }
    };
    logging::init(config.tracing_level());

    match StoryMapApp::start(config) {
        Ok(app) => {
            APP.with(|slot| *slot.borrow_mut() = Some(app));
            Ok(())
        }
        Err(err @ AppError::WidgetInit(_)) => {
            tracing::error!(%err, "showing fallback");
            Ok(())
        }
        Err(err) => {
            tracing::error!(%err, "story map not started");
            Err(err.into())
        }
    }
}

/// Selects a year (or `"all"`). Returns false when the year is unknown or
/// the dataset has not loaded yet.
#[wasm_bindgen]
pub fn select_year(year: &str) -> bool {
    with_app(|app| app.select_year(year)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn current_year() -> String {
    with_app(|app| app.selection().selected().as_str().to_string())
        .unwrap_or_else(|| YearToken::ALL.to_string())
}

/// `"all"` followed by the dataset years, newest first.
#[wasm_bindgen]
pub fn available_years() -> js_sys::Array {
    with_app(|app| app.selection().index().as_strings())
        .unwrap_or_else(|| vec![YearToken::ALL.to_string()])
        .into_iter()
        .map(JsValue::from)
        .collect()
}

/// Shows the `native` or `popover` picker and hides the other.
#[wasm_bindgen]
pub fn set_picker_variant(variant: &str) -> Result<(), JsValue> {
    let Some(variant) = PickerVariant::from_str(variant) else {
        return Err(JsValue::from_str(&format!("unknown picker variant {variant:?}")));
    };
    with_app(|app| app.set_picker_variant(variant))
        .ok_or_else(|| JsValue::from_str("story map is not running"))
}
