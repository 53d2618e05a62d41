//! Bindings to the Mapbox GL JS globals (`mapboxgl.*`).
//!
//! Option objects are plain JS values built from `serde_json` through
//! [`to_js`]; rendered features come back through [`from_js`].

use wasm_bindgen::prelude::*;

use crate::error::AppError;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = mapboxgl, js_name = Map)]
    #[derive(Debug, Clone)]
    pub type MapboxMap;

    #[wasm_bindgen(constructor, catch, js_namespace = mapboxgl, js_class = "Map")]
    pub fn new(options: &JsValue) -> Result<MapboxMap, JsValue>;

    #[wasm_bindgen(method)]
    pub fn on(this: &MapboxMap, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method, js_name = on)]
    pub fn on_layer(this: &MapboxMap, event: &str, layer_id: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method, js_name = addControl)]
    pub fn add_control(this: &MapboxMap, control: &NavigationControl, position: &str);

    #[wasm_bindgen(method, catch, js_name = addSource)]
    pub fn add_source(this: &MapboxMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    pub fn add_layer(this: &MapboxMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = getSource)]
    pub fn get_source(this: &MapboxMap, id: &str) -> Option<GeoJsonSource>;

    #[wasm_bindgen(method, js_name = queryRenderedFeatures)]
    pub fn query_rendered_features(this: &MapboxMap, point: &JsValue, options: &JsValue) -> js_sys::Array;

    #[wasm_bindgen(method, js_name = easeTo)]
    pub fn ease_to(this: &MapboxMap, options: &JsValue);

    #[wasm_bindgen(method, js_name = getCanvas)]
    pub fn get_canvas(this: &MapboxMap) -> web_sys::HtmlCanvasElement;

    #[wasm_bindgen(method, js_name = setPadding)]
    pub fn set_padding(this: &MapboxMap, padding: &JsValue);

    #[wasm_bindgen(js_namespace = mapboxgl, js_name = GeoJSONSource)]
    #[derive(Debug, Clone)]
    pub type GeoJsonSource;

    #[wasm_bindgen(method, js_name = setData)]
    pub fn set_data(this: &GeoJsonSource, data: &JsValue);

    /// `callback(err, zoom)`
    #[wasm_bindgen(method, js_name = getClusterExpansionZoom)]
    pub fn get_cluster_expansion_zoom(this: &GeoJsonSource, cluster_id: f64, callback: &js_sys::Function);

    #[wasm_bindgen(js_namespace = mapboxgl)]
    #[derive(Debug, Clone)]
    pub type NavigationControl;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl)]
    pub fn new(options: &JsValue) -> NavigationControl;

    #[wasm_bindgen(js_namespace = mapboxgl)]
    #[derive(Debug, Clone)]
    pub type Popup;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl)]
    pub fn new(options: &JsValue) -> Popup;

    #[wasm_bindgen(method, js_name = setLngLat)]
    pub fn set_lng_lat(this: &Popup, lng_lat: &JsValue) -> Popup;

    #[wasm_bindgen(method, js_name = setHTML)]
    pub fn set_html(this: &Popup, html: &str) -> Popup;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &Popup, map: &MapboxMap) -> Popup;
}

/// Assigns `mapboxgl.accessToken`.
pub fn set_access_token(token: &str) -> Result<(), AppError> {
    let global = js_sys::global();
    let mapboxgl = js_sys::Reflect::get(&global, &JsValue::from_str("mapboxgl"))?;
    if mapboxgl.is_undefined() {
        return Err(AppError::WidgetInit("mapboxgl is not loaded".to_string()));
    }
    js_sys::Reflect::set(
        &mapboxgl,
        &JsValue::from_str("accessToken"),
        &JsValue::from_str(token),
    )?;
    Ok(())
}

pub fn to_js(value: &serde_json::Value) -> Result<JsValue, AppError> {
    Ok(js_sys::JSON::parse(&value.to_string())?)
}

/// Round-trips a JS value through `JSON.stringify`. Functions, cycles and
/// `undefined` give `None`.
pub fn from_js(value: &JsValue) -> Option<serde_json::Value> {
    let text = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

/// Reads `obj[key]`, treating `undefined` and lookup failure alike.
pub fn get(obj: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}
