use std::cell::RefCell;
use std::rc::Rc;

use formats::{StoryCollection, StoryCollectionError, StoryFeature};
use gloo_net::http::Request;
use layers::{ClusterHit, LayerId, story_layers};
use serde_json::{Value, json};
use stories::{
    MapConfig, PickerVariant, PopoverEvent, PopupBuilder, PopupPlacement, SelectionController,
    YearToken, popup_anchor,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::Document;

use crate::dom::{self, PageDecoder};
use crate::error::{AppError, js_message};
use crate::mapbox::{self, MapboxMap, NavigationControl, Popup, from_js, to_js};
use crate::pickers::{PickerHost, YearPickers};

pub type SharedApp = Rc<RefCell<StoryMapApp>>;

pub struct StoryMapApp {
    config: MapConfig,
    document: Document,
    map: MapboxMap,
    selection: SelectionController,
    pickers: YearPickers,
    popup: PopupBuilder<PageDecoder>,
    /// The dataset exactly as fetched, handed back to the map for `All`.
    raw: Option<Value>,
    fetch_started: bool,
}

impl StoryMapApp {
    /// Creates the map and pickers and subscribes to map events.
    ///
    /// When the widget cannot be constructed the container gets the
    /// fallback message and `AppError::WidgetInit` is returned.
    pub fn start(config: MapConfig) -> Result<SharedApp, AppError> {
        let document = dom::document()?;
        let map = match create_map(&config) {
            Ok(map) => map,
            Err(err) => {
                dom::show_fallback(&document, &config.container_id, &config.fallback_message);
                return Err(err);
            }
        };

        let nav = NavigationControl::new(&to_js(&navigation_options(&config))?);
        map.add_control(&nav, "top-right");

        let mut selection = SelectionController::new(config.picker.variant, config.picker.all_label.clone());
        let pickers = YearPickers::find(&document, &config.picker);
        pickers.attach(&mut selection);

        let app = Rc::new(RefCell::new(StoryMapApp {
            popup: PopupBuilder::new(PageDecoder::new(&document)),
            config,
            document,
            map,
            selection,
            pickers,
            raw: None,
            fetch_started: false,
        }));
        Self::bind_map_events(&app);
        tracing::info!("story map started");
        Ok(app)
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn set_picker_variant(&mut self, variant: PickerVariant) {
        if variant != PickerVariant::Popover {
            self.popover_event(PopoverEvent::Escape);
        }
        self.selection.set_visible_variant(variant);
    }

    fn bind_map_events(app: &SharedApp) {
        let map = app.borrow().map.clone();

        let load_app = Rc::clone(app);
        on_map(&map, "load", None, move |_| Self::on_load(&load_app));

        // Tile and style errors are reported by the widget itself.
        on_map(&map, "error", None, |event| {
            let error = mapbox::get(&event, "error").unwrap_or(event);
            tracing::debug!(error = %js_message(&error), "map widget error");
        });

        let cluster_app = Rc::clone(app);
        on_map(&map, "click", Some(LayerId::CLUSTERS), move |event| {
            cluster_app.borrow().on_cluster_click(&event);
        });

        let point_app = Rc::clone(app);
        on_map(&map, "click", Some(LayerId::UNCLUSTERED_POINT), move |event| {
            if let Err(err) = point_app.borrow().on_point_click(&event) {
                tracing::warn!(%err, "could not open story popup");
            }
        });

        for layer in [LayerId::CLUSTERS, LayerId::UNCLUSTERED_POINT] {
            let canvas = map.get_canvas();
            on_map(&map, "mouseenter", Some(layer), move |_| dom::set_cursor(&canvas, "pointer"));
            let canvas = map.get_canvas();
            on_map(&map, "mouseleave", Some(layer), move |_| dom::set_cursor(&canvas, ""));
        }
    }

    fn on_load(app: &SharedApp) {
        if let Err(err) = app.borrow().add_source_and_layers() {
            tracing::error!(%err, "could not add story layers");
            return;
        }
        Self::fetch_dataset(app);
    }

    fn add_source_and_layers(&self) -> Result<(), AppError> {
        let source_id = &self.config.source_id;
        let source = self
            .config
            .cluster
            .source_spec(Value::String(self.config.data_url.clone()));
        self.map.add_source(source_id, &to_js(&source)?)?;
        for layer in story_layers() {
            self.map.add_layer(&to_js(&layer.to_spec(source_id))?)?;
            tracing::debug!(layer = %layer.id(), "layer added");
        }
        Ok(())
    }

    fn fetch_dataset(app: &SharedApp) {
        let url = {
            let mut this = app.borrow_mut();
            if this.fetch_started {
                return;
            }
            this.fetch_started = true;
            this.config.data_url.clone()
        };

        let app = Rc::clone(app);
        spawn_local(async move {
            match fetch_stories(&url).await {
                Ok((raw, collection)) => Self::on_dataset(&app, raw, collection),
                Err(err) => tracing::debug!(%err, %url, "story dataset unavailable"),
            }
        });
    }

    fn on_dataset(app: &SharedApp, raw: Value, collection: StoryCollection) {
        let mut this = app.borrow_mut();
        this.raw = Some(raw);
        let shown = this.selection.load(collection);
        this.push_to_source(&shown);
        if this.pickers.bind(app) {
            tracing::debug!("picker listeners bound");
        }
    }

    fn push_to_source(&self, shown: &StoryCollection) {
        let Some(source) = self.map.get_source(&self.config.source_id) else {
            tracing::warn!(source_id = %self.config.source_id, "story source missing");
            return;
        };
        let payload = source_payload(self.raw.as_ref(), self.selection.selected(), shown);
        match to_js(&payload) {
            Ok(data) => source.set_data(&data),
            Err(err) => tracing::warn!(%err, "could not hand stories to the map"),
        }
    }

    /// Zooms in far enough to split the clicked cluster. Lookup failures
    /// leave the view unchanged.
    fn on_cluster_click(&self, event: &JsValue) {
        let Some(point) = mapbox::get(event, "point") else {
            return;
        };
        let Ok(options) = to_js(&json!({ "layers": [LayerId::CLUSTERS.as_str()] })) else {
            return;
        };
        let features = self.map.query_rendered_features(&point, &options);
        let Some(hit) = from_js(&features.get(0))
            .as_ref()
            .and_then(ClusterHit::from_rendered_feature)
        else {
            return;
        };
        let Some(source) = self.map.get_source(&self.config.source_id) else {
            return;
        };

        let map = self.map.clone();
        let done = Closure::once_into_js(move |err: JsValue, zoom: JsValue| {
            if !err.is_null() && !err.is_undefined() {
                tracing::debug!(cluster_id = hit.cluster_id, error = %js_message(&err), "no expansion zoom");
                return;
            }
            let Some(zoom) = zoom.as_f64() else {
                return;
            };
            if let Ok(options) = to_js(&ease_options(&hit, zoom)) {
                map.ease_to(&options);
            }
        });
        source.get_cluster_expansion_zoom(hit.cluster_id as f64, done.unchecked_ref());
    }

    fn on_point_click(&self, event: &JsValue) -> Result<(), AppError> {
        let Some(feature) = mapbox::get(event, "features")
            .and_then(|features| js_sys::Reflect::get_u32(&features, 0).ok())
            .and_then(|first| from_js(&first))
        else {
            return Ok(());
        };
        let feature = StoryFeature::from_geojson_value(&feature).map_err(AppError::Js)?;
        let click_lon = mapbox::get(event, "lngLat")
            .and_then(|ll| mapbox::get(&ll, "lng"))
            .and_then(|lng| lng.as_f64())
            .unwrap_or(feature.coordinates.lon_deg);

        let anchor = popup_anchor(feature.coordinates, click_lon);
        let overlay_height = self
            .config
            .popup
            .overlay_element_id
            .as_deref()
            .map(|id| dom::element_height_px(&self.document, id))
            .unwrap_or(f64::NAN);
        let placement =
            PopupPlacement::for_viewport(&self.config.popup, dom::viewport_width_px(), overlay_height);

        self.map.set_padding(&to_js(&json!({ "top": placement.padding_top_px }))?);
        Popup::new(&to_js(&popup_options(&placement))?)
            .set_lng_lat(&to_js(&json!(anchor.to_array()))?)
            .set_html(&self.popup.build(&feature.properties))
            .add_to(&self.map);
        Ok(())
    }
}

impl PickerHost for StoryMapApp {
    /// Applies a year chosen by a picker or the host page. Unknown years
    /// and selections before the dataset arrives are ignored.
    fn select_year(&mut self, raw: &str) -> bool {
        match self.selection.select(YearToken::parse(raw)) {
            Some(shown) => {
                self.push_to_source(&shown);
                true
            }
            None => false,
        }
    }

    fn popover_event(&mut self, event: PopoverEvent) {
        self.pickers.popover_event(&mut self.selection, event);
    }
}

/// Data for the map source: the dataset as loaded for `All`, otherwise the
/// filtered collection.
fn source_payload(raw: Option<&Value>, selected: &YearToken, shown: &StoryCollection) -> Value {
    match raw {
        Some(raw) if selected.is_all() => raw.clone(),
        _ => shown.to_geojson_value(),
    }
}

fn create_map(config: &MapConfig) -> Result<MapboxMap, AppError> {
    if let Some(token) = config.access_token.as_deref() {
        mapbox::set_access_token(token)?;
    }
    let options = to_js(&map_options(config))?;
    MapboxMap::new(&options).map_err(|err| AppError::WidgetInit(js_message(&err)))
}

fn on_map<F>(map: &MapboxMap, event: &str, layer: Option<LayerId>, handler: F)
where
    F: FnMut(JsValue) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(JsValue)>);
    match layer {
        Some(layer) => map.on_layer(event, layer.as_str(), closure.as_ref().unchecked_ref()),
        None => map.on(event, closure.as_ref().unchecked_ref()),
    }
    closure.forget();
}

async fn fetch_stories(url: &str) -> Result<(Value, StoryCollection), AppError> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| AppError::Fetch(e.to_string()))?;
    if !resp.ok() {
        return Err(AppError::Fetch(format!("HTTP {}", resp.status())));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| AppError::Fetch(e.to_string()))?;
    let raw: Value = serde_json::from_str(&text).map_err(StoryCollectionError::Json)?;
    let collection = StoryCollection::from_geojson_value(&raw)?;
    Ok((raw, collection))
}

fn map_options(config: &MapConfig) -> Value {
    let mut options = json!({
        "container": config.container_id,
        "style": config.style_url,
        "center": config.center,
        "zoom": config.zoom,
        "maxZoom": config.max_zoom,
    });
    if let Some(min_zoom) = config.min_zoom {
        options["minZoom"] = json!(min_zoom);
    }
    options
}

fn navigation_options(config: &MapConfig) -> Value {
    json!({ "showCompass": config.show_compass })
}

fn popup_options(placement: &PopupPlacement) -> Value {
    json!({
        "offset": placement.offset_px,
        "closeButton": placement.close_button,
    })
}

fn ease_options(hit: &ClusterHit, zoom: f64) -> Value {
    json!({ "center": hit.center.to_array(), "zoom": zoom })
}

#[cfg(test)]
mod tests {
    use super::{ease_options, map_options, navigation_options, popup_options, source_payload};
    use foundation::LonLat;
    use formats::StoryCollection;
    use layers::ClusterHit;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stories::{MapConfig, PopupConfig, PopupPlacement, YearToken, apply_year_filter};
    use std::rc::Rc;

    #[test]
    fn default_map_options() {
        assert_eq!(
            map_options(&MapConfig::default()),
            json!({
                "container": "map",
                "style": "mapbox://styles/mapbox/light-v11",
                "center": [0.0, 20.0],
                "zoom": 1.2,
                "maxZoom": 16.0,
            })
        );
    }

    #[test]
    fn min_zoom_only_when_set() {
        let config = MapConfig {
            min_zoom: Some(1.0),
            ..MapConfig::default()
        };
        assert_eq!(map_options(&config)["minZoom"], json!(1.0));
        assert_eq!(navigation_options(&config), json!({ "showCompass": true }));
    }

    #[test]
    fn popup_and_ease_options() {
        let placement = PopupPlacement::for_viewport(&PopupConfig::default(), 1024.0, 0.0);
        assert_eq!(
            popup_options(&placement),
            json!({ "offset": 12.0, "closeButton": true })
        );

        let hit = ClusterHit {
            cluster_id: 7,
            point_count: Some(12),
            center: LonLat::new(10.0, -5.0),
        };
        assert_eq!(
            ease_options(&hit, 6.0),
            json!({ "center": [10.0, -5.0], "zoom": 6.0 })
        );
    }

    #[test]
    fn all_hands_the_loaded_dataset_back_untouched() {
        let raw = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [1, 2] },
                  "properties": { "title": "Dock", "year": 2020, "extra": [1, 2] } },
                { "type": "Feature",
                  "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
                  "properties": { "title": "Route", "year": "2019" } }
            ]
        });
        let full = Rc::new(StoryCollection::from_geojson_value(&raw).unwrap());
        assert_eq!(full.len(), 1);

        assert_eq!(source_payload(Some(&raw), &YearToken::All, &full), raw);

        let year = YearToken::parse("2020");
        let shown = apply_year_filter(&full, &year);
        let filtered = source_payload(Some(&raw), &year, &shown);
        assert_eq!(filtered["features"].as_array().map(Vec::len), Some(1));
        assert_eq!(filtered, shown.to_geojson_value());

        // Nothing fetched yet: fall back to the parsed collection.
        assert_eq!(
            source_payload(None, &YearToken::All, &full),
            full.to_geojson_value()
        );
    }
}
