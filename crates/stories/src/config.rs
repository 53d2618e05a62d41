use foundation::LonLat;
use layers::ClusterOptions;
use serde::Deserialize;

use crate::picker::PickerVariant;

/// Startup configuration for the story map. Every field has a default, so
/// an empty JSON object (or no config at all) gives the stock map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Mapbox access token, assigned to `mapboxgl.accessToken` when set.
    pub access_token: Option<String>,
    pub container_id: String,
    pub style_url: String,
    /// `[lon, lat]`
    pub center: [f64; 2],
    pub zoom: f64,
    pub min_zoom: Option<f64>,
    pub max_zoom: f64,
    pub show_compass: bool,
    pub data_url: String,
    pub source_id: String,
    pub cluster: ClusterOptions,
    pub picker: PickerConfig,
    pub popup: PopupConfig,
    /// Shown in the map container when the widget cannot be created.
    pub fallback_message: String,
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub log_level: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            container_id: "map".to_string(),
            style_url: "mapbox://styles/mapbox/light-v11".to_string(),
            center: [0.0, 20.0],
            zoom: 1.2,
            min_zoom: None,
            max_zoom: 16.0,
            show_compass: true,
            data_url: "./data/stories.geojson".to_string(),
            source_id: "stories".to_string(),
            cluster: ClusterOptions::default(),
            picker: PickerConfig::default(),
            popup: PopupConfig::default(),
            fallback_message: "The map could not be loaded.".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// The variant shown at startup; the other one stays hidden but in sync.
    pub variant: PickerVariant,
    pub native_root_id: String,
    pub native_select_id: String,
    pub popover_root_id: String,
    pub popover_toggle_id: String,
    pub popover_list_id: String,
    pub all_label: String,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            variant: PickerVariant::Popover,
            native_root_id: "year-filter".to_string(),
            native_select_id: "year-select".to_string(),
            popover_root_id: "year-picker".to_string(),
            popover_toggle_id: "year-picker-toggle".to_string(),
            popover_list_id: "year-picker-list".to_string(),
            all_label: "All years".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    pub offset_px: f64,
    pub close_button: bool,
    /// Viewports this wide or narrower are treated as narrow.
    pub narrow_viewport_max_px: f64,
    /// Fixed element covering the top of the map on narrow viewports.
    pub overlay_element_id: Option<String>,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            offset_px: 12.0,
            close_button: true,
            narrow_viewport_max_px: 640.0,
            overlay_element_id: Some("site-header".to_string()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "config is not valid JSON: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl MapConfig {
    /// Parses and validates a JSON config. Blank input yields the defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.center().is_finite() || !(-90.0..=90.0).contains(&self.center[1]) {
            return Err(ConfigError::Invalid(format!(
                "center {:?} is not a valid [lon, lat]",
                self.center
            )));
        }
        let min_zoom = self.min_zoom.unwrap_or(0.0);
        if !(min_zoom <= self.zoom && self.zoom <= self.max_zoom) {
            return Err(ConfigError::Invalid(format!(
                "zoom {} must lie within [{min_zoom}, {}]",
                self.zoom, self.max_zoom
            )));
        }
        let ids = [
            ("container_id", &self.container_id),
            ("source_id", &self.source_id),
            ("data_url", &self.data_url),
        ];
        for (name, value) in ids {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn center(&self) -> LonLat {
        LonLat::from(self.center)
    }

    /// Maximum level for the console logger; unknown names fall back to `info`.
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.trim().parse().unwrap_or(tracing::Level::INFO)
    }
}
