use foundation::LonLat;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::layer::{Layer, LayerId};
use crate::symbology::{CircleStyle, LabelStyle};

/// Clustering options for the story GeoJSON source.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    pub enabled: bool,
    /// Highest zoom at which points are still merged into clusters.
    pub max_zoom: u8,
    /// Merge radius in screen pixels.
    pub radius_px: u32,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_zoom: 10,
            radius_px: 50,
        }
    }
}

impl ClusterOptions {
    /// GeoJSON source definition; `data` is a URL string or an inline
    /// FeatureCollection.
    pub fn source_spec(&self, data: Value) -> Value {
        json!({
            "type": "geojson",
            "data": data,
            "cluster": self.enabled,
            "clusterMaxZoom": self.max_zoom,
            "clusterRadius": self.radius_px,
        })
    }
}

fn has_point_count() -> Value {
    json!(["has", "point_count"])
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterCircleLayer {
    pub style: CircleStyle,
}

impl Default for ClusterCircleLayer {
    fn default() -> Self {
        Self {
            style: CircleStyle::clusters(),
        }
    }
}

impl Layer for ClusterCircleLayer {
    fn id(&self) -> LayerId {
        LayerId::CLUSTERS
    }

    fn to_spec(&self, source_id: &str) -> Value {
        json!({
            "id": self.id().as_str(),
            "type": "circle",
            "source": source_id,
            "filter": has_point_count(),
            "paint": self.style.to_paint(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterCountLayer {
    pub style: LabelStyle,
}

impl Layer for ClusterCountLayer {
    fn id(&self) -> LayerId {
        LayerId::CLUSTER_COUNT
    }

    fn to_spec(&self, source_id: &str) -> Value {
        json!({
            "id": self.id().as_str(),
            "type": "symbol",
            "source": source_id,
            "filter": has_point_count(),
            "layout": {
                "text-field": self.style.text_field,
                "text-font": self.style.fonts,
                "text-size": self.style.size_px,
            },
            "paint": { "text-color": self.style.color },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnclusteredPointLayer {
    pub style: CircleStyle,
}

impl Default for UnclusteredPointLayer {
    fn default() -> Self {
        Self {
            style: CircleStyle::unclustered_point(),
        }
    }
}

impl Layer for UnclusteredPointLayer {
    fn id(&self) -> LayerId {
        LayerId::UNCLUSTERED_POINT
    }

    fn to_spec(&self, source_id: &str) -> Value {
        json!({
            "id": self.id().as_str(),
            "type": "circle",
            "source": source_id,
            "filter": ["!", has_point_count()],
            "paint": self.style.to_paint(),
        })
    }
}

/// The three story layers in draw order: cluster circles, cluster counts,
/// then single points.
pub fn story_layers() -> Vec<Box<dyn Layer>> {
    vec![
        Box::new(ClusterCircleLayer::default()),
        Box::new(ClusterCountLayer::default()),
        Box::new(UnclusteredPointLayer::default()),
    ]
}

/// A rendered cluster under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterHit {
    pub cluster_id: u64,
    pub point_count: Option<u64>,
    pub center: LonLat,
}

impl ClusterHit {
    /// Reads a rendered feature as serialized by the widget
    /// (`{ geometry: { coordinates }, properties: { cluster_id, point_count } }`).
    ///
    /// Returns `None` for anything that is not a cluster.
    pub fn from_rendered_feature(value: &Value) -> Option<Self> {
        let props = value.get("properties")?;
        let cluster_id = as_count(props.get("cluster_id")?)?;
        let point_count = props.get("point_count").and_then(as_count);

        let coords = value.get("geometry")?.get("coordinates")?.as_array()?;
        let center = LonLat::new(coords.first()?.as_f64()?, coords.get(1)?.as_f64()?);
        if !center.is_finite() {
            return None;
        }

        Some(Self {
            cluster_id,
            point_count,
            center,
        })
    }
}

// Cluster ids and counts arrive as JSON numbers, sometimes as floats.
fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}
