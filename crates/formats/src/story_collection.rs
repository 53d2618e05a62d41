use foundation::LonLat;
use serde_json::{Map, Value};

/// Story metadata. Unknown keys are carried through in `extra`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StoryProperties {
    pub title: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    pub outlet: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub year: Option<String>,
    pub extra: Map<String, Value>,
}

impl StoryProperties {
    /// Reads known keys leniently: strings are kept as-is, numbers and
    /// booleans are stringified, anything else counts as absent.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut props = StoryProperties::default();
        for (key, value) in map {
            let slot = match key.as_str() {
                "title" => &mut props.title,
                "date" => &mut props.date,
                "author" => &mut props.author,
                "outlet" => &mut props.outlet,
                "url" => &mut props.url,
                "thumbnail" => &mut props.thumbnail,
                "year" => &mut props.year,
                _ => {
                    props.extra.insert(key.clone(), value.clone());
                    continue;
                }
            };
            *slot = scalar_to_string(value);
        }
        props
    }

    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        let known = [
            ("title", &self.title),
            ("date", &self.date),
            ("author", &self.author),
            ("outlet", &self.outlet),
            ("url", &self.url),
            ("thumbnail", &self.thumbnail),
            ("year", &self.year),
        ];
        for (key, value) in known {
            if let Some(v) = value {
                map.insert(key.to_string(), Value::String(v.clone()));
            }
        }
        map
    }

    /// The trimmed `year` property, or `""` when absent.
    pub fn year_label(&self) -> &str {
        self.year.as_deref().map(str::trim).unwrap_or("")
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryFeature {
    pub id: Option<Value>,
    pub coordinates: LonLat,
    pub properties: StoryProperties,
}

impl StoryFeature {
    pub fn new(coordinates: LonLat, properties: StoryProperties) -> Self {
        Self {
            id: None,
            coordinates,
            properties,
        }
    }

    /// Parses one GeoJSON `Feature` with a `Point` geometry.
    ///
    /// The `type` member is not required: features handed back by the map
    /// widget on click are serialized without it.
    pub fn from_geojson_value(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or("feature must be an object".to_string())?;

        if let Some(ty) = obj.get("type").and_then(|v| v.as_str()) {
            if ty != "Feature" {
                return Err(format!("unexpected feature type: {ty}"));
            }
        }

        let geometry = obj
            .get("geometry")
            .ok_or("feature missing geometry".to_string())?;
        let coordinates = parse_point_geometry(geometry)?;

        let properties = obj
            .get("properties")
            .and_then(|v| v.as_object())
            .map(StoryProperties::from_json_map)
            .unwrap_or_default();

        let id = match obj.get("id") {
            Some(v @ (Value::String(_) | Value::Number(_))) => Some(v.clone()),
            _ => None,
        };

        Ok(Self {
            id,
            coordinates,
            properties,
        })
    }

    pub fn to_geojson_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String("Feature".to_string()));
        if let Some(id) = &self.id {
            obj.insert("id".to_string(), id.clone());
        }

        let mut geometry = Map::new();
        geometry.insert("type".to_string(), Value::String("Point".to_string()));
        geometry.insert(
            "coordinates".to_string(),
            Value::Array(vec![
                Value::from(self.coordinates.lon_deg),
                Value::from(self.coordinates.lat_deg),
            ]),
        );
        obj.insert("geometry".to_string(), Value::Object(geometry));
        obj.insert(
            "properties".to_string(),
            Value::Object(self.properties.to_json_map()),
        );
        Value::Object(obj)
    }
}

fn parse_point_geometry(value: &Value) -> Result<LonLat, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;
    if ty != "Point" {
        return Err(format!("unsupported geometry type: {ty}"));
    }

    let arr = obj
        .get("coordinates")
        .and_then(|v| v.as_array())
        .ok_or("Point coordinates must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("Point coordinates must have [lon, lat]".to_string());
    }
    let lon = arr[0]
        .as_f64()
        .ok_or("Point lon must be a number".to_string())?;
    let lat = arr[1]
        .as_f64()
        .ok_or("Point lat must be a number".to_string())?;
    let point = LonLat::new(lon, lat);
    if !point.is_finite() {
        return Err("Point coordinates must be finite".to_string());
    }
    Ok(point)
}

/// The full story dataset, or a filtered view of it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StoryCollection {
    pub features: Vec<StoryFeature>,
}

#[derive(Debug)]
pub enum StoryCollectionError {
    Json(serde_json::Error),
    NotAFeatureCollection,
}

impl std::fmt::Display for StoryCollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoryCollectionError::Json(e) => write!(f, "JSON parse error: {e}"),
            StoryCollectionError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
        }
    }
}

impl std::error::Error for StoryCollectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoryCollectionError::Json(e) => Some(e),
            StoryCollectionError::NotAFeatureCollection => None,
        }
    }
}

impl StoryCollection {
    pub fn new(features: Vec<StoryFeature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, StoryCollectionError> {
        let value: Value = serde_json::from_str(payload).map_err(StoryCollectionError::Json)?;
        Self::from_geojson_value(&value)
    }

    /// Features that are not usable points are dropped with a warning; the
    /// widget could not place them either.
    pub fn from_geojson_value(value: &Value) -> Result<Self, StoryCollectionError> {
        let obj = value
            .as_object()
            .ok_or(StoryCollectionError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(StoryCollectionError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(StoryCollectionError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(StoryCollectionError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            match StoryFeature::from_geojson_value(feat_val) {
                Ok(feature) => features.push(feature),
                Err(reason) => {
                    tracing::warn!(index, %reason, "skipping story feature");
                }
            }
        }

        Ok(Self { features })
    }

    pub fn to_geojson_value(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            "type".to_string(),
            Value::String("FeatureCollection".to_string()),
        );
        root.insert(
            "features".to_string(),
            Value::Array(
                self.features
                    .iter()
                    .map(StoryFeature::to_geojson_value)
                    .collect(),
            ),
        );
        Value::Object(root)
    }

    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_geojson_value())
    }
}
