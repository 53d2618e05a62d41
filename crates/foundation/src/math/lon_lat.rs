/// Geographic coordinate in degrees, GeoJSON axis order (longitude first).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLat {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl LonLat {
    pub const fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    pub fn is_finite(&self) -> bool {
        self.lon_deg.is_finite() && self.lat_deg.is_finite()
    }

    /// Same point, with the longitude moved onto the world copy closest to
    /// `reference_lon_deg`. See [`unwrap_lon_toward`].
    pub fn unwrapped_toward(self, reference_lon_deg: f64) -> Self {
        Self {
            lon_deg: unwrap_lon_toward(self.lon_deg, reference_lon_deg),
            lat_deg: self.lat_deg,
        }
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lon_deg, self.lat_deg]
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

/// Shifts `lon_deg` by whole turns of 360° until it lies within 180° of
/// `reference_lon_deg`.
///
/// Map widgets render several copies of the world side by side. A click on a
/// wrapped copy reports a longitude outside [-180, 180], while the feature
/// keeps its canonical longitude; anchoring an overlay at the canonical value
/// would put it on the wrong copy.
///
/// A difference of exactly 180° is left alone. Non-finite inputs are returned
/// unchanged.
pub fn unwrap_lon_toward(lon_deg: f64, reference_lon_deg: f64) -> f64 {
    if !lon_deg.is_finite() || !reference_lon_deg.is_finite() {
        return lon_deg;
    }
    let mut lon = lon_deg;
    while (reference_lon_deg - lon).abs() > 180.0 {
        lon += if reference_lon_deg > lon { 360.0 } else { -360.0 };
    }
    lon
}
