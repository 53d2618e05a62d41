use serde_json::{Value, json};

/// Piecewise-constant mapping from a cluster's point count to a style value.
///
/// Mirrors the widget's `step` expression: `base` applies below the first
/// threshold, and each `(threshold, value)` pair applies from its threshold
/// (inclusive) up to the next one. Thresholds must be ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct StepScale<T> {
    pub base: T,
    pub steps: Vec<(u64, T)>,
}

impl<T: Clone + Into<Value>> StepScale<T> {
    pub fn new(base: T, steps: Vec<(u64, T)>) -> Self {
        debug_assert!(steps.windows(2).all(|w| w[0].0 < w[1].0));
        Self { base, steps }
    }

    pub fn value_for(&self, count: u64) -> &T {
        self.steps
            .iter()
            .rev()
            .find(|(threshold, _)| count >= *threshold)
            .map(|(_, v)| v)
            .unwrap_or(&self.base)
    }

    /// `["step", input, base, t1, v1, t2, v2, ...]`
    pub fn to_expression(&self, input: Value) -> Value {
        let mut expr = vec![json!("step"), input, self.base.clone().into()];
        for (threshold, value) in &self.steps {
            expr.push(json!(threshold));
            expr.push(value.clone().into());
        }
        Value::Array(expr)
    }
}

pub fn point_count_input() -> Value {
    json!(["get", "point_count"])
}

/// Cluster circle radius in pixels by point count.
pub fn cluster_radius_scale() -> StepScale<f64> {
    StepScale::new(
        16.0,
        vec![(50, 22.0), (200, 28.0), (1000, 34.0), (5000, 40.0)],
    )
}

/// Cluster fill color by point count; darker for denser clusters.
pub fn cluster_color_scale() -> StepScale<String> {
    StepScale::new(
        "#88c0d0".to_string(),
        vec![
            (50, "#5e81ac".to_string()),
            (200, "#4c566a".to_string()),
            (1000, "#2e3440".to_string()),
        ],
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleStyle {
    pub radius: Value,
    pub color: Value,
    pub opacity: Option<f64>,
    pub stroke_width: f64,
    pub stroke_color: String,
}

impl CircleStyle {
    pub fn clusters() -> Self {
        Self {
            radius: cluster_radius_scale().to_expression(point_count_input()),
            color: cluster_color_scale().to_expression(point_count_input()),
            opacity: Some(0.85),
            stroke_width: 1.0,
            stroke_color: "rgba(0,0,0,0.15)".to_string(),
        }
    }

    pub fn unclustered_point() -> Self {
        Self {
            radius: json!(5),
            color: json!("#d08770"),
            opacity: None,
            stroke_width: 1.0,
            stroke_color: "rgba(0,0,0,0.25)".to_string(),
        }
    }

    pub fn to_paint(&self) -> Value {
        let mut paint = json!({
            "circle-radius": self.radius,
            "circle-color": self.color,
            "circle-stroke-width": self.stroke_width,
            "circle-stroke-color": self.stroke_color,
        });
        if let (Some(opacity), Some(obj)) = (self.opacity, paint.as_object_mut()) {
            obj.insert("circle-opacity".to_string(), json!(opacity));
        }
        paint
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub text_field: String,
    pub fonts: Vec<String>,
    pub size_px: f64,
    pub color: String,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            text_field: "{point_count_abbreviated}".to_string(),
            fonts: vec![
                "DIN Offc Pro Medium".to_string(),
                "Arial Unicode MS Bold".to_string(),
            ],
            size_px: 12.0,
            color: "#ffffff".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CircleStyle, cluster_color_scale, cluster_radius_scale, point_count_input};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn radius_tiers_follow_thresholds() {
        let scale = cluster_radius_scale();
        assert_eq!(*scale.value_for(2), 16.0);
        assert_eq!(*scale.value_for(49), 16.0);
        assert_eq!(*scale.value_for(50), 22.0);
        assert_eq!(*scale.value_for(999), 28.0);
        assert_eq!(*scale.value_for(1000), 34.0);
        assert_eq!(*scale.value_for(80_000), 40.0);
    }

    #[test]
    fn color_tiers_follow_thresholds() {
        let scale = cluster_color_scale();
        assert_eq!(scale.value_for(10), "#88c0d0");
        assert_eq!(scale.value_for(200), "#4c566a");
        assert_eq!(scale.value_for(5000), "#2e3440");
    }

    #[test]
    fn step_expression_layout() {
        assert_eq!(
            cluster_radius_scale().to_expression(point_count_input()),
            json!(["step", ["get", "point_count"], 16.0, 50, 22.0, 200, 28.0, 1000, 34.0, 5000, 40.0])
        );
    }

    #[test]
    fn opacity_only_when_set() {
        let clusters = CircleStyle::clusters().to_paint();
        assert_eq!(clusters["circle-opacity"], json!(0.85));
        let points = CircleStyle::unclustered_point().to_paint();
        assert!(points.get("circle-opacity").is_none());
        assert_eq!(points["circle-color"], json!("#d08770"));
    }
}
