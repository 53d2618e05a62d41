use serde_json::Value;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub &'static str);

impl LayerId {
    pub const CLUSTERS: LayerId = LayerId("clusters");
    pub const CLUSTER_COUNT: LayerId = LayerId("cluster-count");
    pub const UNCLUSTERED_POINT: LayerId = LayerId("unclustered-point");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// A style layer the map widget can draw from a source.
pub trait Layer {
    fn id(&self) -> LayerId;

    /// Widget layer definition (`{ id, type, source, filter, layout, paint }`).
    fn to_spec(&self, source_id: &str) -> Value;
}
