use serde::{Deserialize, Serialize};

/// Per-job adapter and search parameters
///
/// All fields are optional; adapters fall back to configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobParams {
    /// Scroll-and-wait cycles for browser-driven sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll: Option<u32>,

    /// Pages to follow on the social feed API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,

    #[serde(flatten)]
    pub search: SearchParams,
}

/// Search-engine parameters forwarded to discovery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uule: Option<String>,

    // Advanced passthrough keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ludocid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lsig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kgmid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub si: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ibp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uds: Option<String>,
}

impl SearchParams {
    /// Returns the advanced passthrough keys that are set, in a fixed order
    pub fn advanced(&self) -> Vec<(&'static str, &str)> {
        [
            ("ludocid", &self.ludocid),
            ("lsig", &self.lsig),
            ("kgmid", &self.kgmid),
            ("si", &self.si),
            ("ibp", &self.ibp),
            ("uds", &self.uds),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}
