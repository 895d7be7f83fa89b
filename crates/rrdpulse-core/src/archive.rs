//! Consolidation archives written at store creation.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consolidation {
    Average,
    Min,
    Max,
    Last,
}

impl Consolidation {
    pub fn as_str(self) -> &'static str {
        match self {
            Consolidation::Average => "AVERAGE",
            Consolidation::Min => "MIN",
            Consolidation::Max => "MAX",
            Consolidation::Last => "LAST",
        }
    }
}

/// A fixed-resolution, fixed-retention rollup.
///
/// `resolution` and `retention` use the store's duration syntax (`1m`, `90d`,
/// `18M`, `10y`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Archive {
    #[serde(default = "default_consolidation")]
    pub consolidation: Consolidation,
    #[serde(default = "default_xff")]
    pub xff: f64,
    pub resolution: String,
    pub retention: String,
}

impl Archive {
    pub fn average(resolution: &str, retention: &str) -> Self {
        Self {
            consolidation: Consolidation::Average,
            xff: default_xff(),
            resolution: resolution.to_string(),
            retention: retention.to_string(),
        }
    }
}

fn default_consolidation() -> Consolidation {
    Consolidation::Average
}

fn default_xff() -> f64 {
    0.5
}

/// 1 minute for 90 days, 1 hour for 18 months, 1 day for 10 years.
pub fn default_archives() -> Vec<Archive> {
    vec![
        Archive::average("1m", "90d"),
        Archive::average("1h", "18M"),
        Archive::average("1d", "10y"),
    ]
}
