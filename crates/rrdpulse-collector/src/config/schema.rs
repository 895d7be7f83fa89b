use serde::Deserialize;

use rrdpulse_core::error::{Result, RrdPulseError};
use rrdpulse_core::{default_archives, Archive, MetricOptions};

use crate::collector::CollectorConfig;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PulseConfig {
    pub version: u32,

    #[serde(default)]
    pub collector: CollectorSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub http: HttpSection,
}

impl PulseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RrdPulseError::UnsupportedVersion);
        }
        self.collector.validate()?;
        self.http.validate()?;
        Ok(())
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            store_path: self.collector.store_path.clone().into(),
            step_seconds: self.collector.step_seconds,
            defaults: self.collector.defaults,
            archives: self.collector.archives.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectorSection {
    #[serde(default = "default_store_path")]
    pub store_path: String,

    #[serde(default = "default_step_seconds")]
    pub step_seconds: u64,

    /// Path or name of the `rrdtool` binary.
    #[serde(default = "default_rrdtool")]
    pub rrdtool: String,

    #[serde(default)]
    pub defaults: MetricOptions,

    #[serde(default = "default_archives")]
    pub archives: Vec<Archive>,
}

impl Default for CollectorSection {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            step_seconds: default_step_seconds(),
            rrdtool: default_rrdtool(),
            defaults: MetricOptions::default(),
            archives: default_archives(),
        }
    }
}

impl CollectorSection {
    pub fn validate(&self) -> Result<()> {
        if self.store_path.trim().is_empty() {
            return Err(RrdPulseError::BadConfig(
                "collector.store_path must not be empty".into(),
            ));
        }
        if !(1..=86_400).contains(&self.step_seconds) {
            return Err(RrdPulseError::BadConfig(
                "collector.step_seconds must be between 1 and 86400".into(),
            ));
        }
        if self.defaults.heartbeat_seconds == 0 {
            return Err(RrdPulseError::BadConfig(
                "collector.defaults.heartbeat_seconds must be positive".into(),
            ));
        }
        if let Some(max) = self.defaults.max_value {
            if max <= self.defaults.min_value {
                return Err(RrdPulseError::BadConfig(
                    "collector.defaults.max_value must be greater than min_value".into(),
                ));
            }
        }
        if self.archives.is_empty() {
            return Err(RrdPulseError::BadConfig(
                "collector.archives must not be empty".into(),
            ));
        }
        if self.archives.iter().any(|a| !(0.0..1.0).contains(&a.xff)) {
            return Err(RrdPulseError::BadConfig(
                "collector.archives[].xff must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

fn default_store_path() -> String {
    "metrics.rrd".into()
}
fn default_step_seconds() -> u64 {
    60
}
fn default_rrdtool() -> String {
    "rrdtool".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpNaming {
    /// One metric set per matched route pattern.
    #[default]
    Routes,
    /// Everything under `http.name`.
    Fixed,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    #[serde(default)]
    pub naming: HttpNaming,

    #[serde(default)]
    pub name: Option<String>,
}

impl HttpSection {
    pub fn validate(&self) -> Result<()> {
        if self.naming == HttpNaming::Fixed && self.name.as_deref().map_or(true, str::is_empty) {
            return Err(RrdPulseError::BadConfig(
                "http.name is required when http.naming is fixed".into(),
            ));
        }
        Ok(())
    }
}
