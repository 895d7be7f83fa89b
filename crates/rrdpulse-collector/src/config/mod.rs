//! Collector config loader (strict parsing).

pub mod schema;

use std::fs;

use rrdpulse_core::error::{Result, RrdPulseError};

pub use schema::{CollectorSection, HttpNaming, HttpSection, PulseConfig, ServerSection};

pub fn load_from_file(path: &str) -> Result<PulseConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| RrdPulseError::BadConfig(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<PulseConfig> {
    let cfg: PulseConfig = serde_yaml::from_str(s)
        .map_err(|e| RrdPulseError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
