// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{DEFAULT_CAPS, DEFAULT_DEVICE, factories};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Pipeline configuration
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture device path; empty leaves the source's own default
    pub device: String,
    /// Caps constraint applied by the filter stage
    pub caps: String,
    /// Source element factory
    pub source: String,
    /// Converter element factory
    pub converter: String,
    /// Sink element factory
    pub sink: String,
    /// Extra properties for the source, as GStreamer string values
    pub source_properties: BTreeMap<String, String>,
    /// Extra properties for the sink, as GStreamer string values
    pub sink_properties: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            caps: DEFAULT_CAPS.to_string(),
            source: factories::SOURCE.to_string(),
            converter: factories::CONVERTER.to_string(),
            sink: factories::SINK.to_string(),
            source_properties: BTreeMap::new(),
            sink_properties: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load a configuration file (JSON)
    pub fn load(path: &Path) -> AppResult<Self> {
        debug!(path = %path.display(), "Loading configuration");
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply command-line overrides on top of this configuration
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(device) = overrides.device {
            self.device = device;
        }
        if let Some(caps) = overrides.caps {
            self.caps = caps;
        }
        if let Some(source) = overrides.source {
            self.source = source;
        }
        if let Some(converter) = overrides.converter {
            self.converter = converter;
        }
        if let Some(sink) = overrides.sink {
            self.sink = sink;
        }
        self
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub device: Option<String>,
    pub caps: Option<String>,
    pub source: Option<String>,
    pub converter: Option<String>,
    pub sink: Option<String>,
}
