use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, RouteError};
use crate::hash::HashAccumulator;
use crate::shard::SegmentId;
use crate::types::ByteEncoder;

/// Router settings, usually read from a TOML file:
///
/// ```toml
/// num_segments = 8
/// round_robin_seed = 0
/// local_segment = 3
///
/// [ingest]
/// delimiter = ","
/// null_marker = ""
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RouterConfig {
    pub num_segments: u32,
    /// Fixed round-robin starting index; random per statement when unset
    #[serde(default)]
    pub round_robin_seed: Option<u32>,
    /// Fail on inet values with an unknown address family
    #[serde(default)]
    pub strict_inet_family: bool,
    /// Segment this process loads for, enabling the local row check
    #[serde(default)]
    pub local_segment: Option<SegmentId>,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Delimited text input format
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    pub delimiter: char,
    pub null_marker: String,
    pub escape: Option<char>,
    /// Treat missing trailing fields as NULL instead of failing the row
    pub fill_missing: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            null_marker: "\\N".to_string(),
            escape: Some('\\'),
            fill_missing: false,
        }
    }
}

impl RouterConfig {
    pub fn new(num_segments: u32) -> Self {
        Self {
            num_segments,
            round_robin_seed: None,
            strict_inet_family: false,
            local_segment: None,
            ingest: IngestConfig::default(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: RouterConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_segments == 0 {
            return Err(RouteError::Config("num_segments must be at least 1".into()));
        }
        if let Some(local) = self.local_segment {
            if local >= self.num_segments {
                return Err(RouteError::Config(format!(
                    "local_segment {} is outside 0..{}",
                    local, self.num_segments
                )));
            }
        }
        self.ingest.validate()
    }

    /// Accumulator for one policy, seeded per this config.
    pub fn hasher(&self) -> Result<HashAccumulator> {
        match self.round_robin_seed {
            Some(seed) => HashAccumulator::with_seed(self.num_segments, seed),
            None => HashAccumulator::new(self.num_segments),
        }
    }

    pub fn encoder(&self) -> ByteEncoder {
        ByteEncoder::new().strict(self.strict_inet_family)
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '\n' | '\r') {
            return Err(RouteError::Config(format!(
                "delimiter {:?} must be a single ASCII character other than a line break",
                self.delimiter
            )));
        }
        if let Some(escape) = self.escape {
            if !escape.is_ascii() || escape == self.delimiter {
                return Err(RouteError::Config(format!(
                    "escape {:?} must be ASCII and differ from the delimiter",
                    escape
                )));
            }
        }
        if self.null_marker.contains(self.delimiter) {
            return Err(RouteError::Config(
                "null_marker cannot contain the delimiter".into(),
            ));
        }
        Ok(())
    }
}
