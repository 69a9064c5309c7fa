use std::{env, fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::process::output::DestinationRule;

pub const DEFAULT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
/// Upper bound for `lookback_days` (about a century).
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// Knobs for the retention transform. Every field has a default, so an empty
/// YAML document or an empty environment gives the stock behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Rows older than this many days may be dropped.
    pub lookback_days: i64,
    /// Statuses that make an old row eligible for dropping.
    pub terminal_statuses: Vec<String>,
    pub source_segment: String,
    pub destination_segment: String,
    /// Overrides the segment swap when set. Supports `{key}`, `{file_name}`, `{stem}`.
    pub destination_template: Option<String>,
    pub content_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            terminal_statuses: vec!["pending".into(), "cancelled".into()],
            source_segment: "raw/".into(),
            destination_segment: "processed/".into(),
            destination_template: None,
            content_type: DEFAULT_CONTENT_TYPE.into(),
        }
    }
}

impl Config {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("LOOKBACK_DAYS") {
            cfg.lookback_days = v
                .trim()
                .parse()
                .with_context(|| format!("LOOKBACK_DAYS must be an integer, got {:?}", v))?;
        }
        if let Some(v) = get("TERMINAL_STATUSES") {
            cfg.terminal_statuses = v
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = get("SOURCE_SEGMENT") {
            cfg.source_segment = v;
        }
        if let Some(v) = get("DESTINATION_SEGMENT") {
            cfg.destination_segment = v;
        }
        if let Some(v) = get("DESTINATION_TEMPLATE") {
            cfg.destination_template = Some(v);
        }
        if let Some(v) = get("CONTENT_TYPE") {
            cfg.content_type = v;
        }
        cfg.validate()
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        let cfg: Config = serde_yaml::from_str(text)?;
        cfg.validate()
    }

    /// Reject values that would put the cutoff in the future or out of range.
    pub fn validate(self) -> Result<Self> {
        if !(0..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            bail!(
                "lookback_days must be between 0 and {}, got {}",
                MAX_LOOKBACK_DAYS,
                self.lookback_days
            );
        }
        Ok(self)
    }

    pub fn destination_rule(&self) -> DestinationRule {
        match &self.destination_template {
            Some(t) => DestinationRule::Template(t.clone()),
            None => DestinationRule::Replace {
                from: self.source_segment.clone(),
                to: self.destination_segment.clone(),
            },
        }
    }
}
