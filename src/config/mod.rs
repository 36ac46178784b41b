use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::speeds::{LegalDefaultSpeeds, RoadType, RoadTypeFilter};

/// The rule table: road type filters and the road types of each country.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedLimitsData {
    /// Source, revision, license etc. of the data
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    #[serde(alias = "road_types")]
    pub road_types_by_name: HashMap<String, RoadTypeFilter>,
    #[serde(alias = "speed_limits")]
    pub speed_limits_by_country_code: HashMap<String, Vec<RoadType>>,
    /// Problems noticed while the data was compiled
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl SpeedLimitsData {
    /// Reads a rule table from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Rules: Failed to read {:?}", path))?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "yaml" | "yml"));

        let data = if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Rules: Invalid YAML in {:?}", path))?
        } else {
            Self::from_json_str(&content).with_context(|| format!("Rules: In {:?}", path))?
        };
        Ok(data)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Rules: Invalid JSON")
    }

    /// Parses all filters. Fails if any of them is invalid.
    pub fn into_resolver(self) -> Result<LegalDefaultSpeeds> {
        for warning in &self.warnings {
            tracing::info!("Rules: warning from data: {}", warning);
        }
        tracing::info!(
            "Rules: {} road types, {} countries",
            self.road_types_by_name.len(),
            self.speed_limits_by_country_code.len()
        );
        LegalDefaultSpeeds::new(self.road_types_by_name, self.speed_limits_by_country_code)
            .context("Rules: Invalid road type definitions")
    }

    /// Number of filter strings over all road types.
    pub fn filter_count(&self) -> usize {
        self.road_types_by_name
            .values()
            .map(|f| {
                [&f.filter, &f.fuzzy_filter, &f.relation_filter]
                    .into_iter()
                    .filter(|slot| slot.is_some())
                    .count()
            })
            .sum()
    }
}
