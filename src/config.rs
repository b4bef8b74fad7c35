//! Configuration for the reconciliation pipeline.
//!
//! Loaded from a JSON file by the surrounding tool and passed explicitly
//! into every pipeline entry point. There is no global config state; the
//! caller owns the value.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Plausible value range for one tracked metric.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Metric name as used in output columns (e.g. "power")
    pub name: String,
    /// Smallest plausible value
    #[serde(default)]
    pub min: u64,
    /// Largest plausible value for a human-entered game counter
    #[serde(default = "default_metric_max")]
    pub max: u64,
}

fn default_metric_max() -> u64 {
    2_000_000_000
}

/// One scanned UI tab: a category name plus the metric columns its rows
/// carry, in left-to-right display order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Category name, must match the tag on incoming raw lines
    pub name: String,
    /// Metric columns in display order; every row is expected to end with
    /// this many numeric tokens
    pub metrics: Vec<MetricConfig>,
    /// True if rows on this tab start with the member's displayed rank
    #[serde(default)]
    pub leading_rank: bool,
}

/// A single OCR digit-confusion substitution applied inside numeric tokens.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DigitConfusion {
    pub from: char,
    pub to: char,
}

/// Complete pipeline configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Scanned categories in processing order
    pub categories: Vec<CategoryConfig>,
    /// Similarity threshold for treating two names as the same member
    /// (0.0–1.0). The primary tuning parameter of the whole pipeline:
    /// too low silently merges two real people, too high leaves
    /// duplicate rows in the output.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    /// Metric the final roster is ranked by
    pub primary_metric: String,
    /// Letter-to-digit substitutions applied when recognizing numeric tokens
    #[serde(default = "default_digit_confusions")]
    pub digit_confusions: Vec<DigitConfusion>,
    /// Known UI header/footer strings that OCR sometimes returns as rows
    #[serde(default = "default_artifact_names")]
    pub artifact_names: Vec<String>,
}

fn default_match_threshold() -> f64 {
    0.8
}

/// Substitutions tuned against real Fate War OCR output: round letters read
/// as zero, vertical strokes read as one.
fn default_digit_confusions() -> Vec<DigitConfusion> {
    vec![
        DigitConfusion { from: 'O', to: '0' },
        DigitConfusion { from: 'o', to: '0' },
        DigitConfusion { from: 'I', to: '1' },
        DigitConfusion { from: 'l', to: '1' },
    ]
}

fn default_artifact_names() -> Vec<String> {
    [
        "rank",
        "name",
        "member",
        "members",
        "power",
        "kills",
        "alliance",
        "total",
        "contribution",
        "donation",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl Default for RosterConfig {
    fn default() -> Self {
        let category = |name: &str, metric: &str, leading_rank: bool| CategoryConfig {
            name: name.to_string(),
            metrics: vec![MetricConfig {
                name: metric.to_string(),
                min: 0,
                max: default_metric_max(),
            }],
            leading_rank,
        };

        Self {
            categories: vec![
                category("Power", "power", true),
                category("Kills", "kills", false),
                category("Weekly Contribution", "weekly_contribution", false),
                category("Construction", "construction", false),
                category("Tribe Assistance", "tribe_assistance", false),
                category("Gold Donation", "gold_donation", false),
            ],
            match_threshold: default_match_threshold(),
            primary_metric: "power".to_string(),
            digit_confusions: default_digit_confusions(),
            artifact_names: default_artifact_names(),
        }
    }
}

impl RosterConfig {
    /// Loads and validates configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config: RosterConfig =
            serde_json::from_str(&contents).context("Failed to parse roster config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Fails fast on configuration bugs. Data-quality problems are handled
    /// downstream as marked rows; a broken config is not.
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            bail!("Config declares no categories");
        }
        for category in &self.categories {
            if category.metrics.is_empty() {
                bail!("Category '{}' declares zero metrics", category.name);
            }
            for metric in &category.metrics {
                if metric.min > metric.max {
                    bail!(
                        "Metric '{}' has min {} > max {}",
                        metric.name,
                        metric.min,
                        metric.max
                    );
                }
            }
        }
        if !(self.match_threshold > 0.0 && self.match_threshold <= 1.0) {
            bail!(
                "Match threshold {} outside (0.0, 1.0]",
                self.match_threshold
            );
        }
        let primary_declared = self
            .categories
            .iter()
            .flat_map(|c| &c.metrics)
            .any(|m| m.name == self.primary_metric);
        if !primary_declared {
            bail!(
                "Primary metric '{}' is not declared by any category",
                self.primary_metric
            );
        }
        Ok(())
    }

    /// Finds a category by its raw-line tag.
    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// All metric names across categories, in declared order.
    pub fn metric_names(&self) -> Vec<&str> {
        self.categories
            .iter()
            .flat_map(|c| c.metrics.iter().map(|m| m.name.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = RosterConfig::default();
        config.validate().unwrap();
        assert_eq!(config.categories.len(), 6);
        assert_eq!(config.match_threshold, 0.8);
        assert_eq!(config.primary_metric, "power");
        assert!(config.categories[0].leading_rank);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{
            "categories": [
                {"name": "Power", "metrics": [{"name": "power", "max": 999999999}], "leading_rank": true},
                {"name": "Kills", "metrics": [{"name": "kills"}]}
            ],
            "primary_metric": "power"
        }"#;
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", json).unwrap();

        let config = RosterConfig::load(file.path()).unwrap();
        assert_eq!(config.categories.len(), 2);
        // Defaults fill the omitted fields
        assert_eq!(config.match_threshold, 0.8);
        assert_eq!(config.digit_confusions.len(), 4);
        assert_eq!(config.categories[1].metrics[0].max, 2_000_000_000);
        assert!(!config.categories[1].leading_rank);
    }

    #[test]
    fn test_zero_metric_category_rejected() {
        let mut config = RosterConfig::default();
        config.categories[0].metrics.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let mut config = RosterConfig::default();
        config.match_threshold = 0.0;
        assert!(config.validate().is_err());
        config.match_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_primary_metric_rejected() {
        let mut config = RosterConfig::default();
        config.primary_metric = "charisma".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_metric_range_rejected() {
        let mut config = RosterConfig::default();
        config.categories[0].metrics[0].min = 100;
        config.categories[0].metrics[0].max = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_metric_names_in_declared_order() {
        let config = RosterConfig::default();
        let names = config.metric_names();
        assert_eq!(names[0], "power");
        assert_eq!(names[1], "kills");
        assert_eq!(names.len(), 6);
    }
}
