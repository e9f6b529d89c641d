use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// Score at or above which a match is committed without review.
    #[serde(default = "default_auto_match_threshold")]
    pub auto_match_threshold: u32,
    /// Score at or above which a suggestion is recorded for review.
    #[serde(default = "default_suggest_threshold")]
    pub suggest_threshold: u32,
    /// Maximum candidate transactions loaded per run.
    #[serde(default = "default_batch_cap")]
    pub batch_cap: usize,
    #[serde(default)]
    pub tolerance: AmountTolerance,
}

/// Amount tolerances as percentages of the obligation amount.
#[derive(Debug, Clone, Deserialize)]
pub struct AmountTolerance {
    /// Within this percentage the amount factor scores full points.
    #[serde(default = "default_exact_pct")]
    pub exact_pct: u32,
    /// Within this percentage it scores half points; beyond it the pair
    /// is disqualified outright.
    #[serde(default = "default_loose_pct")]
    pub loose_pct: u32,
}

fn default_auto_match_threshold() -> u32 {
    70
}

fn default_suggest_threshold() -> u32 {
    40
}

fn default_batch_cap() -> usize {
    500
}

fn default_exact_pct() -> u32 {
    1
}

fn default_loose_pct() -> u32 {
    5
}

impl Default for AmountTolerance {
    fn default() -> Self {
        Self {
            exact_pct: default_exact_pct(),
            loose_pct: default_loose_pct(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            auto_match_threshold: default_auto_match_threshold(),
            suggest_threshold: default_suggest_threshold(),
            batch_cap: default_batch_cap(),
            tolerance: AmountTolerance::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconcileConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconcileConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.suggest_threshold == 0 {
            return Err(ReconError::ConfigValidation(
                "suggest_threshold must be at least 1".into(),
            ));
        }

        if self.suggest_threshold >= self.auto_match_threshold {
            return Err(ReconError::ConfigValidation(format!(
                "suggest_threshold ({}) must be below auto_match_threshold ({})",
                self.suggest_threshold, self.auto_match_threshold
            )));
        }

        if self.batch_cap == 0 {
            return Err(ReconError::ConfigValidation("batch_cap must be at least 1".into()));
        }

        if self.tolerance.exact_pct > self.tolerance.loose_pct {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance.exact_pct ({}) must not exceed tolerance.loose_pct ({})",
                self.tolerance.exact_pct, self.tolerance.loose_pct
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
