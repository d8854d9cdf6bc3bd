// MechInsight - Generator configuration
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Generator configuration.
//!
//! Every default reproduces the reference CNC simulation: 90 days of hourly
//! samples starting 2025-01-01, seed 42, 15% anomalous hours.

use crate::error::{GeneratorError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default random seed.
pub const DEFAULT_SEED: u64 = 42;

/// Samples per simulated day (hourly readings).
pub const SAMPLES_PER_DAY: usize = 24;

/// Master configuration for dataset generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Timestamp of the first sample.
    pub start_time: NaiveDateTime,
    /// Simulation horizon in days.
    pub num_days: usize,
    /// Random seed for reproducibility (None = entropy).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Base signal parameters.
    pub signals: SignalConfig,
    /// Health degradation and maintenance schedule.
    pub health: HealthConfig,
    /// Anomaly episode injection.
    pub anomalies: AnomalyConfig,
    /// Rolling-window feature settings.
    pub features: FeatureConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start_time: default_start_time(),
            num_days: 90,
            seed: Some(DEFAULT_SEED),
            signals: SignalConfig::default(),
            health: HealthConfig::default(),
            anomalies: AnomalyConfig::default(),
            features: FeatureConfig::default(),
        }
    }
}

fn default_start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl GeneratorConfig {
    /// Create a new generator config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Set start timestamp.
    pub fn with_start_time(mut self, start: NaiveDateTime) -> Self {
        self.start_time = start;
        self
    }

    /// Set simulation horizon in days.
    pub fn with_num_days(mut self, days: usize) -> Self {
        self.num_days = days;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the fraction of anomalous hours.
    pub fn with_anomaly_percentage(mut self, fraction: f64) -> Self {
        self.anomalies.percentage = fraction;
        self
    }

    /// Set episode length bounds in samples.
    pub fn with_episode_lengths(mut self, min: usize, max: usize) -> Self {
        self.anomalies.min_episode_len = min;
        self.anomalies.max_episode_len = max;
        self
    }

    /// Total number of samples.
    pub fn num_samples(&self) -> usize {
        self.num_days * SAMPLES_PER_DAY
    }

    /// Check that the configuration can produce a dataset.
    ///
    /// The anomaly check is a necessary condition only: the fewest episodes
    /// the budget can split into, plus the gaps between them, must fit
    /// between the edge margins. Placement may still run out of attempts.
    pub fn validate(&self) -> Result<()> {
        let n = self.num_samples();
        if n == 0 {
            return Err(GeneratorError::InvalidConfig(
                "horizon must contain at least one day".to_string(),
            ));
        }

        let s = &self.signals;
        if s.daily_hours_range.0 > s.daily_hours_range.1
            || s.tool_increment_range.0 > s.tool_increment_range.1
        {
            return Err(GeneratorError::InvalidConfig(
                "uniform ranges must have low <= high".to_string(),
            ));
        }

        let h = &self.health;
        if !(0.0..=100.0).contains(&h.floor) || h.decay_per_hour < 0.0 || h.noise_std < 0.0 {
            return Err(GeneratorError::InvalidConfig(
                "health floor must be in [0, 100] and decay/noise non-negative".to_string(),
            ));
        }

        if h.maintenance_interval_days < 0 || h.maintenance_jitter_days < 0 {
            return Err(GeneratorError::InvalidConfig(
                "maintenance interval and jitter must be non-negative".to_string(),
            ));
        }
        let last_hour = i64::try_from(h.maintenance_events)
            .ok()
            .and_then(|k| k.checked_mul(h.maintenance_interval_days))
            .and_then(|day| day.checked_add(h.maintenance_jitter_days))
            .and_then(|day| day.checked_add(1))
            .and_then(|day| day.checked_mul(SAMPLES_PER_DAY as i64));
        if last_hour.is_none() {
            return Err(GeneratorError::InvalidConfig(format!(
                "{} maintenance events every {} days overflow the schedule",
                h.maintenance_events, h.maintenance_interval_days
            )));
        }

        if self.features.long_window == 0 || self.features.short_window == 0 {
            return Err(GeneratorError::InvalidConfig(
                "feature windows must be at least one sample".to_string(),
            ));
        }

        self.anomalies.validate(n)
    }
}

/// Base signal parameters: one normal distribution per sensor channel plus
/// the usage counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub vibration_rms: Gaussian,
    pub motor_temp: Gaussian,
    pub spindle_current: Gaussian,
    pub rpm: Gaussian,
    pub coolant_temp: Gaussian,
    pub cutting_force: Gaussian,
    pub power_consumption: Gaussian,
    pub acoustic_level: Gaussian,
    /// Machine hours already logged before the first sample.
    pub initial_machine_hours: f64,
    /// Uniform range for hours run per calendar day.
    pub daily_hours_range: (f64, f64),
    /// Uniform range for tool usage added per sample (minutes).
    pub tool_increment_range: (f64, f64),
    /// Tool usage (minutes) beyond which the tool is replaced.
    pub tool_wear_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            vibration_rms: Gaussian::new(0.8, 0.15),
            motor_temp: Gaussian::new(65.0, 4.0),
            spindle_current: Gaussian::new(15.0, 1.5),
            rpm: Gaussian::new(3000.0, 200.0),
            coolant_temp: Gaussian::new(30.0, 2.0),
            cutting_force: Gaussian::new(200.0, 15.0),
            power_consumption: Gaussian::new(5000.0, 400.0),
            acoustic_level: Gaussian::new(75.0, 3.0),
            initial_machine_hours: 5000.0,
            daily_hours_range: (6.0, 15.0),
            tool_increment_range: (10.0, 20.0),
            tool_wear_threshold: 4000.0,
        }
    }
}

/// Mean / standard deviation pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    pub mean: f64,
    pub std: f64,
}

impl Gaussian {
    pub const fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }
}

/// Health degradation and maintenance schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Health at the start of the run and after maintenance.
    pub initial: f64,
    /// Health lost per machine hour before the usage factor.
    pub decay_per_hour: f64,
    /// Natural wear never drives health below this value.
    pub floor: f64,
    /// Std of per-sample noise added after the walk.
    pub noise_std: f64,
    /// Maintenance events per run.
    pub maintenance_events: usize,
    /// Nominal days between maintenance events.
    pub maintenance_interval_days: i64,
    /// Maximum jitter around the nominal day, in days.
    pub maintenance_jitter_days: i64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            initial: 100.0,
            decay_per_hour: 0.02,
            floor: 20.0,
            noise_std: 1.0,
            maintenance_events: 3,
            maintenance_interval_days: 30,
            maintenance_jitter_days: 5,
        }
    }
}

/// Anomaly episode injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Fraction of the horizon covered by anomalies (0.0 - 1.0).
    pub percentage: f64,
    /// Shortest episode in samples.
    pub min_episode_len: usize,
    /// Longest episode in samples.
    pub max_episode_len: usize,
    /// Samples kept free at each horizon edge and between episodes.
    pub margin: usize,
    /// Placement attempts per episode before giving up.
    pub max_placement_attempts: usize,
    /// Std of the Gaussian jitter added to the severity ramp.
    pub severity_jitter: f64,
    /// Health lost at full severity and unit impact.
    pub health_penalty: f64,
    /// Std of the jitter added to recomputed days-to-maintenance.
    pub maintenance_jitter: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            percentage: 0.15,
            min_episode_len: 6,
            max_episode_len: 48,
            margin: 48,
            max_placement_attempts: 10_000,
            severity_jitter: 0.05,
            health_penalty: 50.0,
            maintenance_jitter: 1.0,
        }
    }
}

impl AnomalyConfig {
    /// Anomalous sample budget for a horizon.
    pub fn budget(&self, num_samples: usize) -> usize {
        (num_samples as f64 * self.percentage) as usize
    }

    /// Check the injection constraints against a horizon.
    pub fn validate(&self, num_samples: usize) -> Result<()> {
        if !(0.0..1.0).contains(&self.percentage) {
            return Err(GeneratorError::InvalidConfig(format!(
                "anomaly percentage {} outside [0, 1)",
                self.percentage
            )));
        }
        if self.min_episode_len == 0 || self.min_episode_len > self.max_episode_len {
            return Err(GeneratorError::InvalidConfig(format!(
                "episode lengths must satisfy 1 <= min ({}) <= max ({})",
                self.min_episode_len, self.max_episode_len
            )));
        }
        if self.max_placement_attempts == 0 {
            return Err(GeneratorError::InvalidConfig(
                "max_placement_attempts must be positive".to_string(),
            ));
        }

        let budget = self.budget(num_samples);
        if budget == 0 {
            return Ok(());
        }

        let usable = num_samples.saturating_sub(2 * self.margin);
        if usable < self.max_episode_len.min(budget) {
            return Err(GeneratorError::InvalidConfig(format!(
                "{} samples leave no room for episodes inside {}-sample margins",
                num_samples, self.margin
            )));
        }

        let min_episodes = (budget + self.max_episode_len - 1) / self.max_episode_len;
        let required = budget + (min_episodes - 1) * self.margin;
        if required > usable {
            return Err(GeneratorError::InvalidConfig(format!(
                "{} anomalous samples in at least {} episodes need {} samples, only {} usable",
                budget, min_episodes, required, usable
            )));
        }

        Ok(())
    }
}

/// Rolling-window feature settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Trailing window for vibration/temperature trends (samples).
    pub long_window: usize,
    /// Trailing window for current stability (samples).
    pub short_window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            long_window: 24,
            short_window: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.num_samples(), 2160);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.anomalies.budget(config.num_samples()), 324);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = GeneratorConfig::new()
            .with_num_days(30)
            .with_seed(7)
            .with_anomaly_percentage(0.1)
            .with_episode_lengths(4, 12);

        assert_eq!(config.num_samples(), 720);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.anomalies.min_episode_len, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_percentage() {
        let config = GeneratorConfig::new().with_anomaly_percentage(1.5);
        assert!(matches!(
            config.validate(),
            Err(GeneratorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_lengths() {
        let config = GeneratorConfig::new().with_episode_lengths(50, 10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_jitter() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{ "health": { "maintenance_jitter_days": -5 } }"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(GeneratorError::InvalidConfig(_))
        ));

        let mut config = GeneratorConfig::new();
        config.health.maintenance_interval_days = -30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_schedule_overflow() {
        let mut config = GeneratorConfig::new();
        config.health.maintenance_events = 4;
        config.health.maintenance_interval_days = i64::MAX / 2;
        assert!(matches!(
            config.validate(),
            Err(GeneratorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_overfull_horizon() {
        // 5 days = 120 samples; only 24 fit between the margins
        let config = GeneratorConfig::new()
            .with_num_days(5)
            .with_anomaly_percentage(0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_percentage_is_valid() {
        let config = GeneratorConfig::new().with_anomaly_percentage(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{ "num_days": 10, "anomalies": { "percentage": 0.05 } }"#)
                .unwrap();
        assert_eq!(config.num_days, 10);
        assert_eq!(config.anomalies.percentage, 0.05);
        assert_eq!(config.anomalies.max_episode_len, 48);
        assert_eq!(config.signals.tool_wear_threshold, 4000.0);
    }
}
