// MechInsight - Anomaly injection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Anomaly episode injection.
//!
//! An episode is a contiguous run of samples sharing one fault type whose
//! severity ramps up across the run. Each fault type carries a declarative
//! effect table (channel multipliers, health impact, progression rate).
//! Episodes never overlap and keep `margin` samples of clearance from each
//! other and from the horizon edges.

use crate::config::AnomalyConfig;
use crate::error::{GeneratorError, Result};
use crate::health::fine_days_to_maintenance;
use crate::sample::{Channel, Sample};
use rand::prelude::*;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Cutting force multiplier once a broken tool's severity passes
/// [`TOOL_BREAK_COLLAPSE_SEVERITY`].
pub const TOOL_BREAK_FORCE_COLLAPSE: f64 = 0.4;

/// Severity beyond which a tool break collapses cutting force.
pub const TOOL_BREAK_COLLAPSE_SEVERITY: f64 = 0.7;

/// Lower clamp for a ramped severity.
const MIN_SEVERITY: f64 = 0.1;

/// Anomaly label carried by every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    /// No active anomaly.
    Normal,
    /// Gradual cutting edge wear.
    ToolWear,
    /// Tool fracture; cutting force collapses at high severity.
    ToolBreak,
    /// Spindle motor running hot.
    MotorOverheating,
    /// Coolant circuit failure.
    CoolantFailure,
    /// Unstable power supply.
    PowerSupplyIssue,
}

/// Effect table for one fault type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyProfile {
    /// Channel multipliers at full severity.
    pub effects: &'static [(Channel, f64)],
    /// How strongly the fault lowers health (0-1).
    pub severity_impact: f64,
    /// Severity reached at the end of the ramp (before clamping).
    pub progression_rate: f64,
}

const TOOL_WEAR: AnomalyProfile = AnomalyProfile {
    effects: &[
        (Channel::VibrationRms, 1.5),
        (Channel::CuttingForce, 1.3),
        (Channel::AcousticLevel, 1.2),
        (Channel::ToolUsage, 1.0),
    ],
    severity_impact: 0.7,
    progression_rate: 1.2,
};

const TOOL_BREAK: AnomalyProfile = AnomalyProfile {
    effects: &[
        (Channel::VibrationRms, 2.5),
        (Channel::CuttingForce, 0.7),
        (Channel::AcousticLevel, 1.5),
        (Channel::SpindleCurrent, 1.3),
    ],
    severity_impact: 0.9,
    progression_rate: 1.8,
};

const MOTOR_OVERHEATING: AnomalyProfile = AnomalyProfile {
    effects: &[
        (Channel::MotorTemp, 1.4),
        (Channel::PowerConsumption, 1.2),
        (Channel::SpindleCurrent, 1.15),
    ],
    severity_impact: 0.8,
    progression_rate: 1.0,
};

const COOLANT_FAILURE: AnomalyProfile = AnomalyProfile {
    effects: &[(Channel::CoolantTemp, 1.5), (Channel::MotorTemp, 1.2)],
    severity_impact: 0.85,
    progression_rate: 1.5,
};

const POWER_SUPPLY_ISSUE: AnomalyProfile = AnomalyProfile {
    effects: &[
        (Channel::PowerConsumption, 1.3),
        (Channel::SpindleCurrent, 0.85),
        (Channel::Rpm, 0.9),
    ],
    severity_impact: 0.75,
    progression_rate: 0.8,
};

impl AnomalyType {
    /// Fault types that can be injected.
    pub const CATALOG: [AnomalyType; 5] = [
        AnomalyType::ToolWear,
        AnomalyType::ToolBreak,
        AnomalyType::MotorOverheating,
        AnomalyType::CoolantFailure,
        AnomalyType::PowerSupplyIssue,
    ];

    /// Table label.
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyType::Normal => "normal",
            AnomalyType::ToolWear => "tool_wear",
            AnomalyType::ToolBreak => "tool_break",
            AnomalyType::MotorOverheating => "motor_overheating",
            AnomalyType::CoolantFailure => "coolant_failure",
            AnomalyType::PowerSupplyIssue => "power_supply_issue",
        }
    }

    /// Effect table (None for `Normal`).
    pub fn profile(&self) -> Option<&'static AnomalyProfile> {
        match self {
            AnomalyType::Normal => None,
            AnomalyType::ToolWear => Some(&TOOL_WEAR),
            AnomalyType::ToolBreak => Some(&TOOL_BREAK),
            AnomalyType::MotorOverheating => Some(&MOTOR_OVERHEATING),
            AnomalyType::CoolantFailure => Some(&COOLANT_FAILURE),
            AnomalyType::PowerSupplyIssue => Some(&POWER_SUPPLY_ISSUE),
        }
    }

    /// Multiplier applied to `channel` at `severity`, or None if the fault
    /// leaves the channel untouched.
    pub fn channel_factor(&self, channel: Channel, severity: f64) -> Option<f64> {
        if *self == AnomalyType::ToolBreak
            && channel == Channel::CuttingForce
            && severity > TOOL_BREAK_COLLAPSE_SEVERITY
        {
            return Some(TOOL_BREAK_FORCE_COLLAPSE);
        }
        self.profile()?
            .effects
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, factor)| 1.0 + (factor - 1.0) * severity)
    }
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A placed anomaly episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEpisode {
    /// Fault type.
    pub anomaly_type: AnomalyType,
    /// First affected sample index.
    pub start_sample: usize,
    /// Number of affected samples.
    pub length: usize,
    /// Largest severity reached in the episode.
    pub peak_severity: f64,
}

impl AnomalyEpisode {
    /// One past the last affected sample.
    pub fn end_sample(&self) -> usize {
        self.start_sample + self.length
    }

    /// Check if the episode covers a sample index.
    pub fn contains(&self, sample_idx: usize) -> bool {
        (self.start_sample..self.end_sample()).contains(&sample_idx)
    }

    /// Episode span widened by `margin` on each side, clipped to the horizon.
    pub fn padded_span(&self, margin: usize, num_samples: usize) -> (usize, usize) {
        (
            self.start_sample.saturating_sub(margin),
            (self.end_sample() + margin).min(num_samples),
        )
    }
}

/// Split the anomaly budget into shuffled episode lengths.
///
/// Lengths are drawn from `[min, max]` and the final one is truncated so the
/// lengths sum to exactly `budget`.
pub fn plan_episode_lengths(
    budget: usize,
    config: &AnomalyConfig,
    rng: &mut (impl Rng + ?Sized),
) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut remaining = budget;

    while remaining > 0 {
        let len = rng
            .gen_range(config.min_episode_len..=config.max_episode_len)
            .min(remaining);
        lengths.push(len);
        remaining -= len;
    }

    lengths.shuffle(rng);
    lengths
}

/// Severity at `offset` samples into an episode of `length` samples.
///
/// Ramps linearly to `progression_rate` (capped at 1), plus jitter, clamped
/// to [0.1, 1.0].
pub fn ramp_severity(offset: usize, length: usize, progression_rate: f64, jitter: f64) -> f64 {
    let base = ((offset as f64 / length as f64) * progression_rate).min(1.0);
    (base + jitter).clamp(MIN_SEVERITY, 1.0)
}

/// Places anomaly episodes onto a sample sequence.
pub struct AnomalyInjector<'a> {
    config: &'a AnomalyConfig,
    severity_noise: Normal<f64>,
    maintenance_noise: Normal<f64>,
}

impl<'a> AnomalyInjector<'a> {
    /// Create an injector from configuration.
    pub fn new(config: &'a AnomalyConfig) -> Result<Self> {
        let severity_noise = Normal::new(0.0, config.severity_jitter)
            .map_err(|e| GeneratorError::InvalidConfig(format!("severity_jitter: {}", e)))?;
        let maintenance_noise = Normal::new(0.0, config.maintenance_jitter)
            .map_err(|e| GeneratorError::InvalidConfig(format!("maintenance_jitter: {}", e)))?;
        Ok(Self {
            config,
            severity_noise,
            maintenance_noise,
        })
    }

    /// Inject the configured anomaly budget into `samples`.
    ///
    /// Returns the placed episodes in placement order.
    pub fn inject(
        &self,
        samples: &mut [Sample],
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<Vec<AnomalyEpisode>> {
        let n = samples.len();
        self.config.validate(n)?;

        let budget = self.config.budget(n);
        let lengths = plan_episode_lengths(budget, self.config, rng);
        info!(
            budget,
            episodes = lengths.len(),
            "Injecting anomalies into {} samples",
            n
        );

        let mut episodes = Vec::with_capacity(lengths.len());
        for length in lengths {
            let anomaly_type = *AnomalyType::CATALOG
                .choose(rng)
                .unwrap_or(&AnomalyType::ToolWear);
            let start = self.place(samples, length, rng)?;
            let episode = self.apply(samples, anomaly_type, start, length, rng);
            debug!(
                anomaly = %episode.anomaly_type,
                start = episode.start_sample,
                length = episode.length,
                peak = episode.peak_severity,
                "Placed episode"
            );
            episodes.push(episode);
        }

        Ok(episodes)
    }

    /// Find a start index whose padded footprint holds no anomalous sample.
    fn place(
        &self,
        samples: &[Sample],
        length: usize,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<usize> {
        let n = samples.len();
        let margin = self.config.margin;
        let exhausted = GeneratorError::PlacementExhausted {
            length,
            attempts: self.config.max_placement_attempts,
        };

        let highest = match n.checked_sub(length + margin) {
            Some(h) if h >= margin => h,
            _ => return Err(exhausted),
        };

        for _ in 0..self.config.max_placement_attempts {
            let start = rng.gen_range(margin..=highest);
            let lo = start.saturating_sub(margin);
            let hi = (start + length + margin).min(n);
            if !samples[lo..hi].iter().any(|s| s.is_anomaly) {
                return Ok(start);
            }
        }

        Err(exhausted)
    }

    /// Apply one episode to `samples[start..start + length]`.
    fn apply(
        &self,
        samples: &mut [Sample],
        anomaly_type: AnomalyType,
        start: usize,
        length: usize,
        rng: &mut (impl Rng + ?Sized),
    ) -> AnomalyEpisode {
        // CATALOG entries always carry a profile
        let profile = anomaly_type.profile().unwrap_or(&TOOL_WEAR);
        let mut peak = 0.0f64;

        for offset in 0..length {
            let severity = ramp_severity(
                offset,
                length,
                profile.progression_rate,
                self.severity_noise.sample(rng),
            );
            peak = peak.max(severity);

            let sample = &mut samples[start + offset];
            sample.is_anomaly = true;
            sample.anomaly_type = anomaly_type;
            sample.anomaly_severity = severity;

            for (channel, _) in profile.effects {
                if let Some(factor) = anomaly_type.channel_factor(*channel, severity) {
                    *sample.channel_mut(*channel) *= factor;
                }
            }

            let penalty = self.config.health_penalty * severity * profile.severity_impact;
            sample.machine_health_score = (sample.machine_health_score - penalty).clamp(0.0, 100.0);

            let days = fine_days_to_maintenance(sample.machine_health_score)
                + self.maintenance_noise.sample(rng);
            sample.days_to_maintenance = days.clamp(0.0, 30.0);
        }

        AnomalyEpisode {
            anomaly_type,
            start_sample: start,
            length,
            peak_severity: peak,
        }
    }
}
