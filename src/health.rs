// MechInsight - Health & maintenance overlay
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Health degradation and maintenance overlay.
//!
//! Health starts at 100 and decays with machine hours, floored at 20.
//! Maintenance checkpoints reset it to full health, producing a sawtooth.
//! Days-to-maintenance is a step function of health, so the two columns are
//! strongly (inversely) related.

use crate::config::{HealthConfig, SAMPLES_PER_DAY};
use crate::error::{GeneratorError, Result};
use crate::sample::Sample;
use rand::prelude::*;
use rand_distr::Normal;
use tracing::debug;

/// Days-to-maintenance after a maintenance event.
pub const FULL_SERVICE_DAYS: f64 = 30.0;

/// Coarse step function used by the degradation walk.
pub fn coarse_days_to_maintenance(health: f64) -> f64 {
    if health > 80.0 {
        30.0
    } else if health > 60.0 {
        20.0
    } else if health > 40.0 {
        10.0
    } else {
        (health / 10.0).floor().max(0.0)
    }
}

/// Finer step function used after an anomaly penalty.
pub fn fine_days_to_maintenance(health: f64) -> f64 {
    if health > 80.0 {
        30.0
    } else if health > 60.0 {
        20.0
    } else if health > 40.0 {
        10.0
    } else if health > 20.0 {
        5.0
    } else if health > 10.0 {
        2.0
    } else {
        0.0
    }
}

/// Pick maintenance checkpoint sample indices.
///
/// Event `k` (1-based) lands on day `k * interval ± jitter` at a random hour.
/// Checkpoints past the horizon are kept; they simply never fire.
pub fn schedule_maintenance(config: &HealthConfig, rng: &mut (impl Rng + ?Sized)) -> Vec<usize> {
    let jitter = config.maintenance_jitter_days;
    (1..=config.maintenance_events as i64)
        .map(|k| {
            let day = k * config.maintenance_interval_days + rng.gen_range(-jitter..=jitter);
            let hour = rng.gen_range(0..SAMPLES_PER_DAY as i64);
            (day.max(0) * SAMPLES_PER_DAY as i64 + hour) as usize
        })
        .collect()
}

/// Running state of the degradation walk.
#[derive(Debug, Clone)]
struct HealthState {
    health: f64,
    prev_total_hours: Option<f64>,
}

impl HealthState {
    fn step(&mut self, sample: &mut Sample, is_checkpoint: bool, config: &HealthConfig) {
        if let Some(prev) = self.prev_total_hours {
            let usage_factor = 1.0 + (sample.total_machine_hours - prev) / 1000.0;
            self.health = (self.health - config.decay_per_hour * usage_factor).max(config.floor);
        }
        self.prev_total_hours = Some(sample.total_machine_hours);

        if is_checkpoint {
            self.health = config.initial;
            sample.machine_health_score = config.initial;
            sample.days_to_maintenance = FULL_SERVICE_DAYS;
        } else {
            sample.machine_health_score = self.health;
            sample.days_to_maintenance = coarse_days_to_maintenance(self.health);
        }
    }
}

/// Overlay health and days-to-maintenance without noise.
pub fn walk_health(samples: &mut [Sample], checkpoints: &[usize], config: &HealthConfig) {
    let mut state = HealthState {
        health: config.initial,
        prev_total_hours: None,
    };

    for (i, sample) in samples.iter_mut().enumerate() {
        state.step(sample, checkpoints.contains(&i), config);
    }

    debug!(
        checkpoints = ?checkpoints,
        final_health = state.health,
        "Health walk complete"
    );
}

/// Add per-sample Gaussian noise to health and clamp to [0, 100].
pub fn add_health_noise(
    samples: &mut [Sample],
    config: &HealthConfig,
    rng: &mut (impl Rng + ?Sized),
) -> Result<()> {
    let noise = Normal::new(0.0, config.noise_std)
        .map_err(|e| GeneratorError::InvalidConfig(format!("health noise_std: {}", e)))?;
    for sample in samples.iter_mut() {
        sample.machine_health_score =
            (sample.machine_health_score + noise.sample(rng)).clamp(0.0, 100.0);
    }
    Ok(())
}

/// Full overlay: schedule checkpoints, walk, add noise.
///
/// Returns the checkpoint indices.
pub fn apply_health_overlay(
    samples: &mut [Sample],
    config: &HealthConfig,
    rng: &mut (impl Rng + ?Sized),
) -> Result<Vec<usize>> {
    let checkpoints = schedule_maintenance(config, rng);
    walk_health(samples, &checkpoints, config);
    add_health_noise(samples, config, rng)?;
    Ok(checkpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hourly(n: usize) -> Vec<Sample> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                let mut s = Sample::new(start + chrono::Duration::hours(i as i64));
                s.total_machine_hours = 5001.0 + i as f64;
                s
            })
            .collect()
    }

    #[test]
    fn test_coarse_steps() {
        assert_eq!(coarse_days_to_maintenance(95.0), 30.0);
        assert_eq!(coarse_days_to_maintenance(80.0), 20.0);
        assert_eq!(coarse_days_to_maintenance(61.0), 20.0);
        assert_eq!(coarse_days_to_maintenance(45.0), 10.0);
        assert_eq!(coarse_days_to_maintenance(39.9), 3.0);
        assert_eq!(coarse_days_to_maintenance(0.0), 0.0);
    }

    #[test]
    fn test_fine_steps() {
        assert_eq!(fine_days_to_maintenance(81.0), 30.0);
        assert_eq!(fine_days_to_maintenance(70.0), 20.0);
        assert_eq!(fine_days_to_maintenance(50.0), 10.0);
        assert_eq!(fine_days_to_maintenance(25.0), 5.0);
        assert_eq!(fine_days_to_maintenance(15.0), 2.0);
        assert_eq!(fine_days_to_maintenance(10.0), 0.0);
    }

    #[test]
    fn test_schedule_within_jitter() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = HealthConfig::default();
        for _ in 0..50 {
            let points = schedule_maintenance(&config, &mut rng);
            assert_eq!(points.len(), 3);
            for (k, p) in points.iter().enumerate() {
                let nominal = (k + 1) * 30 * 24;
                assert!(*p + 5 * 24 >= nominal);
                assert!(*p < nominal + 6 * 24);
            }
        }
    }

    #[test]
    fn test_walk_decays_and_floors() {
        let config = HealthConfig {
            decay_per_hour: 1.0,
            ..Default::default()
        };
        let mut samples = hourly(200);
        walk_health(&mut samples, &[], &config);

        assert_eq!(samples[0].machine_health_score, 100.0);
        // decay 1.0 * (1 + 1/1000) per hour
        assert!((samples[1].machine_health_score - 98.999).abs() < 1e-9);
        assert_eq!(samples[199].machine_health_score, 20.0);
        assert!(samples
            .windows(2)
            .all(|w| w[1].machine_health_score <= w[0].machine_health_score));
    }

    #[test]
    fn test_checkpoint_resets() {
        let config = HealthConfig {
            decay_per_hour: 0.5,
            ..Default::default()
        };
        let mut samples = hourly(300);
        walk_health(&mut samples, &[150], &config);

        assert!(samples[149].machine_health_score < 30.0);
        assert_eq!(samples[150].machine_health_score, 100.0);
        assert_eq!(samples[150].days_to_maintenance, 30.0);
        assert!(samples[151].machine_health_score < 100.0);
        assert!(samples[151].machine_health_score > 99.0);
    }

    #[test]
    fn test_days_follow_health() {
        let config = HealthConfig {
            decay_per_hour: 0.5,
            ..Default::default()
        };
        let mut samples = hourly(200);
        walk_health(&mut samples, &[], &config);
        for s in &samples {
            assert_eq!(
                s.days_to_maintenance,
                coarse_days_to_maintenance(s.machine_health_score)
            );
        }
    }

    #[test]
    fn test_noise_keeps_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = HealthConfig {
            noise_std: 5.0,
            ..Default::default()
        };
        let mut samples = hourly(500);
        walk_health(&mut samples, &[], &config);
        add_health_noise(&mut samples, &config, &mut rng).unwrap();
        assert!(samples
            .iter()
            .all(|s| (0.0..=100.0).contains(&s.machine_health_score)));
        assert!(samples.iter().any(|s| s.machine_health_score < 100.0));
    }
}
