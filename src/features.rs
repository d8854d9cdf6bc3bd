// MechInsight - Derived features
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Derived-feature overlay.
//!
//! Trailing-window statistics use whatever partial window exists at the start
//! of the series, so every feature is defined from the first sample on.

use crate::config::FeatureConfig;
use crate::sample::Sample;
use std::collections::VecDeque;

/// Trailing window over the last N values.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Add a value, evicting the oldest once full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean of the window (0 when empty).
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Sample standard deviation (n - 1). A single value yields 0.
    pub fn std(&self) -> f64 {
        let n = self.values.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self.values.iter().map(|v| (v - mean).powi(2)).sum();
        (sum_sq / (n - 1) as f64).sqrt()
    }
}

/// Compute the derived feature columns in place.
pub fn apply_derived_features(samples: &mut [Sample], config: &FeatureConfig) {
    let mut vibration = RollingWindow::new(config.long_window);
    let mut motor_temp = RollingWindow::new(config.long_window);
    let mut current = RollingWindow::new(config.short_window);
    let mut previous: Option<(f64, f64)> = None;

    for sample in samples.iter_mut() {
        vibration.push(sample.vibration_rms);
        motor_temp.push(sample.motor_temp_c);
        current.push(sample.spindle_current_a);

        sample.vibration_trend = vibration.mean();
        sample.vibration_std_24h = vibration.std();
        sample.motor_temp_trend = motor_temp.mean();
        sample.current_stability = current.std();
        sample.power_efficiency = power_efficiency(sample.rpm, sample.power_consumption_w);

        let (tool_rate, temp_rate) = match previous {
            Some((tool, temp)) => (sample.tool_usage_min - tool, sample.motor_temp_c - temp),
            None => (0.0, 0.0),
        };
        sample.tool_wear_rate = tool_rate;
        sample.temp_rate_change = temp_rate;
        previous = Some((sample.tool_usage_min, sample.motor_temp_c));
    }
}

/// Revolutions per kilowatt.
pub fn power_efficiency(rpm: f64, power_w: f64) -> f64 {
    if power_w == 0.0 {
        return 0.0;
    }
    rpm / power_w * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(vibration: &[f64]) -> Vec<Sample> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        vibration
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut s = Sample::new(start + chrono::Duration::hours(i as i64));
                s.vibration_rms = *v;
                s.motor_temp_c = 60.0 + i as f64;
                s.spindle_current_a = 15.0;
                s.tool_usage_min = 10.0 * i as f64;
                s.rpm = 3000.0;
                s.power_consumption_w = 5000.0;
                s
            })
            .collect()
    }

    #[test]
    fn test_window_eviction() {
        let mut w = RollingWindow::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            w.push(v);
        }
        assert_eq!(w.len(), 3);
        assert_relative_eq!(w.mean(), 3.0);
        assert_relative_eq!(w.std(), 1.0);
    }

    #[test]
    fn test_single_element_window() {
        let mut w = RollingWindow::new(24);
        assert!(w.is_empty());
        w.push(0.9);
        assert_eq!(w.mean(), 0.9);
        assert_eq!(w.std(), 0.0);
    }

    #[test]
    fn test_first_sample_features() {
        let mut samples = series(&[0.73, 0.81, 0.95]);
        apply_derived_features(&mut samples, &FeatureConfig::default());

        let first = &samples[0];
        assert_eq!(first.vibration_trend, 0.73);
        assert_eq!(first.vibration_std_24h, 0.0);
        assert_eq!(first.motor_temp_trend, 60.0);
        assert_eq!(first.tool_wear_rate, 0.0);
        assert_eq!(first.temp_rate_change, 0.0);
        assert_eq!(first.current_stability, 0.0);
    }

    #[test]
    fn test_partial_and_full_windows() {
        let vib: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let mut samples = series(&vib);
        apply_derived_features(&mut samples, &FeatureConfig::default());

        // Partial window: mean of 0..=9
        assert_relative_eq!(samples[9].vibration_trend, 4.5);
        // Full window at 29 covers 6..=29
        assert_relative_eq!(samples[29].vibration_trend, 17.5);
        assert_relative_eq!(samples[29].motor_temp_trend, 60.0 + 17.5);
    }

    #[test]
    fn test_rates_and_efficiency() {
        let mut samples = series(&[0.8; 5]);
        apply_derived_features(&mut samples, &FeatureConfig::default());

        for s in &samples[1..] {
            assert_relative_eq!(s.tool_wear_rate, 10.0);
            assert_relative_eq!(s.temp_rate_change, 1.0);
        }
        assert_relative_eq!(samples[0].power_efficiency, 600.0);
    }
}
