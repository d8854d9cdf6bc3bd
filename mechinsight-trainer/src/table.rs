// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Feature matrix construction.
//!
//! Every model reads the same 20 columns: the nine sensors, both usage
//! counters, the seven derived features, and two calendar features taken
//! from the timestamp.

use chrono::{Datelike, Timelike};
use mechinsight::Sample;

/// Number of model input columns.
pub const NUM_FEATURES: usize = 20;

/// Model input columns in matrix order.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    "vibration_rms",
    "motor_temp_C",
    "spindle_current_A",
    "rpm",
    "tool_usage_min",
    "coolant_temp_C",
    "cutting_force_N",
    "power_consumption_W",
    "acoustic_level_dB",
    "machine_hours_today",
    "total_machine_hours",
    "vibration_trend",
    "motor_temp_trend",
    "power_efficiency",
    "tool_wear_rate",
    "vibration_std_24h",
    "temp_rate_change",
    "current_stability",
    "hour",
    "day_of_week",
];

/// Feature vector for one sample. Day of week counts from Monday = 0.
pub fn feature_row(sample: &Sample) -> Vec<f64> {
    vec![
        sample.vibration_rms,
        sample.motor_temp_c,
        sample.spindle_current_a,
        sample.rpm,
        sample.tool_usage_min,
        sample.coolant_temp_c,
        sample.cutting_force_n,
        sample.power_consumption_w,
        sample.acoustic_level_db,
        sample.machine_hours_today,
        sample.total_machine_hours,
        sample.vibration_trend,
        sample.motor_temp_trend,
        sample.power_efficiency,
        sample.tool_wear_rate,
        sample.vibration_std_24h,
        sample.temp_rate_change,
        sample.current_stability,
        f64::from(sample.timestamp.hour()),
        f64::from(sample.timestamp.weekday().num_days_from_monday()),
    ]
}

/// Feature matrix for a sample sequence, one row per sample.
pub fn feature_matrix(samples: &[Sample]) -> Vec<Vec<f64>> {
    samples.iter().map(feature_row).collect()
}

/// Select rows by index.
pub fn take_rows<T: Clone>(rows: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| rows[i].clone()).collect()
}

/// Trailing windows flattened row-major.
///
/// Window `i` covers rows `i..i + length` and is paired with the target at
/// `i + length`, so there are `rows.len() - length` windows.
pub fn sequence_windows(
    rows: &[Vec<f64>],
    targets: &[f64],
    length: usize,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let count = rows.len().min(targets.len()).saturating_sub(length);
    (0..count)
        .map(|i| (rows[i..i + length].concat(), targets[i + length]))
        .unzip()
}
