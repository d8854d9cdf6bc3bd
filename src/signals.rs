// MechInsight - Base signal generation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Base sensor signals and usage counters.
//!
//! Sensor channels are independent normal draws. The usage counters are
//! produced by a fold over the sample index carrying [`UsageState`].

use crate::config::{Gaussian, SignalConfig};
use crate::error::{GeneratorError, Result};
use crate::sample::{Channel, Sample};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::prelude::*;
use rand_distr::Normal;

/// Running counters carried from one sample to the next.
#[derive(Debug, Clone)]
pub struct UsageState {
    /// Cumulative machine hours.
    pub cumulative_hours: f64,
    /// Minutes on the current tool.
    pub tool_usage: f64,
    /// Calendar day of the previous sample.
    pub current_day: Option<NaiveDate>,
    /// Hours run on the current day.
    pub daily_hours: f64,
}

impl UsageState {
    /// Starting counters.
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            cumulative_hours: config.initial_machine_hours,
            tool_usage: 0.0,
            current_day: None,
            daily_hours: 0.0,
        }
    }

    /// Advance the counters to the sample at `index` and write them into it.
    pub fn step(
        &mut self,
        index: usize,
        sample: &mut Sample,
        config: &SignalConfig,
        rng: &mut (impl Rng + ?Sized),
    ) {
        let day = sample.timestamp.date();
        if self.current_day != Some(day) {
            self.current_day = Some(day);
            let (lo, hi) = config.daily_hours_range;
            self.daily_hours = rng.gen_range(lo..=hi);
        }

        self.cumulative_hours += 1.0;

        if index > 0 {
            if self.tool_usage > config.tool_wear_threshold {
                self.tool_usage = 0.0;
            } else {
                let (lo, hi) = config.tool_increment_range;
                self.tool_usage += rng.gen_range(lo..=hi);
            }
        }

        sample.machine_hours_today = self.daily_hours;
        sample.total_machine_hours = self.cumulative_hours;
        sample.tool_usage_min = self.tool_usage;
    }
}

/// Normal distributions for the eight randomly drawn channels.
struct ChannelSampler {
    channels: Vec<(Channel, Normal<f64>)>,
}

impl ChannelSampler {
    fn new(config: &SignalConfig) -> Result<Self> {
        let table = [
            (Channel::VibrationRms, config.vibration_rms),
            (Channel::MotorTemp, config.motor_temp),
            (Channel::SpindleCurrent, config.spindle_current),
            (Channel::Rpm, config.rpm),
            (Channel::CoolantTemp, config.coolant_temp),
            (Channel::CuttingForce, config.cutting_force),
            (Channel::PowerConsumption, config.power_consumption),
            (Channel::AcousticLevel, config.acoustic_level),
        ];

        let channels = table
            .into_iter()
            .map(|(channel, Gaussian { mean, std })| {
                Normal::new(mean, std)
                    .map(|dist| (channel, dist))
                    .map_err(|e| {
                        GeneratorError::InvalidConfig(format!("{}: {}", channel.column(), e))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { channels })
    }

    fn fill(&self, sample: &mut Sample, rng: &mut (impl Rng + ?Sized)) {
        for (channel, dist) in &self.channels {
            *sample.channel_mut(*channel) = dist.sample(rng);
        }
    }
}

/// Generate `num_samples` hourly samples of base signals.
pub fn generate_base_signals(
    start: NaiveDateTime,
    num_samples: usize,
    config: &SignalConfig,
    rng: &mut (impl Rng + ?Sized),
) -> Result<Vec<Sample>> {
    let sampler = ChannelSampler::new(config)?;

    let (samples, _) = (0..num_samples).fold(
        (Vec::with_capacity(num_samples), UsageState::new(config)),
        |(mut samples, mut state), i| {
            let mut sample = Sample::new(start + Duration::hours(i as i64));
            sampler.fill(&mut sample, rng);
            state.step(i, &mut sample, config, rng);
            samples.push(sample);
            (samples, state)
        },
    );

    Ok(samples)
}
