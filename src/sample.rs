// MechInsight - Sample records
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Hourly telemetry record and sensor channel addressing.

use crate::anomalies::AnomalyType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used in every table.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Raw sensor channels that anomalies can perturb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    VibrationRms,
    MotorTemp,
    SpindleCurrent,
    Rpm,
    ToolUsage,
    CoolantTemp,
    CuttingForce,
    PowerConsumption,
    AcousticLevel,
}

impl Channel {
    /// All channels in column order.
    pub const ALL: [Channel; 9] = [
        Channel::VibrationRms,
        Channel::MotorTemp,
        Channel::SpindleCurrent,
        Channel::Rpm,
        Channel::ToolUsage,
        Channel::CoolantTemp,
        Channel::CuttingForce,
        Channel::PowerConsumption,
        Channel::AcousticLevel,
    ];

    /// CSV column name.
    pub fn column(&self) -> &'static str {
        match self {
            Channel::VibrationRms => "vibration_rms",
            Channel::MotorTemp => "motor_temp_C",
            Channel::SpindleCurrent => "spindle_current_A",
            Channel::Rpm => "rpm",
            Channel::ToolUsage => "tool_usage_min",
            Channel::CoolantTemp => "coolant_temp_C",
            Channel::CuttingForce => "cutting_force_N",
            Channel::PowerConsumption => "power_consumption_W",
            Channel::AcousticLevel => "acoustic_level_dB",
        }
    }

    /// Unit of measurement.
    pub fn unit(&self) -> &'static str {
        match self {
            Channel::VibrationRms => "g",
            Channel::MotorTemp | Channel::CoolantTemp => "°C",
            Channel::SpindleCurrent => "A",
            Channel::Rpm => "rpm",
            Channel::ToolUsage => "min",
            Channel::CuttingForce => "N",
            Channel::PowerConsumption => "W",
            Channel::AcousticLevel => "dB",
        }
    }
}

/// One hourly telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub vibration_rms: f64,
    #[serde(rename = "motor_temp_C")]
    pub motor_temp_c: f64,
    #[serde(rename = "spindle_current_A")]
    pub spindle_current_a: f64,
    pub rpm: f64,
    pub tool_usage_min: f64,
    #[serde(rename = "coolant_temp_C")]
    pub coolant_temp_c: f64,
    #[serde(rename = "cutting_force_N")]
    pub cutting_force_n: f64,
    #[serde(rename = "power_consumption_W")]
    pub power_consumption_w: f64,
    #[serde(rename = "acoustic_level_dB")]
    pub acoustic_level_db: f64,
    pub machine_hours_today: f64,
    pub total_machine_hours: f64,
    pub machine_health_score: f64,
    pub days_to_maintenance: f64,
    #[serde(with = "flag")]
    pub is_anomaly: bool,
    pub anomaly_type: AnomalyType,
    pub anomaly_severity: f64,
    pub vibration_trend: f64,
    pub motor_temp_trend: f64,
    pub power_efficiency: f64,
    pub tool_wear_rate: f64,
    pub vibration_std_24h: f64,
    pub temp_rate_change: f64,
    pub current_stability: f64,
}

impl Sample {
    /// Column names in the order written by [`Sample::csv_record`].
    pub const CSV_HEADER: [&'static str; 24] = [
        "timestamp",
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
        "machine_health_score",
        "days_to_maintenance",
        "is_anomaly",
        "anomaly_type",
        "anomaly_severity",
        "vibration_trend",
        "motor_temp_trend",
        "power_efficiency",
        "tool_wear_rate",
        "vibration_std_24h",
        "temp_rate_change",
        "current_stability",
    ];

    /// Create a normal sample with zeroed readings.
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            vibration_rms: 0.0,
            motor_temp_c: 0.0,
            spindle_current_a: 0.0,
            rpm: 0.0,
            tool_usage_min: 0.0,
            coolant_temp_c: 0.0,
            cutting_force_n: 0.0,
            power_consumption_w: 0.0,
            acoustic_level_db: 0.0,
            machine_hours_today: 0.0,
            total_machine_hours: 0.0,
            machine_health_score: 0.0,
            days_to_maintenance: 0.0,
            is_anomaly: false,
            anomaly_type: AnomalyType::Normal,
            anomaly_severity: 0.0,
            vibration_trend: 0.0,
            motor_temp_trend: 0.0,
            power_efficiency: 0.0,
            tool_wear_rate: 0.0,
            vibration_std_24h: 0.0,
            temp_rate_change: 0.0,
            current_stability: 0.0,
        }
    }

    /// Read a sensor channel.
    pub fn channel(&self, channel: Channel) -> f64 {
        match channel {
            Channel::VibrationRms => self.vibration_rms,
            Channel::MotorTemp => self.motor_temp_c,
            Channel::SpindleCurrent => self.spindle_current_a,
            Channel::Rpm => self.rpm,
            Channel::ToolUsage => self.tool_usage_min,
            Channel::CoolantTemp => self.coolant_temp_c,
            Channel::CuttingForce => self.cutting_force_n,
            Channel::PowerConsumption => self.power_consumption_w,
            Channel::AcousticLevel => self.acoustic_level_db,
        }
    }

    /// Mutable access to a sensor channel.
    pub fn channel_mut(&mut self, channel: Channel) -> &mut f64 {
        match channel {
            Channel::VibrationRms => &mut self.vibration_rms,
            Channel::MotorTemp => &mut self.motor_temp_c,
            Channel::SpindleCurrent => &mut self.spindle_current_a,
            Channel::Rpm => &mut self.rpm,
            Channel::ToolUsage => &mut self.tool_usage_min,
            Channel::CoolantTemp => &mut self.coolant_temp_c,
            Channel::CuttingForce => &mut self.cutting_force_n,
            Channel::PowerConsumption => &mut self.power_consumption_w,
            Channel::AcousticLevel => &mut self.acoustic_level_db,
        }
    }

    /// Field values as CSV cells, matching [`Sample::CSV_HEADER`].
    pub fn csv_record(&self) -> Vec<String> {
        vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.vibration_rms.to_string(),
            self.motor_temp_c.to_string(),
            self.spindle_current_a.to_string(),
            self.rpm.to_string(),
            self.tool_usage_min.to_string(),
            self.coolant_temp_c.to_string(),
            self.cutting_force_n.to_string(),
            self.power_consumption_w.to_string(),
            self.acoustic_level_db.to_string(),
            self.machine_hours_today.to_string(),
            self.total_machine_hours.to_string(),
            self.machine_health_score.to_string(),
            self.days_to_maintenance.to_string(),
            u8::from(self.is_anomaly).to_string(),
            self.anomaly_type.label().to_string(),
            self.anomaly_severity.to_string(),
            self.vibration_trend.to_string(),
            self.motor_temp_trend.to_string(),
            self.power_efficiency.to_string(),
            self.tool_wear_rate.to_string(),
            self.vibration_std_24h.to_string(),
            self.temp_rate_change.to_string(),
            self.current_stability.to_string(),
        ]
    }
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)
    }
}

// 0/1 in tables; also accepts the float and boolean spellings other tools emit.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Int(u8),
        Float(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match RawFlag::deserialize(deserializer)? {
            RawFlag::Bool(b) => Ok(b),
            RawFlag::Int(0) => Ok(false),
            RawFlag::Int(1) => Ok(true),
            RawFlag::Float(f) if f == 0.0 => Ok(false),
            RawFlag::Float(f) if f == 1.0 => Ok(true),
            RawFlag::Text(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            RawFlag::Text(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(serde::de::Error::custom("anomaly flag must be 0 or 1")),
        }
    }
}
