use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserializer, Serializer};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{DEFAULT_KD, DEFAULT_KI, DEFAULT_KP, DEFAULT_SETPOINT};

/// One water level sample together with the setpoint that was active when it
/// was stored.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub water_level: f64,
    #[serde(rename = "setpoint")]
    pub setpoint_at_capture: f64,
}

/// The most recent reading, or nulls when nothing has been received yet.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentLevel {
    pub water_level: Option<f64>,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setpoint: Option<f64>,
}

impl From<Option<Reading>> for CurrentLevel {
    fn from(reading: Option<Reading>) -> Self {
        CurrentLevel {
            water_level: reading.map(|r| r.water_level),
            timestamp: reading.map(|r| r.timestamp),
            setpoint: reading.map(|r| r.setpoint_at_capture),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Parameters {
    pub setpoint: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            setpoint: DEFAULT_SETPOINT,
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            kd: DEFAULT_KD,
        }
    }
}

/// Partial parameter update as sent by a client. Values are kept raw until the
/// parameter store validates them so that a bad field can be reported by name.
/// A field sent as `null` is present (`Some(Value::Null)`), unlike a missing one.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ParameterUpdate {
    #[serde(deserialize_with = "present")]
    pub setpoint: Option<Value>,
    #[serde(deserialize_with = "present")]
    pub kp: Option<Value>,
    #[serde(deserialize_with = "present")]
    pub ki: Option<Value>,
    #[serde(deserialize_with = "present")]
    pub kd: Option<Value>,
}

impl ParameterUpdate {
    pub fn is_empty(&self) -> bool {
        self.setpoint.is_none() && self.kp.is_none() && self.ki.is_none() && self.kd.is_none()
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadingSubmission {
    pub water_level: Option<Value>,
}

/// Interprets a JSON number or numeric string as a finite float
pub fn parse_scalar(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    <Value as serde::Deserialize>::deserialize(deserializer).map(Some)
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(timestamp))
}

fn serialize_optional_timestamp<S: Serializer>(
    timestamp: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match timestamp {
        Some(timestamp) => serialize_timestamp(timestamp, serializer),
        None => serializer.serialize_none(),
    }
}
