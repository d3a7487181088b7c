use std::sync::{PoisonError, RwLock};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{parse_scalar, ParameterUpdate, Parameters};

/// Process wide control parameters handed out to the actuator and dashboards.
///
/// The record is replaced as a whole under the write lock, so readers always
/// see all four values from the same update.
pub struct ParameterStore {
    current: RwLock<Parameters>,
}

impl ParameterStore {
    pub fn new(initial: Parameters) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    pub fn get(&self) -> Parameters {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies every field present in `update`. Nothing is changed unless all
    /// present fields are valid.
    pub fn set(&self, update: &ParameterUpdate) -> Result<Parameters> {
        let setpoint = validate("setpoint", &update.setpoint)?;
        let kp = validate("kp", &update.kp)?;
        let ki = validate("ki", &update.ki)?;
        let kd = validate("kd", &update.kd)?;

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = *current;
        if let Some(setpoint) = setpoint {
            next.setpoint = setpoint;
        }
        if let Some(kp) = kp {
            next.kp = kp;
        }
        if let Some(ki) = ki {
            next.ki = ki;
        }
        if let Some(kd) = kd {
            next.kd = kd;
        }
        *current = next;

        Ok(next)
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(Parameters::default())
    }
}

fn validate(name: &'static str, value: &Option<Value>) -> Result<Option<f64>> {
    match value {
        None => Ok(None),
        Some(raw) => parse_scalar(raw)
            .map(Some)
            .ok_or_else(|| Error::InvalidParameter {
                name,
                value: raw.to_string(),
            }),
    }
}
