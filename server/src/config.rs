use std::path::Path;

use std::fs::File;
use std::io::prelude::*;

use log::LevelFilter;
use serde_derive::Deserialize;

use crate::constants::{DEFAULT_HTTP_ADDRESS, DEFAULT_HTTP_PORT, MAX_READINGS};
use crate::error::{Error, Result};
use crate::types::Parameters;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub http_port: u16,
    pub http_address: String,
    /// Number of readings retained before the oldest is evicted
    pub capacity: usize,
    /// One of off, error, warn, info, debug or trace
    pub log_level: String,
    /// Values the parameter store starts out with
    pub parameters: Parameters,
    pub simulation: SimulationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            http_port: DEFAULT_HTTP_PORT,
            http_address: DEFAULT_HTTP_ADDRESS.into(),
            capacity: MAX_READINGS,
            log_level: "debug".into(),
            parameters: Parameters::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Synthetic sine wave readings, for running the dashboard without a sensor
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub amplitude: f64,
    pub bias: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            enabled: false,
            interval_secs: 5,
            amplitude: 20.,
            bias: 50.,
        }
    }
}

impl Config {
    pub fn log_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("unknown log level {}", self.log_level)))
    }
}

pub fn read_config(config_path: &Path) -> Result<Config> {
    let mut file = File::open(config_path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    config.log_filter()?;
    if config.capacity == 0 {
        return Err(Error::InvalidConfig("capacity must be at least 1".into()));
    }
    let parameters = &config.parameters;
    let all_finite = [parameters.setpoint, parameters.kp, parameters.ki, parameters.kd]
        .iter()
        .all(|v| v.is_finite());
    if !all_finite {
        return Err(Error::InvalidConfig("parameters must be finite".into()));
    }
    if config.simulation.enabled && config.simulation.interval_secs == 0 {
        return Err(Error::InvalidConfig("simulation interval must be at least 1 second".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn partial_config_overrides_fields() {
        let config = parse_config(
            r#"
            http_port = 8080
            capacity = 3
            log_level = "info"

            [parameters]
            kp = 4.0

            [simulation]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.http_port, 8080);
        assert_eq!(config.http_address, "0.0.0.0");
        assert_eq!(config.capacity, 3);
        assert_eq!(config.log_filter().unwrap(), LevelFilter::Info);
        assert_eq!(config.parameters.kp, 4.0);
        assert_eq!(config.parameters.setpoint, 50.0);
        assert!(config.simulation.enabled);
        assert_eq!(config.simulation.interval_secs, 5);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        match parse_config("capacity = 0") {
            Err(Error::InvalidConfig(_)) => {}
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        match parse_config("log_level = \"chatty\"") {
            Err(Error::InvalidConfig(_)) => {}
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn malformed_config_is_an_error() {
        match parse_config("http_port = \"not a port\"") {
            Err(Error::Toml(_)) => {}
            other => panic!("Expected Toml error, got {:?}", other),
        }
    }
}
