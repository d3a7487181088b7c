/// Seconds between two readings from the tank sensor
pub const SAMPLE_INTERVAL_SECS: usize = 5;
/// How far back the reading history reaches
pub const RETENTION_SECS: usize = 24 * 60 * 60;
/// Number of readings kept before the oldest ones are evicted
pub const MAX_READINGS: usize = RETENTION_SECS / SAMPLE_INTERVAL_SECS;

pub const DEFAULT_SETPOINT: f64 = 50.0;
pub const DEFAULT_KP: f64 = 2.0;
pub const DEFAULT_KI: f64 = 0.1;
pub const DEFAULT_KD: f64 = 0.5;

pub const DEFAULT_HTTP_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 5000;
