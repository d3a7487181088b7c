use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::time_series::TimeSeriesStore;
use crate::types::{parse_scalar, Reading, ReadingSubmission};

/// Write side of the reading history. Every accepted submission becomes
/// exactly one stored reading.
#[derive(Clone)]
pub struct IngestionService {
    store: Arc<TimeSeriesStore>,
}

impl IngestionService {
    pub fn new(store: Arc<TimeSeriesStore>) -> Self {
        Self { store }
    }

    pub fn submit(&self, submission: &ReadingSubmission) -> Result<Reading> {
        match &submission.water_level {
            Some(value) => self.ingest_value(value),
            None => {
                warn!("Rejected reading without a water level");
                Err(Error::InvalidReading("water level data missing".into()))
            }
        }
    }

    pub fn ingest_value(&self, value: &Value) -> Result<Reading> {
        match parse_scalar(value) {
            Some(level) => self.ingest(level),
            None => {
                warn!("Rejected non-numeric water level {}", value);
                Err(Error::InvalidReading(value.to_string()))
            }
        }
    }

    pub fn ingest(&self, water_level: f64) -> Result<Reading> {
        let reading = self.store.append(water_level)?;
        info!("Received water level: {}%", reading.water_level);
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter_store::ParameterStore;
    use serde_json::json;

    fn setup() -> (Arc<TimeSeriesStore>, IngestionService) {
        let store = Arc::new(TimeSeriesStore::new(10, Arc::new(ParameterStore::default())));
        let service = IngestionService::new(Arc::clone(&store));
        (store, service)
    }

    fn submission(value: Value) -> ReadingSubmission {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn stores_numeric_submission() {
        let (store, service) = setup();
        let reading = service.submit(&submission(json!({"waterLevel": 42.5}))).unwrap();
        assert_eq!(reading.water_level, 42.5);
        assert_eq!(store.latest(), Some(reading));
    }

    #[test]
    fn stores_numeric_string_submission() {
        let (store, service) = setup();
        service.submit(&submission(json!({"waterLevel": "63.2"}))).unwrap();
        assert_eq!(store.latest().map(|r| r.water_level), Some(63.2));
    }

    #[test]
    fn rejects_missing_and_garbage_levels() {
        let (store, service) = setup();
        service.ingest(5.0).unwrap();

        let bad = vec![
            json!({}),
            json!({"waterLevel": null}),
            json!({"waterLevel": "high"}),
            json!({"waterLevel": true}),
            json!({"waterLevel": {"value": 3}}),
        ];
        for body in bad {
            match service.submit(&submission(body.clone())) {
                Err(Error::InvalidReading(_)) => {}
                other => panic!("Expected InvalidReading for {}, got {:?}", body, other),
            }
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.latest().map(|r| r.water_level), Some(5.0));
    }

    #[test]
    fn repeated_submissions_are_all_stored() {
        let (store, service) = setup();
        for _ in 0..4 {
            service.ingest(50.0).unwrap();
        }
        assert_eq!(store.len(), 4);
    }
}
