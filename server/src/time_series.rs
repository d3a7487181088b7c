use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use log::trace;

use crate::error::{Error, Result};
use crate::parameter_store::ParameterStore;
use crate::ring_buffer::RingBuffer;
use crate::types::Reading;

struct Window {
    readings: RingBuffer<Reading>,
    last_timestamp: Option<DateTime<Utc>>,
}

/// Bounded history of water level readings.
///
/// Appends take the write lock for the whole insert-and-evict step, readers
/// copy out what they need under the read lock. Readers therefore see the
/// window either before or after an append, never in between.
pub struct TimeSeriesStore {
    window: RwLock<Window>,
    parameters: Arc<ParameterStore>,
}

impl TimeSeriesStore {
    pub fn new(capacity: usize, parameters: Arc<ParameterStore>) -> Self {
        Self {
            window: RwLock::new(Window {
                readings: RingBuffer::new(capacity),
                last_timestamp: None,
            }),
            parameters,
        }
    }

    pub fn append(&self, water_level: f64) -> Result<Reading> {
        self.append_at(water_level, Utc::now)
    }

    /// `now` is read inside the critical section so timestamps follow the
    /// order in which appends take the lock
    fn append_at<F>(&self, water_level: f64, now: F) -> Result<Reading>
    where
        F: FnOnce() -> DateTime<Utc>,
    {
        if !water_level.is_finite() {
            return Err(Error::InvalidReading(water_level.to_string()));
        }

        let mut window = self.window.write().unwrap_or_else(PoisonError::into_inner);

        // The wall clock may step backwards, the window must not
        let now = now();
        let timestamp = match window.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };

        let reading = Reading {
            timestamp,
            water_level,
            setpoint_at_capture: self.parameters.get().setpoint,
        };

        if let Some(evicted) = window.readings.push(reading) {
            trace!("Evicted reading from {}", evicted.timestamp);
        }
        window.last_timestamp = Some(timestamp);

        Ok(reading)
    }

    pub fn latest(&self) -> Option<Reading> {
        self.read_window().readings.latest().copied()
    }

    /// The last `n` readings, oldest first. `None` selects the whole window.
    pub fn suffix(&self, n: Option<usize>) -> Vec<Reading> {
        let window = self.read_window();
        match n {
            Some(n) => window.readings.suffix(n),
            None => window.readings.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.read_window().readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.read_window().readings.capacity()
    }

    pub fn clear(&self) {
        let mut window = self.window.write().unwrap_or_else(PoisonError::into_inner);
        window.readings.clear();
    }

    fn read_window(&self) -> std::sync::RwLockReadGuard<'_, Window> {
        self.window.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_READINGS;
    use crate::types::Parameters;
    use chrono::{Duration, TimeZone};

    fn store(capacity: usize) -> TimeSeriesStore {
        TimeSeriesStore::new(capacity, Arc::new(ParameterStore::default()))
    }

    fn levels(readings: &[Reading]) -> Vec<f64> {
        readings.iter().map(|r| r.water_level).collect()
    }

    #[test]
    fn default_capacity_covers_a_day() {
        assert_eq!(MAX_READINGS, 17280);
    }

    #[test]
    fn oldest_reading_is_evicted_when_full() {
        let store = store(3);
        for level in &[10.0, 20.0, 30.0, 40.0] {
            store.append(*level).unwrap();
        }

        assert_eq!(levels(&store.suffix(None)), vec![20.0, 30.0, 40.0]);
        assert_eq!(store.latest().map(|r| r.water_level), Some(40.0));
    }

    #[test]
    fn never_exceeds_capacity() {
        let store = store(5);
        for i in 0..50 {
            store.append(i as f64).unwrap();
            assert!(store.len() <= 5);
        }
        assert_eq!(levels(&store.suffix(None)), vec![45.0, 46.0, 47.0, 48.0, 49.0]);
    }

    #[test]
    fn latest_of_empty_store_is_none() {
        assert_eq!(store(3).latest(), None);
    }

    #[test]
    fn latest_is_the_reading_returned_by_append() {
        let store = store(3);
        store.append(1.0).unwrap();
        let appended = store.append(2.0).unwrap();
        assert_eq!(store.latest(), Some(appended));
    }

    #[test]
    fn non_finite_levels_are_rejected_without_change() {
        let store = store(3);
        store.append(12.0).unwrap();
        let before = store.suffix(None);

        for bad in &[std::f64::NAN, std::f64::INFINITY, std::f64::NEG_INFINITY] {
            match store.append(*bad) {
                Err(Error::InvalidReading(_)) => {}
                other => panic!("Expected InvalidReading, got {:?}", other),
            }
        }
        assert_eq!(store.suffix(None), before);
    }

    #[test]
    fn suffix_is_stable() {
        let store = store(10);
        for i in 0..8 {
            store.append(i as f64).unwrap();
        }
        for n2 in 0..=8 {
            let longer = store.suffix(Some(n2));
            for n1 in 0..n2 {
                let shorter = store.suffix(Some(n1));
                assert_eq!(&shorter[..], &longer[longer.len() - n1..]);
            }
        }
        assert!(store.suffix(Some(0)).is_empty());
        assert_eq!(store.suffix(Some(100)).len(), 8);
    }

    #[test]
    fn timestamps_do_not_decrease() {
        let store = store(100);
        for i in 0..100 {
            store.append(i as f64).unwrap();
        }
        let readings = store.suffix(None);
        for pair in readings.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn clock_stepping_back_keeps_previous_timestamp() {
        let store = store(4);
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let earlier = later - Duration::seconds(30);

        let first = store.append_at(1.0, || later).unwrap();
        let second = store.append_at(2.0, || earlier).unwrap();
        assert_eq!(first.timestamp, later);
        assert_eq!(second.timestamp, later);

        let third = store.append_at(3.0, || later + Duration::seconds(5)).unwrap();
        assert_eq!(third.timestamp, later + Duration::seconds(5));
    }

    #[test]
    fn readings_capture_current_setpoint() {
        let parameters = Arc::new(ParameterStore::new(Parameters {
            setpoint: 30.0,
            ..Parameters::default()
        }));
        let store = TimeSeriesStore::new(4, Arc::clone(&parameters));

        store.append(1.0).unwrap();
        parameters
            .set(&serde_json::from_value(serde_json::json!({"setpoint": 65})).unwrap())
            .unwrap();
        store.append(2.0).unwrap();

        let setpoints: Vec<f64> = store
            .suffix(None)
            .iter()
            .map(|r| r.setpoint_at_capture)
            .collect();
        assert_eq!(setpoints, vec![30.0, 65.0]);
    }

    #[test]
    fn clear_empties_window() {
        let store = store(3);
        store.append(1.0).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 3);
    }
}
