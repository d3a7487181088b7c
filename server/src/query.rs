use std::sync::Arc;

use crate::time_series::TimeSeriesStore;
use crate::types::{CurrentLevel, Reading};

/// Read side of the reading history
#[derive(Clone)]
pub struct QueryService {
    store: Arc<TimeSeriesStore>,
}

impl QueryService {
    pub fn new(store: Arc<TimeSeriesStore>) -> Self {
        Self { store }
    }

    pub fn latest(&self) -> Option<Reading> {
        self.store.latest()
    }

    /// Latest reading in its wire form; an empty history is a valid state
    pub fn current(&self) -> CurrentLevel {
        CurrentLevel::from(self.latest())
    }

    /// At most `limit` of the newest readings, oldest first. `None` selects
    /// every retained reading.
    pub fn window(&self, limit: Option<usize>) -> Vec<Reading> {
        self.store.suffix(limit)
    }
}
