//! Water tank telemetry server.
//!
//! Keeps a bounded history of tank level readings and the control parameters
//! for the tank's PID controller, and serves both to dashboards over HTTP.

use std::sync::Arc;

pub mod config;
pub mod constants;
pub mod data_handler;
pub mod dummy_data;
pub mod error;
pub mod ingestion;
pub mod parameter_store;
pub mod query;
pub mod ring_buffer;
pub mod time_series;
pub mod types;
pub mod web;

use crate::ingestion::IngestionService;
use crate::parameter_store::ParameterStore;
use crate::query::QueryService;
use crate::time_series::TimeSeriesStore;
use crate::types::Parameters;

/// The stores and the services built on them, shared by all request handlers
pub struct Services {
    pub parameters: Arc<ParameterStore>,
    pub readings: Arc<TimeSeriesStore>,
    pub query: QueryService,
    pub ingestion: IngestionService,
}

impl Services {
    pub fn new(capacity: usize, initial: Parameters) -> Self {
        let parameters = Arc::new(ParameterStore::new(initial));
        let readings = Arc::new(TimeSeriesStore::new(capacity, Arc::clone(&parameters)));

        Services {
            query: QueryService::new(Arc::clone(&readings)),
            ingestion: IngestionService::new(Arc::clone(&readings)),
            parameters,
            readings,
        }
    }
}
