use std::sync::mpsc::Receiver;
use std::thread;

use log::{info, warn};

use crate::ingestion::IngestionService;

/// Feeds every value arriving on `rx` into the reading history. Stops once all
/// senders are gone.
pub fn run_data_handler(rx: Receiver<f64>, ingestion: IngestionService) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for value in rx {
            if let Err(e) = ingestion.ingest(value) {
                warn!("Rejected simulated reading {}: {}", value, e);
            }
        }
        info!("Data handler stopped");
    })
}
