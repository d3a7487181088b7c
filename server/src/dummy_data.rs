use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use log::debug;

use crate::config::SimulationConfig;

/// Sends a sine wave of water levels into `tx` until the receiving end is dropped
pub fn sin_provider(tx: Sender<f64>, config: SimulationConfig) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut t: f64 = 0.;
        loop {
            let level = sine_level(t, config.amplitude, config.bias);
            if tx.send(level).is_err() {
                debug!("Reading receiver gone, stopping simulated sensor");
                break;
            }

            t += 0.3;
            thread::sleep(Duration::from_secs(config.interval_secs));
        }
    })
}

/// Clamped to the range a tank level sensor can report
fn sine_level(t: f64, amplitude: f64, bias: f64) -> f64 {
    (t.sin() * amplitude + bias).max(0.).min(100.)
}
