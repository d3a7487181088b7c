use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use fern::colors::{Color, ColoredLevelConfig};
use log::{info, warn};

use tank_server::config::{self, Config};
use tank_server::{data_handler, dummy_data, web, Services};

fn setup_logging(level: log::LevelFilter) -> anyhow::Result<()> {
    let colors = ColoredLevelConfig::default()
        .trace(Color::BrightBlue)
        .debug(Color::Cyan)
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}][{}]{}",
                chrono::Local::now().format("%H:%M:%S"),
                colors.color(record.level()),
                message
            ))
        })
        .level(level)
        .level_for("simple_server", log::LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let (config, config_missing) = if config_path.exists() {
        let config = config::read_config(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        (config, false)
    } else {
        (Config::default(), true)
    };

    setup_logging(config.log_filter()?)?;
    if config_missing {
        warn!("No config at {}, using defaults", config_path.display());
    }

    let services = Arc::new(Services::new(config.capacity, config.parameters));
    info!(
        "Keeping up to {} readings, initial parameters {:?}",
        config.capacity,
        services.parameters.get()
    );

    if config.simulation.enabled {
        info!("Simulating tank sensor every {}s", config.simulation.interval_secs);
        let (tx, rx) = channel();
        dummy_data::sin_provider(tx, config.simulation.clone());
        data_handler::run_data_handler(rx, services.ingestion.clone());
    }

    let server = web::run_server(
        config.http_address.clone(),
        config.http_port,
        Arc::clone(&services),
    );

    server
        .join()
        .map_err(|_| anyhow!("http server thread panicked"))
}
