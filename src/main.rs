mod api;
mod config;
mod mappings;
mod models;
mod monitor;
mod utils;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::sync::Arc;

use api::HttpApi;
use config::MonitorConfig;
use models::{ConnectionStatus, Setpoint, Source};
use monitor::{Poller, SetpointSync};
use utils::format_timestamp;

#[derive(Parser)]
#[command(name = "autogrow-monitor")]
#[command(about = "Grow room climate monitor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the latest reading until interrupted (default)
    Watch,

    /// Show the current setpoints, or update them
    Setpoint {
        /// New temperature target in °C
        #[arg(short = 't', long = "temp", requires = "humidity")]
        temperature: Option<f64>,
        /// New humidity target in %
        #[arg(short = 'u', long = "hum", requires = "temperature")]
        humidity: Option<f64>,
    },

    /// Summarize the device/sensor/room mapping table
    Mappings,
}

async fn watch(config: MonitorConfig, api: Arc<HttpApi>) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting climate monitor for room {}", config.room_name);

    let mut setpoints = SetpointSync::new(Arc::clone(&api), config.status_message_ttl);
    // Failure is already logged; the defaults stay in effect
    let _ = setpoints.fetch_setpoint().await;

    let poller = Poller::start(api, config.poll_interval);
    let mut state = poller.subscribe();
    info!("Connection status: {:?}", poller.current().status);

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        let _ = tx.send(());
    });

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    warn!("Poller stopped publishing");
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                let target = setpoints.cached();
                match (snapshot.status, snapshot.current.source) {
                    (ConnectionStatus::Connected, Source::Live) => info!(
                        "{}: {:.1}°C (target {:.1}), {:.0}% (target {:.0}), VPD {:.2} kPa, updated {}",
                        config.room_name,
                        snapshot.current.temperature,
                        target.temperature_target,
                        snapshot.current.humidity,
                        target.humidity_target,
                        snapshot.current.vpd,
                        snapshot
                            .current
                            .timestamp
                            .as_deref()
                            .map(format_timestamp)
                            .unwrap_or_else(|| "-".into())
                    ),
                    (status, _) => {
                        warn!(
                            "{}: {:?}, showing placeholder {:.1}°C / {:.0}% / VPD {:.2}",
                            config.room_name,
                            status,
                            snapshot.current.temperature,
                            snapshot.current.humidity,
                            snapshot.current.vpd
                        );
                        if let Some(good) = &snapshot.last_good {
                            info!(
                                "  Last live reading: {:.1}°C, {:.0}%, VPD {:.2} kPa",
                                good.temperature, good.humidity, good.vpd
                            );
                        }
                    }
                }
            }
            _ = &mut rx => {
                info!("Program terminated by user. Exiting gracefully.");
                break;
            }
        }
    }

    poller.stop().await;
    Ok(())
}

async fn setpoint(
    config: MonitorConfig,
    api: Arc<HttpApi>,
    update: Option<Setpoint>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut sync = SetpointSync::new(api, config.status_message_ttl);

    let current = sync.fetch_setpoint().await?;
    println!(
        "Temperature target: {:.1}°C\nHumidity target:    {:.0}%",
        current.temperature_target, current.humidity_target
    );

    if let Some(update) = update {
        sync.begin_edit();
        let result = sync.save_edit(update).await;
        if let Some(message) = sync.message() {
            println!("{}", message);
        }
        if result.is_err() && sync.is_editing() {
            let rejected = sync.draft();
            sync.cancel_edit();
            warn!(
                "Discarded draft {:.1}°C / {:.0}%, setpoints remain {:.1}°C / {:.0}%",
                rejected.temperature_target,
                rejected.humidity_target,
                sync.cached().temperature_target,
                sync.cached().humidity_target
            );
        }
        result?;
    }

    Ok(())
}

fn print_mappings(config: &MonitorConfig) {
    let summary = mappings::summarize(&config.mappings);

    println!("Total entries:    {}", summary.total_entries);
    println!("Active sensors:   {}", summary.active_sensors);
    println!("Unique devices:   {}", summary.unique_devices);
    println!("Rooms configured: {}", summary.rooms_configured);
    for (room, sensors) in &summary.rooms {
        println!("  {}: {}/{} sensors active", room, sensors.active, sensors.total);
    }
    for entry in &config.mappings {
        println!(
            "  [{}] {} / {} -> {} {}",
            entry.id,
            entry.device_id,
            entry.sensor_id,
            entry.room_id,
            if entry.active { "" } else { "(inactive)" }
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = match MonitorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let api = Arc::new(HttpApi::new(&config.api_base_url, config.request_timeout)?);

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => watch(config, api).await,
        Commands::Setpoint {
            temperature,
            humidity,
        } => {
            let update = temperature.zip(humidity).map(|(t, h)| Setpoint {
                temperature_target: t,
                humidity_target: h,
            });
            setpoint(config, api, update).await
        }
        Commands::Mappings => {
            print_mappings(&config);
            Ok(())
        }
    }
}
