// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{crate_version, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stripctl::cancel::CancelHandle;
use stripctl::config;
use stripctl::controller::{keyboard, LedController, Runner};
use stripctl::effects::EffectKind;
use stripctl::transport;

/// The number of keyboard events that can queue up between cycles.
const EVENT_QUEUE_SIZE: usize = 10;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A serial controller for addressable LED strips."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will connect to the strip and repeat the active effect until interrupted.
    Start {
        /// The path to the controller config.
        config_path: String,
        /// The effect to start with. Overrides the config.
        #[arg(short, long)]
        effect: Option<String>,
    },
    /// Lists the available serial ports.
    Ports {},
    /// Verifies a controller config and prints it.
    Verify {
        /// The path to the controller config.
        config_path: String,
    },
}

/// Installs the log subscriber. RUST_LOG wins over the configured level.
fn init_logging(config: Option<&config::Controller>) -> Result<(), Box<dyn Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match config {
            Some(config) => EnvFilter::new(config.log_level()?.to_string()),
            None => EnvFilter::new(config::DEFAULT_LOG_LEVEL.to_string()),
        },
    };

    match config.and_then(|config| config.log_file()) {
        Some(log_file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(File::options().create(true).append(true).open(log_file)?))
            .init(),
        None => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

async fn start(config_path: &Path, effect: Option<String>) -> Result<(), Box<dyn Error>> {
    let config = config::load(config_path)?;
    let effect = effect.map(|effect| effect.parse::<EffectKind>()).transpose()?;
    init_logging(Some(&config))?;

    info!(
        port = config.port(),
        baud_rate = config.baud_rate(),
        timeout = format!("{:?}", config.timeout()?),
        leds = config.leds(),
        "Starting strip controller."
    );

    let transport = transport::open(&config)?;
    let mut controller = LedController::new(transport, &config)?;
    if let Some(effect) = effect {
        controller.set_active_command(effect);
    }

    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_SIZE);
    let cancel_handle = CancelHandle::new();
    let runner = Runner::start(
        controller,
        config.tick_interval()?,
        events_rx,
        cancel_handle.clone(),
    )?;
    let _keyboard = keyboard::Driver::new().monitor_events(events_tx)?;

    let quit = {
        let cancel_handle = cancel_handle.clone();
        tokio::task::spawn_blocking(move || cancel_handle.wait())
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Interrupted.");
        }
        _ = quit => {}
    }

    runner.stop()?.shutdown();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            config_path,
            effect,
        } => start(&PathBuf::from(config_path), effect).await?,
        Commands::Ports {} => {
            init_logging(None)?;
            let ports = transport::list_ports()?;

            if ports.is_empty() {
                println!("No serial ports found.");
                return Ok(());
            }

            println!("Ports:");
            for port in ports {
                println!("- {}", port);
            }
        }
        Commands::Verify { config_path } => {
            init_logging(None)?;
            let config = config::load(&PathBuf::from(config_path))?;
            println!("{}", config);
        }
    }

    Ok(())
}
