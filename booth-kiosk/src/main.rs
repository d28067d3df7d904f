//! Photo booth kiosk service - main entry point
//!
//! Wires the camera, segmentation client, delivery transports, and HTTP
//! surface together and serves until shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use booth_common::config::{resolve_data_folder, BoothConfig};
use booth_common::events::ChannelKind;
use booth_kiosk::camera::SimulatedCamera;
use booth_kiosk::delivery::{DeliveryDispatcher, ResendEmailTransport, TwilioSmsTransport};
use booth_kiosk::engine::BoothEngine;
use booth_kiosk::frame::{CAMERA_HEIGHT, CAMERA_WIDTH};
use booth_kiosk::segmentation::{HttpMaskInference, MaskInference};
use booth_kiosk::session::CaptureCadence;
use booth_kiosk::state::SharedState;
use booth_kiosk::{create_router, AppState};

/// Command-line arguments for booth-kiosk
#[derive(Parser, Debug)]
#[command(name = "booth-kiosk")]
#[command(about = "Unattended photo booth kiosk service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5470", env = "BOOTH_PORT")]
    port: u16,

    /// Folder for strips and other kiosk data
    #[arg(short, long, env = "BOOTH_DATA_FOLDER")]
    data_folder: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "BOOTH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booth_kiosk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting photo booth kiosk on port {}", args.port);

    let config = BoothConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let data_folder = resolve_data_folder(args.data_folder.as_deref(), "BOOTH_DATA_FOLDER");
    info!("Data folder: {}", data_folder.display());
    tokio::fs::create_dir_all(&data_folder)
        .await
        .context("Failed to create data folder")?;

    let state = Arc::new(SharedState::new());

    let mut dispatcher = DeliveryDispatcher::new(Arc::clone(&state));
    if config.email.api_key.is_empty() {
        warn!("Email API key not configured, email delivery disabled");
    } else {
        dispatcher.register_transport(Arc::new(
            ResendEmailTransport::new(config.email.clone())
                .context("Failed to build email transport")?,
        ));
        info!("Email delivery enabled");
    }
    if config.sms.is_configured() {
        dispatcher.register_transport(Arc::new(
            TwilioSmsTransport::new(config.sms.clone())
                .context("Failed to build sms transport")?,
        ));
        info!("SMS delivery enabled");
    } else {
        warn!("SMS credentials not configured, sms delivery disabled");
    }
    let has_email = dispatcher.has_transport(ChannelKind::Email);
    let has_sms = dispatcher.has_transport(ChannelKind::Sms);
    if !has_email && !has_sms {
        warn!("No delivery transport configured; strips will only be saved locally");
    }

    let mask_inference: Option<Arc<dyn MaskInference>> = match &config.segmentation.endpoint {
        Some(endpoint) => {
            info!("Segmentation endpoint: {}", endpoint);
            Some(Arc::new(
                HttpMaskInference::new(endpoint, config.segmentation.timeout_ms)
                    .context("Failed to build segmentation client")?,
            ))
        }
        None => {
            info!("No segmentation endpoint configured, backdrop matting will use the fallback blend");
            None
        }
    };

    let engine = Arc::new(BoothEngine::new(
        config,
        data_folder,
        state,
        Arc::new(SimulatedCamera::new(CAMERA_WIDTH, CAMERA_HEIGHT)),
        mask_inference,
        Arc::new(dispatcher),
        CaptureCadence::default(),
    ));

    let app = create_router(AppState {
        engine,
        port: args.port,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
