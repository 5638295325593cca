mod app;
mod chat;
mod config;
mod dashboard;
mod error;
mod event;
mod persistence;
mod theme;
mod widgets;

use app::DashboardApp;
use chat::responder::Responder;
use config::{AppConfig, StorageKind};
use eframe::egui;
use persistence::backend::{FileStorage, MemoryStorage, StorageBackend};
use persistence::gateway::PersistenceGateway;
use std::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config() -> AppConfig {
    let Some(path) = AppConfig::config_path() else {
        init_tracing(&AppConfig::default().logging.level);
        return AppConfig::default();
    };
    match AppConfig::load_from(&path) {
        Ok(config) => {
            init_tracing(&config.logging.level);
            info!(path = %path.display(), "configuration loaded");
            config
        }
        Err(err) => {
            let config = AppConfig::default();
            init_tracing(&config.logging.level);
            warn!(error = %err, "using default configuration");
            config
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config();
    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("gridboard-runtime")
        .build()?;
    let responder = Responder::new(runtime.handle().clone(), tx, config.chat.reply_delay());

    let gateway = if config.persistence.enabled {
        let storage: Box<dyn StorageBackend> = match config.persistence.backend {
            StorageKind::File => {
                let storage = FileStorage::new(config.persistence.storage_path());
                info!(dir = %storage.root_dir().display(), "using file storage");
                Box::new(storage)
            }
            StorageKind::Memory => {
                info!("using in-memory storage; the dashboard is kept until exit");
                Box::new(MemoryStorage::new())
            }
        };
        PersistenceGateway::new(storage, config.persistence.storage_key.clone())
    } else {
        info!("persistence disabled by configuration");
        PersistenceGateway::disabled()
    };

    let app = DashboardApp::new(rx, responder, &config, gateway);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Gridboard",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
