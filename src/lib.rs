//! MediaSweep - review a remote photo/video library over SSH
//!
//! Walks a media folder on a remote host, lets the user keep or queue each
//! item for deletion, and deletes the queue in one bulk commit. Progress
//! survives restarts.

pub mod commit;
pub mod config;
pub mod console;
pub mod error;
pub mod maintenance;
pub mod media;
pub mod preview;
pub mod remote;
pub mod review;
pub mod sftp;
pub mod ssh;

pub use error::{EngineError, EngineResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub fn run() {
    init_logging();
    tracing::info!("Starting MediaSweep {}", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(console::run()) {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
