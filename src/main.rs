//! Markov Flow
//!
//! A desktop app that animates probability mass flowing through a Markov
//! chain laid out as a force-directed graph.

mod animator;
mod app;
mod chain;
mod error;
mod graph;
mod render;
mod session;
mod settings;
mod source;
mod theme;

use eframe::egui;
use error::{SourceError, StartupError};
use session::Session;
use settings::Settings;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), StartupError> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load();

    // A chain that can't be fetched or parsed aborts startup
    let session = source::fetch_chain(&settings.chain_source)
        .and_then(|(doc, text)| Ok(Session::new(&doc, text, &settings)?))
        .map_err(|e: SourceError| {
            error!(source = %settings.chain_source, error = %e, "failed to load initial chain");
            e
        })?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.width + 360.0, settings.height + 80.0])
            .with_title("Markov Flow"),
        ..Default::default()
    };

    eframe::run_native(
        "Markov Flow",
        options,
        Box::new(move |_cc| Ok(Box::new(app::MarkovApp::new(session, &settings)))),
    )?;
    Ok(())
}
