mod app;
mod state;
mod ui;

use std::path::PathBuf;

use app::RustySmfApp;
use clap::Parser;
use eframe::egui;

/// Interactive viewer for matched filter score maps and ROC curves.
#[derive(Parser)]
#[command(name = "rusty-smf", version, about)]
struct Cli {
    /// Run config to execute on start-up.
    config: Option<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::init();
    let cli = Cli::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty SMF – Matched Filter Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(RustySmfApp::new(cli.config)))),
    )
}
