use std::path::PathBuf;

use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RustySmfApp {
    pub state: AppState,
}

impl RustySmfApp {
    /// Start the viewer, running `config` straight away when given.
    pub fn new(config: Option<PathBuf>) -> Self {
        let mut app = Self::default();
        if let Some(path) = config {
            app.state.run_config(path);
        }
        app
    }
}

impl eframe::App for RustySmfApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: run summary and ROC table ----
        egui::SidePanel::left("summary_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state);
            });

        // ---- Central panel: score map | ROC curve ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |columns| {
                plot::score_map(&mut columns[0], &mut self.state);
                plot::roc_plot(&mut columns[1], &self.state);
            });
        });
    }
}
