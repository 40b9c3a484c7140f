use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::{AppState, RocScale};

// ---------------------------------------------------------------------------
// Left side panel – run summary and ROC table
// ---------------------------------------------------------------------------

/// Render the left summary panel.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Run");
    ui.separator();

    let Some(output) = &state.output else {
        ui.label("No run loaded.");
        return;
    };

    let (rows, cols) = output.scores.dim();
    let (lo, hi) = output
        .scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    egui::Grid::new("run_summary")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            ui.strong("Target");
            ui.label(&output.target.name);
            ui.end_row();

            ui.strong("Scene");
            ui.label(format!("{} bands, {rows}×{cols}", output.bands));
            ui.end_row();

            ui.strong("Scores");
            ui.label(format!("[{lo:.2}, {hi:.2}]"));
            ui.end_row();

            ui.strong("Thresholds");
            ui.label(output.roc.len().to_string());
            ui.end_row();
        });

    ui.add_space(8.0);
    ui.strong("ROC");
    ui.separator();

    let roc = &output.roc;
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(60.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Threshold");
            });
            header.col(|ui| {
                ui.strong("P(D)");
            });
            header.col(|ui| {
                ui.strong("P(FA)");
            });
        })
        .body(|body| {
            body.rows(18.0, roc.len(), |mut row| {
                let i = row.index();
                row.col(|ui| {
                    ui.label(format!("{}", roc.thresholds[i]));
                });
                row.col(|ui| {
                    ui.label(format!("{:.4}", roc.p_detection[i]));
                });
                row.col(|ui| {
                    ui.label(format!("{:.2e}", roc.p_false_alarm[i]));
                });
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open run config…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.config_path.is_some(), egui::Button::new("Re-run"))
                .clicked()
            {
                state.rerun();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(path) = &state.config_path {
            ui.label(path.display().to_string());
        }

        ui.separator();

        if ui
            .selectable_label(state.roc_scale == RocScale::Semilog, "Semilog P(FA)")
            .clicked()
        {
            state.toggle_roc_scale();
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open run config")
        .add_filter("Run config", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.run_config(path);
    }
}
