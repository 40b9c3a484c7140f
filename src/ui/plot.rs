use eframe::egui::{self, Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::state::{AppState, RocScale};

// ---------------------------------------------------------------------------
// Score map (left column)
// ---------------------------------------------------------------------------

/// Render the matched filter score map; brighter red is a stronger match.
pub fn score_map(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Score map");

    let ctx = ui.ctx().clone();
    let Some(texture) = state.score_texture(&ctx) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Open a run config  (File → Open run config…)");
        });
        return;
    };

    ui.add(egui::Image::new((texture.id(), texture.size_vec2())).shrink_to_fit());
}

// ---------------------------------------------------------------------------
// ROC curve (right column)
// ---------------------------------------------------------------------------

/// Render P(Detection) against P(False Alarm).
pub fn roc_plot(ui: &mut Ui, state: &AppState) {
    ui.heading("ROC");

    let Some(output) = &state.output else {
        return;
    };

    let (points, x_label) = match state.roc_scale {
        RocScale::Semilog => (output.roc.semilog_points(), "ln P(False Alarm)"),
        RocScale::Linear => (output.roc.linear_points(), "P(False Alarm)"),
    };

    Plot::new("roc_plot")
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label("P(Detection)")
        .include_y(0.0)
        .include_y(1.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let line = Line::new(PlotPoints::from(points))
                .name(&output.target.name)
                .color(Color32::LIGHT_BLUE)
                .width(1.5);
            plot_ui.line(line);
        });
}
