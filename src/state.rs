use std::path::PathBuf;

use eframe::egui::{self, ColorImage, TextureHandle};
use rusty_smf::color::ScoreRamp;
use rusty_smf::workflow::{self, RunConfig, RunOutput};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Axis used for P(False Alarm) in the ROC plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RocScale {
    /// Natural log of P_fa; thresholds with P_fa = 0 are not drawn.
    #[default]
    Semilog,
    Linear,
}

/// The full UI state, independent of layout.
#[derive(Default)]
pub struct AppState {
    /// Run config the current output came from.
    pub config_path: Option<PathBuf>,

    /// Result of the last successful run.
    pub output: Option<RunOutput>,

    pub roc_scale: RocScale,

    /// Score map uploaded to the GPU; dropped whenever `output` changes.
    score_texture: Option<TextureHandle>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a finished run.
    pub fn set_output(&mut self, output: RunOutput) {
        self.output = Some(output);
        self.score_texture = None;
        self.status_message = None;
    }

    /// Load `path` as a run config and execute it.
    pub fn run_config(&mut self, path: PathBuf) {
        match RunConfig::load(&path).and_then(|config| workflow::run(&config)) {
            Ok(output) => {
                log::info!(
                    "Ran {}: target '{}', {} ROC points",
                    path.display(),
                    output.target.name,
                    output.roc.len()
                );
                self.set_output(output);
            }
            Err(e) => {
                log::error!("Run failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
        self.config_path = Some(path);
    }

    /// Re-execute the current config, e.g. after its inputs changed on disk.
    pub fn rerun(&mut self) {
        if let Some(path) = self.config_path.clone() {
            self.run_config(path);
        }
    }

    pub fn toggle_roc_scale(&mut self) {
        self.roc_scale = match self.roc_scale {
            RocScale::Semilog => RocScale::Linear,
            RocScale::Linear => RocScale::Semilog,
        };
    }

    /// Score map rendered through the colour ramp, one texel per pixel.
    pub fn score_image(&self) -> Option<ColorImage> {
        let output = self.output.as_ref()?;
        let (rows, cols) = output.scores.dim();
        let ramp = ScoreRamp::from_scores(&output.scores);
        Some(ColorImage::from_rgb([cols, rows], &ramp.rgb_bytes(&output.scores)))
    }

    /// Cached texture of [`Self::score_image`], uploaded on first use.
    pub fn score_texture(&mut self, ctx: &egui::Context) -> Option<&TextureHandle> {
        if self.score_texture.is_none() {
            let image = self.score_image()?;
            self.score_texture = Some(ctx.load_texture("score_map", image, egui::TextureOptions::NEAREST));
        }
        self.score_texture.as_ref()
    }
}
