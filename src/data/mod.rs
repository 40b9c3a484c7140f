//! Data layer: core types, loading, and export.
//!
//! Architecture:
//! ```text
//!  cube .json/.parquet   library .json/.csv   mask .json/.csv
//!        │                      │                   │
//!        ▼                      ▼                   ▼
//!   ┌──────────────────────────────────────────────────┐
//!   │  loader   parse files → HyperspectralCube,       │
//!   │           SpectralLibrary, GroundTruthMask       │
//!   └──────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   detection (ScoreMap, RocCurve)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  export   │  ROC → .csv, score map → .png
//!   └──────────┘
//! ```

pub mod export;
pub mod loader;
pub mod model;

pub use model::{
    GroundTruthMask, HyperspectralCube, RocCurve, ScoreMap, SpectralLibrary, SpectralSignature,
};
