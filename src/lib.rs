#![warn(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Cluster indices and counts fit their targets
    clippy::cast_precision_loss,      // Counts are converted to f32/f64 for means and ratios
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. KMeansError in the kmeans crate
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod domain;
pub mod engine;
pub mod io;

// Re-export main types for easy access
pub use app::Config;
pub use domain::{Clustering, KMeansError, ObjectSet, Termination};
pub use engine::{EngineConfig, KMeans, Strategy};
