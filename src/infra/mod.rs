// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the concerns that touch the outside world:
//
//   checkpoint.rs — Saving and loading model weights
//                   Uses Burn's CompactRecorder for the best
//                   model and its backbone. Also saves/loads
//                   TrainConfig and best.json so `visualize`
//                   can rebuild the model and its classes.
//
//   metrics.rs    — Training metrics logging
//                   Writes one CSV row per phase per epoch.
//
//   reporter.rs   — Console progress in the tutorial layout
//
//   render.rs     — Where visualized predictions go: log
//                   lines or PNG files
//
// metrics.rs and reporter.rs are TrainingObservers; render.rs
// holds RenderSinks. The ml layer only sees those traits.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Console progress output
pub mod reporter;

/// Prediction render sinks
pub mod render;
