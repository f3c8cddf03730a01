// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// The training loop and the visualization routine, plus the
// Burn classifier they drive.
//
//   trainer.rs    — Epoch/phase loop, best-snapshot tracking
//                   Written only against the domain traits,
//                   so it runs over Burn or over test mocks
//
//   schedule.rs   — Learning-rate schedules (step decay,
//                   constant), advanced once per epoch
//
//   visualize.rs  — Evaluation-mode predictions handed to a
//                   render sink; restores the model's mode
//
//   model.rs      — Residual CNN image classifier (Burn)
//                   Backbone + dropout + linear head
//
//   classifier.rs — Burn adapters: Model, Scores, Criterion,
//                   Loss and Optimizer implementations
//
//   runner.rs     — Backend selection; builds partitions, the
//                   network and the optimiser, then trains or
//                   visualizes and saves the result
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            He et al. (2016) Deep Residual Learning

/// Generic train + validation loop
pub mod trainer;

/// Per-epoch learning-rate schedules
pub mod schedule;

/// Prediction rendering over the validation partition
pub mod visualize;

/// Residual CNN architecture
pub mod model;

/// Burn implementations of the training-loop traits
pub mod classifier;

/// Wgpu / NdArray training and visualization runs
pub mod runner;
