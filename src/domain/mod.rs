// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing a training run:
// what a model, a loss, an optimizer and a data partition
// must be able to do, and what a run produces.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// The ml layer implements these traits on top of Burn;
// the tests implement them with tiny in-memory mocks.

// Training / evaluation mode and the train / validation phase
pub mod mode;

// Per-phase metrics and the end-of-run summary
pub mod metrics;

// Immutable, shareable parameter snapshots
pub mod snapshot;

// Core abstractions (traits) that other layers implement
pub mod traits;
