// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from image files on disk to tensor batches.
//
//   data_dir/{train,val}/<class>/*.jpg
//       │
//       ▼
//   ImageFolder       → scans class folders, validates files
//       │
//       ▼
//   Preprocessor      → resize, center crop, normalise
//       │
//       ▼
//   ImageBatcher      → stacks samples into [N, 3, H, W] tensors
//       │
//       ▼
//   LoaderPartition   → Burn DataLoader behind the Partition trait
//
// When no val/ folder exists, the splitter carves a validation
// set out of the training samples.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Implements Burn's Batcher trait to create image batches
pub mod batcher;

/// Class-per-folder image dataset
pub mod dataset;

/// DataLoader-backed partitions for the training loop
pub mod partition;

/// Resizing, cropping and normalisation
pub mod preprocessor;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
