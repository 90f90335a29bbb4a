// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any specific
// business layer:
//
//   checkpoint.rs — Saving and loading the trained recognizer.
//                   One self-describing file holds the weights,
//                   the label order, the input width, the
//                   sequence length and the architecture, so
//                   inference needs nothing else.
//
//   metrics.rs    — Training metrics logging.
//                   Writes epoch-level loss and accuracy to a
//                   CSV file for later plotting.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Self-describing checkpoint bundle
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
