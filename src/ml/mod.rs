// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The Burn-specific model code: the network, the loop that
// trains it and the engine that serves it.
//
// What's in this layer:
//
//   model.rs      — The transformer sequence classifier
//                   • Linear projection of each frame
//                   • Sinusoidal positional encoding
//                   • Stacked encoder blocks (self-attention
//                     + ReLU feed-forward, post-norm)
//                   • Mean pooling over time
//                   • LayerNorm + linear classification head
//
//   trainer.rs    — The training loop
//                   Forward pass, cross-entropy, backward
//                   pass, Adam step, validation accuracy and
//                   best-checkpoint selection per epoch
//
//   inferencer.rs — The inference engine
//                   Loads a checkpoint, resamples the query,
//                   runs the model, returns class probabilities
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Transformer encoder sequence classifier
pub mod model;

/// Training loop with validation and best-checkpoint selection
pub mod trainer;

/// Inference engine and hot-reload handle
pub mod inferencer;
