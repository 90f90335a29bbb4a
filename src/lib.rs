#![recursion_limit = "256"]

//! Keypoint-sequence sign recognizer.
//!
//! Layers, outermost first:
//!
//! | Layer | Module        | Role                                            |
//! |-------|---------------|-------------------------------------------------|
//! | 1     | `cli`         | clap commands `train`, `predict`, `inspect`     |
//! | 2     | `application` | use cases wiring the layers below together      |
//! | 3     | `domain`      | keypoint sequences, label vocabulary            |
//! | 4     | `data`        | manifests, arrays, resampling, augmentation     |
//! | 5     | `ml`          | Burn classifier, trainer, inference engine      |
//! | 6     | `infra`       | checkpoint bundle, metrics log                  |

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;
