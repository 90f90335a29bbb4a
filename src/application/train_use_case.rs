// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration     (this layer)
//   Step 2: Read the training manifest     (Layer 4 - data)
//   Step 3: Build the label vocabulary     (Layer 3 - domain)
//   Step 4: Read or split off validation   (Layer 4 - data)
//   Step 5: Open + validate datasets       (Layer 4 - data)
//   Step 6: Save config                    (Layer 6 - infra)
//   Step 7: Run the training loop          (Layer 5 - ml)
//
// Everything that can be wrong with the data (missing files,
// widths, unknown validation labels) fails in step 5, before
// a single batch is trained.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::DeviceKind;
use crate::data::{
    augmentor::{AugmentConfig, Augmentor},
    dataset::SequenceDataset,
    manifest::Manifest,
};
use crate::domain::vocabulary::LabelVocabulary;
use crate::error::ConfigError;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    model::SequenceClassifierConfig,
    trainer::{Trainer, TrainingSummary},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run.
// Serialisable so it can be saved next to the checkpoint and embedded in it.
// Missing JSON fields fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub train_manifest:      PathBuf,
    /// When absent, `val_fraction` of the training rows are held out
    pub val_manifest:        Option<PathBuf>,
    pub val_fraction:        f64,
    pub checkpoint_dir:      PathBuf,
    pub seq_len:             usize,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub lr:                  f64,
    pub weight_decay:        f64,
    pub d_model:             usize,
    pub num_heads:           usize,
    pub num_layers:          usize,
    pub d_ff:                usize,
    pub dropout:             f64,
    pub max_seq_len:         usize,
    pub augment:             bool,
    pub mirror_probability:  f64,
    pub jitter_std:          f32,
    pub coords_per_landmark: usize,
    pub num_workers:         usize,
    pub seed:                u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let aug = AugmentConfig::default();
        Self {
            train_manifest:      PathBuf::from("data/train.csv"),
            val_manifest:        None,
            val_fraction:        0.2,
            checkpoint_dir:      PathBuf::from("checkpoints"),
            seq_len:             64,
            batch_size:          16,
            epochs:              35,
            lr:                  1e-3,
            weight_decay:        1e-5,
            d_model:             192,
            num_heads:           6,
            num_layers:          4,
            d_ff:                512,
            dropout:             0.1,
            max_seq_len:         1024,
            augment:             true,
            mirror_probability:  aug.mirror_probability,
            jitter_std:          aug.jitter_std,
            coords_per_landmark: aug.coords_per_landmark,
            num_workers:         2,
            seed:                42,
        }
    }
}

impl TrainConfig {
    /// Load a config from JSON. Fields not present keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn augment_config(&self) -> AugmentConfig {
        AugmentConfig {
            mirror_probability:  self.mirror_probability,
            jitter_std:          self.jitter_std,
            coords_per_landmark: self.coords_per_landmark,
        }
    }

    /// Classifier hyperparameters for a given input width and class count.
    pub fn model_config(&self, input_width: usize, num_classes: usize) -> SequenceClassifierConfig {
        SequenceClassifierConfig::new(input_width, num_classes)
            .with_d_model(self.d_model)
            .with_num_heads(self.num_heads)
            .with_num_layers(self.num_layers)
            .with_d_ff(self.d_ff)
            .with_dropout(self.dropout)
            .with_max_seq_len(self.max_seq_len)
    }

    /// Reject settings that would only fail later, mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seq_len == 0 {
            return Err(ConfigError::invalid("seq_len", "must be at least 1"));
        }
        if self.seq_len > self.max_seq_len {
            return Err(ConfigError::invalid(
                "seq_len",
                format!("{} exceeds max_seq_len {}", self.seq_len, self.max_seq_len),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size", "must be at least 1"));
        }
        if self.epochs == 0 {
            return Err(ConfigError::invalid("epochs", "must be at least 1"));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(ConfigError::invalid("lr", format!("{} is not a positive number", self.lr)));
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return Err(ConfigError::invalid("weight_decay", "must be zero or positive"));
        }
        if self.val_manifest.is_none() && !(self.val_fraction > 0.0 && self.val_fraction < 1.0) {
            return Err(ConfigError::invalid(
                "val_fraction",
                format!("{} is not in (0, 1)", self.val_fraction),
            ));
        }
        if self.num_workers == 0 {
            return Err(ConfigError::invalid("num_workers", "must be at least 1"));
        }

        // Width and class count are placeholders; only the hyperparameters are checked here.
        self.model_config(1, 1).validate()?;
        Augmentor::new(self.augment_config())?;
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on the chosen device.
    pub fn execute(&self, device: DeviceKind) -> Result<TrainingSummary> {
        match device {
            DeviceKind::Wgpu => {
                let device = WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                self.execute_on::<Autodiff<Wgpu>>(device)
            }
            DeviceKind::Cpu => {
                tracing::info!("Using NdArray CPU backend");
                self.execute_on::<Autodiff<NdArray>>(NdArrayDevice::default())
            }
        }
    }

    /// Execute the full training pipeline end to end on backend `B`.
    pub fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainingSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate configuration ───────────────────────────────────
        cfg.validate().context("Invalid training configuration")?;

        // ── Step 2: Read manifests ───────────────────────────────────────────
        let train_manifest = Manifest::read(&cfg.train_manifest)
            .with_context(|| format!("Cannot read training manifest '{}'", cfg.train_manifest.display()))?;

        // ── Step 3: Label vocabulary from the training manifest ──────────────
        // Built before any split so a held-out row never carries an unseen label.
        let vocabulary = LabelVocabulary::from_labels(train_manifest.labels());
        tracing::info!("Vocabulary: {} classes", vocabulary.len());

        // ── Step 4: Validation manifest, or a held-out split ─────────────────
        let (train_manifest, val_manifest) = match &cfg.val_manifest {
            Some(path) => {
                let val = Manifest::read(path)
                    .with_context(|| format!("Cannot read validation manifest '{}'", path.display()))?;
                (train_manifest, val)
            }
            None => {
                let (train, val) = train_manifest.split(1.0 - cfg.val_fraction, cfg.seed);
                if train.is_empty() || val.is_empty() {
                    anyhow::bail!(
                        "Training manifest has too few rows ({}) to hold out a validation set",
                        train.len() + val.len()
                    );
                }
                (train, val)
            }
        };
        tracing::info!(
            "Split: {} train, {} validation",
            train_manifest.len(),
            val_manifest.len()
        );

        // ── Step 5: Load and check every sample ──────────────────────────────
        let mut train_set = SequenceDataset::open(&train_manifest, &vocabulary, cfg.seq_len, None)
            .context("Cannot build training dataset")?;
        let val_set = SequenceDataset::open(
            &val_manifest,
            &vocabulary,
            cfg.seq_len,
            Some(train_set.input_width()),
        )
        .context("Cannot build validation dataset")?;

        if cfg.augment {
            train_set = train_set.with_augmentation(Augmentor::new(cfg.augment_config())?);
        }

        // ── Step 6: Save config next to the checkpoint ───────────────────────
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir);
        checkpoints.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)
            .with_context(|| format!("Cannot create metrics log in '{}'", cfg.checkpoint_dir.display()))?;

        // ── Step 7: Train ────────────────────────────────────────────────────
        let mut trainer = Trainer::<B>::new(cfg.clone(), device, checkpoints, metrics);
        let summary = trainer.fit(&vocabulary, train_set, val_set)?;
        Ok(summary)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_seq_len_cannot_exceed_positional_table() {
        let cfg = TrainConfig { seq_len: 2048, ..TrainConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidValue { field: "seq_len", .. })));
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let bad = [
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { lr: -1.0, ..TrainConfig::default() },
            TrainConfig { num_heads: 5, ..TrainConfig::default() },
            TrainConfig { val_fraction: 1.0, ..TrainConfig::default() },
            TrainConfig { mirror_probability: 2.0, ..TrainConfig::default() },
            TrainConfig { jitter_std: -0.5, ..TrainConfig::default() },
            TrainConfig { d_model: 7, num_heads: 1, ..TrainConfig::default() },
            TrainConfig { max_seq_len: 20_000, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?} should be rejected");
        }
    }

    #[test]
    fn test_val_fraction_ignored_with_val_manifest() {
        let cfg = TrainConfig {
            val_manifest: Some("val.csv".into()),
            val_fraction: 0.0,
            ..TrainConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_json_overrides_only_given_fields() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{ "epochs": 3, "seq_len": 20 }"#).unwrap();

        let cfg = TrainConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.seq_len, 20);
        assert_eq!(cfg.d_model, 192);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, "{ epochs: ").unwrap();
        assert!(matches!(TrainConfig::from_json_file(&path), Err(ConfigError::Parse { .. })));
    }
}
