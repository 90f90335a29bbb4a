// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Per epoch:
//   1. shuffled pass over the training batches
//        forward → cross-entropy → backward → Adam step
//        (loss averaged per sample, train accuracy counted)
//   2. model.valid() → the same weights on the inner backend,
//      dropout off, no gradients; accuracy over the whole
//      validation set
//   3. if val accuracy beats the best so far, overwrite the
//      checkpoint with this model
//
// Backend notes:
//   - Training runs on B (an AutodiffBackend) for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - so the validation batcher must build InnerBackend tensors
//   - argmax(1) returns [batch, 1]; flatten before .equal()
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::path::PathBuf;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{SequenceBatch, SequenceBatcher},
    dataset::SequenceDataset,
};
use crate::domain::vocabulary::LabelVocabulary;
use crate::error::TrainError;
use crate::infra::{
    checkpoint::{CheckpointManager, CheckpointMetadata},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::{Architecture, SequenceClassifier};

// ─── Best checkpoint state ────────────────────────────────────────────────────
/// The best validation accuracy seen so far and where its model was written.
/// `accuracy` is `None` until the first epoch finishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BestCheckpoint {
    pub accuracy: Option<f64>,
    pub epoch:    Option<usize>,
    pub path:     Option<PathBuf>,
}

impl BestCheckpoint {
    /// Strictly better than the best so far (always true before the first epoch).
    pub fn is_beaten_by(&self, accuracy: f64) -> bool {
        self.accuracy.map_or(true, |best| accuracy > best)
    }

    fn record(&mut self, accuracy: f64, epoch: usize, path: PathBuf) {
        self.accuracy = Some(accuracy);
        self.epoch    = Some(epoch);
        self.path     = Some(path);
    }
}

/// What a finished run reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub epochs_run:       usize,
    pub best:             BestCheckpoint,
    pub final_train_loss: f64,
    pub final_train_acc:  f64,
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer<B: AutodiffBackend> {
    config:      TrainConfig,
    device:      B::Device,
    checkpoints: CheckpointManager,
    metrics:     MetricsLogger,
    best:        BestCheckpoint,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(
        config:      TrainConfig,
        device:      B::Device,
        checkpoints: CheckpointManager,
        metrics:     MetricsLogger,
    ) -> Self {
        Self { config, device, checkpoints, metrics, best: BestCheckpoint::default() }
    }

    /// Train for the configured number of epochs, keeping the checkpoint
    /// of the epoch with the highest validation accuracy.
    pub fn fit(
        &mut self,
        vocabulary: &LabelVocabulary,
        train_set:  SequenceDataset,
        val_set:    SequenceDataset,
    ) -> Result<TrainingSummary, TrainError> {
        if train_set.sample_count() == 0 {
            return Err(TrainError::EmptyDataset("train"));
        }
        if val_set.sample_count() == 0 {
            return Err(TrainError::EmptyDataset("validation"));
        }

        let cfg         = self.config.clone();
        let input_width = train_set.input_width();
        let seq_len     = train_set.seq_len();

        // ── Build model ───────────────────────────────────────────────────────
        let model_cfg = cfg.model_config(input_width, vocabulary.len());
        model_cfg.validate()?;
        let mut model: SequenceClassifier<B> = model_cfg.init(&self.device);
        let architecture = Architecture::from_config(&model_cfg);
        tracing::info!(
            "Model ready: {} layers, d_model={}, input_width={}, classes={}",
            model_cfg.num_layers,
            model_cfg.d_model,
            input_width,
            vocabulary.len(),
        );

        // ── Adam optimiser with L2 weight decay ───────────────────────────────
        let mut optim = adam_config(&cfg).init();
        let loss_fn = CrossEntropyLossConfig::new().init(&self.device);

        // ── Training data loader (AutodiffBackend) ────────────────────────────
        // The shuffle RNG is seeded once and advanced every epoch,
        // so batch order differs between epochs but is reproducible.
        let train_loader = DataLoaderBuilder::new(SequenceBatcher::<B>::new(self.device.clone()))
            .batch_size(cfg.batch_size)
            .shuffle(cfg.seed)
            .num_workers(cfg.num_workers)
            .build(train_set);

        // ── Validation data loader (InnerBackend — no autodiff overhead) ──────
        let val_loader = DataLoaderBuilder::new(SequenceBatcher::<B::InnerBackend>::new(self.device.clone()))
            .batch_size(cfg.batch_size * 2)
            .num_workers(cfg.num_workers)
            .build(val_set);

        let mut last = (f64::NAN, 0.0f64);

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 1..=cfg.epochs {

            // ── Training phase ────────────────────────────────────────────────
            let mut loss_sum = 0.0f64;
            let mut correct  = 0usize;
            let mut seen     = 0usize;

            for (batch_idx, batch) in train_loader.iter().enumerate() {
                let batch_size = batch.labels.dims()[0];
                let logits = model.forward(batch.keypoints);
                let loss   = loss_fn.forward(logits.clone(), batch.labels.clone());

                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
                if !loss_val.is_finite() {
                    return Err(TrainError::NonFiniteLoss { epoch, batch: batch_idx, loss: loss_val });
                }

                loss_sum += loss_val * batch_size as f64;
                correct  += count_correct(logits, batch.labels);
                seen     += batch_size;

                // Backward pass + Adam update
                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(cfg.lr, model, grads);
            }

            let train_loss = if seen > 0 { loss_sum / seen as f64 } else { f64::NAN };
            let train_acc  = if seen > 0 { correct as f64 / seen as f64 } else { 0.0 };
            last = (train_loss, train_acc);

            // ── Validation phase ──────────────────────────────────────────────
            let model_valid = model.valid();
            let val_acc     = evaluate(&model_valid, val_loader.as_ref());

            // ── Checkpoint on strict improvement ──────────────────────────────
            let improved = self.best.is_beaten_by(val_acc);
            if improved {
                let metadata = CheckpointMetadata {
                    labels:       vocabulary.labels().to_vec(),
                    input_width,
                    seq_len,
                    architecture,
                    training:     cfg.clone(),
                    epoch,
                    val_accuracy: val_acc,
                };
                let path = self.checkpoints.save(&model_valid, &metadata)?;
                self.best.record(val_acc, epoch, path);
                tracing::info!("New best val_acc {:.4} at epoch {}, checkpoint saved", val_acc, epoch);
            }

            self.metrics.log(&EpochMetrics::new(epoch, train_loss, train_acc, val_acc, improved))?;

            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_acc={:.1}%{}",
                epoch,
                cfg.epochs,
                train_loss,
                train_acc * 100.0,
                val_acc * 100.0,
                if improved { " | saved" } else { "" },
            );
        }

        tracing::info!(
            "Training complete! Best val_acc {:.4} (epoch {:?})",
            self.best.accuracy.unwrap_or(0.0),
            self.best.epoch,
        );

        Ok(TrainingSummary {
            epochs_run:       cfg.epochs,
            best:             self.best.clone(),
            final_train_loss: last.0,
            final_train_acc:  last.1,
        })
    }
}

/// Adam with the run's L2 penalty (Burn keeps optimiser settings in f32).
pub fn adam_config(cfg: &TrainConfig) -> AdamConfig {
    AdamConfig::new().with_weight_decay(Some(WeightDecayConfig::new(cfg.weight_decay as f32)))
}

/// Fraction of the validation set classified correctly.
pub fn evaluate<B: Backend>(
    model:  &SequenceClassifier<B>,
    loader: &dyn DataLoader<SequenceBatch<B>>,
) -> f64 {
    let mut correct = 0usize;
    let mut total   = 0usize;

    for batch in loader.iter() {
        total   += batch.labels.dims()[0];
        correct += count_correct(model.forward(batch.keypoints), batch.labels);
    }

    if total > 0 { correct as f64 / total as f64 } else { 0.0 }
}

fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns shape [batch, 1] — flatten to [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let hits: i64 = predicted.equal(labels).int().sum().into_scalar().elem::<i64>();
    hits as usize
}
