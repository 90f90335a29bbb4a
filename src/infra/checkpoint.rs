// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the best model of a training run.
//
// A checkpoint is ONE file holding everything inference needs:
//
//   recognition.ckpt  (bincode)
//     ├── format_version   u32, checked before anything else
//     ├── metadata
//     │     labels         vocabulary in index order
//     │     input_width    D the model was trained on
//     │     seq_len        T every query is resampled to
//     │     architecture   d_model, heads, layers, d_ff, ...
//     │     training       snapshot of the TrainConfig used
//     │     epoch / val_accuracy of the saved model
//     └── weights          Burn record bytes (full precision)
//
// Why embed the metadata?
//   To rebuild the model we must know its exact architecture
//   before the weights can be loaded into it, and the label order
//   must be the one used in training. Keeping both in the same
//   file as the weights means they can never drift apart.
//
// Next to it:
//   recognition.ckpt.labels.json — the label list, for people
//                                  and tools; same order as above
//   train_config.json            — the run's configuration
//
// Every write goes to "<name>.tmp" first and is then renamed over
// the real file, so an interrupted run leaves either the previous
// checkpoint or the new one, never a half-written file.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::domain::vocabulary::LabelVocabulary;
use crate::error::{LoadError, TrainError};
use crate::ml::model::{module_parameter_shapes, Architecture, SequenceClassifier, SequenceClassifierConfig};

pub const CHECKPOINT_FILE: &str = "recognition.ckpt";
pub const CONFIG_FILE: &str = "train_config.json";
pub const FORMAT_VERSION: u32 = 1;

type WeightsRecorder = BinBytesRecorder<FullPrecisionSettings>;

/// Everything besides the weights that is needed to rebuild the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub labels:       Vec<String>,
    pub input_width:  usize,
    pub seq_len:      usize,
    pub architecture: Architecture,
    pub training:     TrainConfig,
    pub epoch:        usize,
    pub val_accuracy: f64,
}

#[derive(Serialize, Deserialize)]
struct CheckpointBundle {
    format_version: u32,
    metadata:       CheckpointMetadata,
    weights:        Vec<u8>,
}

/// Writes checkpoints (and their side files) into one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE)
    }

    /// `<checkpoint>.labels.json`
    pub fn labels_path(&self) -> PathBuf {
        sidecar(&self.checkpoint_path(), ".labels.json")
    }

    /// Write the model and its metadata, replacing any earlier checkpoint.
    /// The label sidecar is rewritten afterwards with the same label order.
    pub fn save<B: Backend>(
        &self,
        model:    &SequenceClassifier<B>,
        metadata: &CheckpointMetadata,
    ) -> Result<PathBuf, TrainError> {
        let path = self.checkpoint_path();
        fs::create_dir_all(&self.dir)?;

        let weights = Recorder::<B>::record(&WeightsRecorder::default(), model.clone().into_record(), ())
            .map_err(|e| TrainError::checkpoint(format!("cannot encode weights: {e}"), &path))?;

        let bundle = CheckpointBundle {
            format_version: FORMAT_VERSION,
            metadata:       metadata.clone(),
            weights,
        };
        let bytes = bincode::serialize(&bundle)
            .map_err(|e| TrainError::checkpoint(format!("cannot encode bundle: {e}"), &path))?;
        write_atomic(&path, &bytes)?;

        let labels_json = serde_json::to_string_pretty(&metadata.labels)
            .map_err(|e| TrainError::checkpoint(e.to_string(), self.labels_path()))?;
        write_atomic(&self.labels_path(), labels_json.as_bytes())?;

        tracing::debug!(
            "Saved checkpoint '{}' ({} bytes, epoch {})",
            path.display(),
            bytes.len(),
            metadata.epoch,
        );
        Ok(path)
    }

    /// Save the training configuration to JSON for later inspection.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<(), TrainError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)
            .map_err(|e| TrainError::checkpoint(e.to_string(), &path))?;
        write_atomic(&path, json.as_bytes())?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Read back the checkpoint in this directory.
    pub fn load(&self) -> Result<Checkpoint, LoadError> {
        Checkpoint::read(self.checkpoint_path())
    }
}

/// A decoded, validated checkpoint. Weights stay as bytes until
/// `load_model` rebuilds the architecture they belong to.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    metadata: CheckpointMetadata,
    weights:  Vec<u8>,
}

impl Checkpoint {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path  = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;

        let decode_err = |e: bincode::Error| LoadError::Decode {
            path:   path.to_path_buf(),
            reason: e.to_string(),
        };

        // The version is the first field; check it before trusting the rest.
        let version: u32 = bincode::deserialize(&bytes).map_err(decode_err)?;
        if version != FORMAT_VERSION {
            return Err(LoadError::UnsupportedVersion { found: version, expected: FORMAT_VERSION });
        }

        let bundle: CheckpointBundle = bincode::deserialize(&bytes).map_err(decode_err)?;
        let checkpoint = Self { metadata: bundle.metadata, weights: bundle.weights };
        checkpoint.validate()?;

        tracing::info!(
            "Read checkpoint '{}' (epoch {}, val_acc {:.3}, {} labels)",
            path.display(),
            checkpoint.metadata.epoch,
            checkpoint.metadata.val_accuracy,
            checkpoint.metadata.labels.len(),
        );
        Ok(checkpoint)
    }

    fn validate(&self) -> Result<(), LoadError> {
        let m = &self.metadata;
        let invalid = |field: &'static str, reason: String| LoadError::InvalidMetadata { field, reason };

        if m.input_width == 0 {
            return Err(invalid("input_width", "must be at least 1".into()));
        }
        if m.seq_len == 0 {
            return Err(invalid("seq_len", "must be at least 1".into()));
        }
        if m.seq_len > m.architecture.max_seq_len {
            return Err(invalid(
                "seq_len",
                format!("{} exceeds max_seq_len {}", m.seq_len, m.architecture.max_seq_len),
            ));
        }
        if self.weights.is_empty() {
            return Err(invalid("weights", "no parameter data".into()));
        }
        LabelVocabulary::from_ordered(m.labels.clone())?;
        self.model_config()
            .validate()
            .map_err(|e| invalid("architecture", e.to_string()))
    }

    pub fn metadata(&self) -> &CheckpointMetadata {
        &self.metadata
    }

    /// The training vocabulary, in the stored order.
    pub fn vocabulary(&self) -> Result<LabelVocabulary, LoadError> {
        LabelVocabulary::from_ordered(self.metadata.labels.clone())
    }

    /// Architecture exactly as trained (dropout included).
    pub fn model_config(&self) -> SequenceClassifierConfig {
        self.metadata
            .architecture
            .to_config(self.metadata.input_width, self.metadata.labels.len())
    }

    /// Rebuild the classifier with dropout disabled and load the weights.
    /// Every parameter must have the shape the architecture expects.
    pub fn load_model<B: Backend>(&self, device: &B::Device) -> Result<SequenceClassifier<B>, LoadError> {
        let model: SequenceClassifier<B> = self.model_config().with_dropout(0.0).init(device);
        let expected = model.parameter_shapes();

        let record: <SequenceClassifier<B> as Module<B>>::Record =
            Recorder::<B>::load(&WeightsRecorder::default(), self.weights.clone(), device)
                .map_err(|e| LoadError::Record(e.to_string()))?;

        // Burn asserts on a layer-count mismatch, so count before loading.
        let stored_layers = record.layers.len();
        if stored_layers != model.layers.len() {
            let per_layer = model.layers.first().map_or(0, |l| module_parameter_shapes::<B, _>(l).len());
            let shared    = expected.len() - per_layer * model.layers.len();
            return Err(LoadError::ParameterCount {
                expected: expected.len(),
                actual:   shared + per_layer * stored_layers,
            });
        }
        let model = model.load_record(record);

        let actual = model.parameter_shapes();
        if actual.len() != expected.len() {
            return Err(LoadError::ParameterCount { expected: expected.len(), actual: actual.len() });
        }
        for (index, (exp, act)) in expected.into_iter().zip(actual).enumerate() {
            if exp != act {
                return Err(LoadError::ShapeMismatch { index, expected: exp, actual: act });
            }
        }

        Ok(model)
    }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write to `<path>.tmp`, flush to disk, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = sidecar(path, ".tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn metadata(labels: &[&str], input_width: usize, seq_len: usize) -> CheckpointMetadata {
        let config = SequenceClassifierConfig::new(input_width, labels.len())
            .with_d_model(8)
            .with_num_heads(2)
            .with_num_layers(1)
            .with_d_ff(16)
            .with_max_seq_len(64);
        CheckpointMetadata {
            labels:       labels.iter().map(|l| l.to_string()).collect(),
            input_width,
            seq_len,
            architecture: Architecture::from_config(&config),
            training:     TrainConfig::default(),
            epoch:        1,
            val_accuracy: 0.5,
        }
    }

    fn model_for(meta: &CheckpointMetadata) -> SequenceClassifier<TestBackend> {
        meta.architecture
            .to_config(meta.input_width, meta.labels.len())
            .init(&Default::default())
    }

    #[test]
    fn test_save_writes_bundle_and_sidecar() {
        let dir  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(dir.path());
        let meta = metadata(&["hello", "thanks", "yes"], 6, 16);
        mgr.save(&model_for(&meta), &meta).unwrap();

        let labels: Vec<String> =
            serde_json::from_str(&fs::read_to_string(mgr.labels_path()).unwrap()).unwrap();
        assert_eq!(labels, meta.labels);

        let ckpt = mgr.load().unwrap();
        assert_eq!(ckpt.metadata(), &meta);
        assert_eq!(ckpt.vocabulary().unwrap().labels(), meta.labels.as_slice());
        assert!(!sidecar(&mgr.checkpoint_path(), ".tmp").exists());
    }

    #[test]
    fn test_second_save_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        let mut meta = metadata(&["a", "b"], 4, 8);
        mgr.save(&model_for(&meta), &meta).unwrap();
        meta.epoch = 7;
        meta.val_accuracy = 0.9;
        mgr.save(&model_for(&meta), &meta).unwrap();

        assert_eq!(mgr.load().unwrap().metadata().epoch, 7);
    }

    #[test]
    fn test_missing_checkpoint_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(CheckpointManager::new(dir.path()).load(), Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_truncated_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        let meta = metadata(&["a", "b"], 4, 8);
        mgr.save(&model_for(&meta), &meta).unwrap();

        let bytes = fs::read(mgr.checkpoint_path()).unwrap();
        fs::write(mgr.checkpoint_path(), &bytes[..bytes.len() / 3]).unwrap();
        assert!(matches!(mgr.load(), Err(LoadError::Decode { .. })));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CHECKPOINT_FILE);
        fs::write(&path, bincode::serialize(&99u32).unwrap()).unwrap();
        assert!(matches!(
            Checkpoint::read(&path),
            Err(LoadError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_empty_label_list_is_invalid_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        let meta = metadata(&["a"], 4, 8);
        let model = model_for(&meta);
        let mut broken = meta.clone();
        broken.labels.clear();
        mgr.save(&model, &broken).unwrap();
        assert!(matches!(mgr.load(), Err(LoadError::InvalidMetadata { field: "labels", .. })));
    }

    #[test]
    fn test_weights_must_fit_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());

        // Weights trained for 3 classes, metadata claiming 2
        let trained = metadata(&["a", "b", "c"], 4, 8);
        let model   = model_for(&trained);
        let mut lying = trained.clone();
        lying.labels.pop();
        mgr.save(&model, &lying).unwrap();

        let ckpt = mgr.load().unwrap();
        let err  = ckpt.load_model::<TestBackend>(&Default::default()).unwrap_err();
        assert!(matches!(err, LoadError::ShapeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn test_layer_count_must_fit_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());

        // Weights with two encoder layers, metadata claiming one
        let mut meta = metadata(&["a", "b"], 4, 8);
        meta.architecture.num_layers = 2;
        let model = model_for(&meta);
        let expected_two = model.parameter_shapes().len();
        meta.architecture.num_layers = 1;
        mgr.save(&model, &meta).unwrap();

        let err = mgr.load().unwrap().load_model::<TestBackend>(&Default::default()).unwrap_err();
        match err {
            LoadError::ParameterCount { expected, actual } => {
                assert!(expected < actual);
                assert_eq!(actual, expected_two);
            }
            other => panic!("expected ParameterCount, got {other:?}"),
        }
    }

    #[test]
    fn test_odd_width_architecture_is_invalid_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path());
        let meta = metadata(&["a", "b"], 4, 8);
        let model = model_for(&meta);

        let mut broken = meta.clone();
        broken.architecture.d_model   = 7;
        broken.architecture.num_heads = 1;
        mgr.save(&model, &broken).unwrap();
        assert!(matches!(mgr.load(), Err(LoadError::InvalidMetadata { field: "architecture", .. })));
    }
}
