// End-to-end: train on a tiny synthetic corpus on the CPU backend,
// then load the checkpoint and recognise sequences with it.

use std::{
    fmt::Write as _,
    fs::{self, File},
    path::{Path, PathBuf},
};

use approx::assert_relative_eq;
use burn::backend::{Autodiff, NdArray};
use ndarray::Array2;
use ndarray_npy::NpzWriter;

use sign_recognizer::{
    application::train_use_case::{TrainConfig, TrainUseCase},
    data::batcher::stack_sequences,
    domain::keypoints::KeypointSequence,
    error::ShapeError,
    infra::{
        checkpoint::{CheckpointManager, CheckpointMetadata, CHECKPOINT_FILE},
        metrics::METRICS_FILE,
    },
    ml::{
        inferencer::InferenceEngine,
        model::{Architecture, SequenceClassifier, SequenceClassifierConfig},
    },
};

type Cpu      = NdArray;
type CpuTrain = Autodiff<NdArray>;

const LABELS: [&str; 3] = ["hello", "thanks", "yes"];
const FRAMES: usize = 40;
const WIDTH:  usize = 10;

/// Class `k` drifts around `0.3 * k`, so the classes are easy to separate.
fn class_sequence(class: usize, variant: usize, frames: usize) -> Array2<f32> {
    Array2::from_shape_fn((frames, WIDTH), |(f, c)| {
        0.3 * class as f32 + 0.002 * ((f + c + variant) % 7) as f32
    })
}

fn write_npz(path: &Path, array: &Array2<f32>) {
    let mut npz = NpzWriter::new(File::create(path).unwrap());
    npz.add_array("keypoints", array).unwrap();
    npz.finish().unwrap();
}

/// Write `per_class` samples for each label and a manifest listing them.
fn write_corpus(dir: &Path, name: &str, per_class: usize) -> PathBuf {
    fs::create_dir_all(dir.join(name)).unwrap();
    let mut csv = String::from("file,label\n");
    for (class, label) in LABELS.iter().enumerate() {
        for variant in 0..per_class {
            let file = format!("{name}/{label}_{variant}.npz");
            write_npz(&dir.join(&file), &class_sequence(class, variant, FRAMES));
            writeln!(csv, "{file},{label}").unwrap();
        }
    }
    let manifest = dir.join(format!("{name}.csv"));
    fs::write(&manifest, csv).unwrap();
    manifest
}

fn small_config(dir: &Path, seq_len: usize) -> TrainConfig {
    TrainConfig {
        train_manifest: write_corpus(dir, "train", 4),
        val_manifest:   Some(write_corpus(dir, "val", 2)),
        checkpoint_dir: dir.join("ckpt"),
        seq_len,
        batch_size:     4,
        epochs:         3,
        d_model:        16,
        num_heads:      2,
        num_layers:     1,
        d_ff:           32,
        max_seq_len:    128,
        num_workers:    1,
        ..TrainConfig::default()
    }
}

fn sequence(array: Array2<f32>) -> KeypointSequence {
    KeypointSequence::new(array).unwrap()
}

#[test]
fn test_train_then_predict_distribution() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = small_config(dir.path(), 20);
    let summary = TrainUseCase::new(cfg.clone()).execute_on::<CpuTrain>(Default::default()).unwrap();

    assert_eq!(summary.epochs_run, 3);
    assert!(summary.final_train_loss.is_finite());
    let ckpt_path = summary.best.path.clone().unwrap();
    assert_eq!(ckpt_path, cfg.checkpoint_dir.join(CHECKPOINT_FILE));
    assert!(cfg.checkpoint_dir.join("recognition.ckpt.labels.json").exists());
    assert!(cfg.checkpoint_dir.join("train_config.json").exists());

    let engine = InferenceEngine::<Cpu>::from_checkpoint(&ckpt_path, Default::default()).unwrap();
    assert_eq!(engine.input_width(), WIDTH);
    assert_eq!(engine.seq_len(), 20);
    assert_eq!(engine.vocabulary().labels(), &LABELS.map(String::from));

    let prediction = engine.predict(&sequence(class_sequence(1, 9, FRAMES))).unwrap();
    assert_eq!(prediction.probabilities.len(), 3);
    assert_relative_eq!(prediction.probabilities.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    assert!(LABELS.contains(&prediction.label.as_str()));
}

#[test]
fn test_first_epoch_always_writes_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = small_config(dir.path(), 20);
    let summary = TrainUseCase::new(cfg.clone()).execute_on::<CpuTrain>(Default::default()).unwrap();

    let metrics = fs::read_to_string(cfg.checkpoint_dir.join(METRICS_FILE)).unwrap();
    let rows: Vec<Vec<&str>> = metrics.lines().skip(1).map(|l| l.split(',').collect()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][4], "1");

    // The stored checkpoint is the last epoch flagged as best
    let last_best = rows.iter().rev().find(|r| r[4] == "1").unwrap();
    let stored = CheckpointManager::new(&cfg.checkpoint_dir).load().unwrap();
    assert_eq!(stored.metadata().epoch.to_string(), last_best[0]);
    assert_eq!(Some(stored.metadata().epoch), summary.best.epoch);
    assert_eq!(stored.metadata().training, cfg);
}

#[test]
fn test_short_query_resampled_to_checkpoint_length() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = small_config(dir.path(), 64);
    let summary = TrainUseCase::new(cfg).execute_on::<CpuTrain>(Default::default()).unwrap();
    let engine = InferenceEngine::<Cpu>::from_checkpoint(summary.best.path.unwrap(), Default::default()).unwrap();

    let query = sequence(class_sequence(2, 0, 5));
    let prepared = engine.prepare(&query).unwrap();
    assert_eq!(prepared.len(), 64);
    assert_eq!(prepared.frame(0), query.frame(0));
    assert_eq!(prepared.frame(63), query.frame(4));

    let prediction = engine.predict(&query).unwrap();
    assert!(LABELS.contains(&prediction.label.as_str()));
}

#[test]
fn test_width_mismatch_is_shape_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = small_config(dir.path(), 20);
    let summary = TrainUseCase::new(cfg).execute_on::<CpuTrain>(Default::default()).unwrap();
    let engine = InferenceEngine::<Cpu>::from_checkpoint(summary.best.path.unwrap(), Default::default()).unwrap();

    let narrow = KeypointSequence::zeros(30, WIDTH - 1).unwrap();
    assert_eq!(
        engine.predict(&narrow).unwrap_err(),
        ShapeError::WidthMismatch { expected: WIDTH, actual: WIDTH - 1 },
    );
}

#[test]
fn test_unknown_validation_label_fails_before_training() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = small_config(dir.path(), 20);

    let extra = dir.path().join("val/maybe.npz");
    write_npz(&extra, &class_sequence(0, 0, FRAMES));
    let val = cfg.val_manifest.clone().unwrap();
    let mut csv = fs::read_to_string(&val).unwrap();
    csv.push_str("val/maybe.npz,maybe\n");
    fs::write(&val, csv).unwrap();
    cfg.epochs = 1;

    let err = TrainUseCase::new(cfg.clone()).execute_on::<CpuTrain>(Default::default()).unwrap_err();
    assert!(format!("{err:#}").contains("maybe"));
    assert!(!cfg.checkpoint_dir.join(CHECKPOINT_FILE).exists());
}

#[test]
fn test_checkpoint_round_trip_reproduces_logits() {
    let dir    = tempfile::tempdir().unwrap();
    let device = Default::default();

    let config = SequenceClassifierConfig::new(WIDTH, LABELS.len())
        .with_d_model(16)
        .with_num_heads(2)
        .with_num_layers(2)
        .with_d_ff(32)
        .with_max_seq_len(128);
    let model: SequenceClassifier<Cpu> = config.init(&device);

    let metadata = CheckpointMetadata {
        labels:       LABELS.iter().map(|l| l.to_string()).collect(),
        input_width:  WIDTH,
        seq_len:      20,
        architecture: Architecture::from_config(&config),
        training:     TrainConfig::default(),
        epoch:        4,
        val_accuracy: 0.75,
    };
    let path = CheckpointManager::new(dir.path()).save(&model, &metadata).unwrap();
    let engine = InferenceEngine::<Cpu>::from_checkpoint(&path, device).unwrap();

    let query    = sequence(class_sequence(0, 3, FRAMES));
    let prepared = engine.prepare(&query).unwrap();
    let expected: Vec<f32> = model
        .forward(stack_sequences::<Cpu, _>([&prepared], &Default::default()))
        .into_data()
        .iter::<f32>()
        .collect();
    let actual: Vec<f32> = engine.logits(&query).unwrap().into_data().iter::<f32>().collect();

    assert_eq!(expected.len(), actual.len());
    for (e, a) in expected.iter().zip(&actual) {
        assert_relative_eq!(*e, *a, epsilon = 1e-6);
    }
}
