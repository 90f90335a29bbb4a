// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `train`, `predict` and `inspect`
// and all their configurable flags.
//
// Training flags are all optional: a run starts from the
// built-in defaults (or from --config <file.json>) and every
// flag given on the command line overrides that one value.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{train_use_case::TrainConfig, DeviceKind};
use crate::error::ConfigError;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the sign classifier on a manifest of keypoint files
    Train(TrainArgs),

    /// Recognise the gesture in one keypoint file
    Predict(PredictArgs),

    /// Show what a checkpoint was trained on
    Inspect(InspectArgs),
}

/// Compute device for training and inference
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum DeviceArg {
    /// GPU through WGPU
    #[default]
    Wgpu,
    /// CPU (NdArray backend)
    Cpu,
}

/// The application layer never sees clap types.
impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Wgpu => DeviceKind::Wgpu,
            DeviceArg::Cpu  => DeviceKind::Cpu,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug, Default)]
pub struct TrainArgs {
    /// JSON file with training settings; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = DeviceArg::Wgpu)]
    pub device: DeviceArg,

    /// CSV manifest with `file,label` rows [default: data/train.csv]
    #[arg(long)]
    pub train_manifest: Option<PathBuf>,

    /// Validation manifest; without it a share of the training rows is held out
    #[arg(long)]
    pub val_manifest: Option<PathBuf>,

    /// Share of training rows held out when no validation manifest is given [default: 0.2]
    #[arg(long)]
    pub val_fraction: Option<f64>,

    /// Where recognition.ckpt, metrics.csv and train_config.json go [default: checkpoints]
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Frames every sequence is resampled to [default: 64]
    #[arg(long)]
    pub seq_len: Option<usize>,

    /// [default: 16]
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Number of full passes through the training data [default: 35]
    #[arg(long)]
    pub epochs: Option<usize>,

    /// Adam learning rate [default: 1e-3]
    #[arg(long)]
    pub lr: Option<f64>,

    /// L2 weight decay [default: 1e-5]
    #[arg(long)]
    pub weight_decay: Option<f64>,

    /// Hidden width of the transformer [default: 192]
    #[arg(long)]
    pub d_model: Option<usize>,

    /// Attention heads; must divide d_model [default: 6]
    #[arg(long)]
    pub num_heads: Option<usize>,

    /// Stacked encoder layers [default: 4]
    #[arg(long)]
    pub num_layers: Option<usize>,

    /// Inner width of the feed-forward network [default: 512]
    #[arg(long)]
    pub d_ff: Option<usize>,

    /// [default: 0.1]
    #[arg(long)]
    pub dropout: Option<f64>,

    /// Longest sequence the positional encoding covers [default: 1024]
    #[arg(long)]
    pub max_seq_len: Option<usize>,

    /// Disable mirroring and jitter
    #[arg(long)]
    pub no_augment: bool,

    /// Chance of mirroring a training sample horizontally [default: 0.5]
    #[arg(long)]
    pub mirror_probability: Option<f64>,

    /// Standard deviation of the Gaussian jitter [default: 0.001]
    #[arg(long)]
    pub jitter_std: Option<f32>,

    /// Values per landmark; the first of each group is x [default: 3]
    #[arg(long)]
    pub coords_per_landmark: Option<usize>,

    /// Data loading threads [default: 2]
    #[arg(long)]
    pub num_workers: Option<usize>,

    /// Seed for the validation split and batch shuffling [default: 42]
    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainArgs {
    /// Resolve the effective configuration: file (or defaults), then flags.
    pub fn into_config(self) -> Result<TrainConfig, ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => TrainConfig::from_json_file(path)?,
            None       => TrainConfig::default(),
        };

        if let Some(v) = self.train_manifest      { cfg.train_manifest      = v; }
        if let Some(v) = self.val_fraction        { cfg.val_fraction        = v; }
        if let Some(v) = self.checkpoint_dir      { cfg.checkpoint_dir      = v; }
        if let Some(v) = self.seq_len             { cfg.seq_len             = v; }
        if let Some(v) = self.batch_size          { cfg.batch_size          = v; }
        if let Some(v) = self.epochs              { cfg.epochs              = v; }
        if let Some(v) = self.lr                  { cfg.lr                  = v; }
        if let Some(v) = self.weight_decay        { cfg.weight_decay        = v; }
        if let Some(v) = self.d_model             { cfg.d_model             = v; }
        if let Some(v) = self.num_heads           { cfg.num_heads           = v; }
        if let Some(v) = self.num_layers          { cfg.num_layers          = v; }
        if let Some(v) = self.d_ff                { cfg.d_ff                = v; }
        if let Some(v) = self.dropout             { cfg.dropout             = v; }
        if let Some(v) = self.max_seq_len         { cfg.max_seq_len         = v; }
        if let Some(v) = self.mirror_probability  { cfg.mirror_probability  = v; }
        if let Some(v) = self.jitter_std          { cfg.jitter_std          = v; }
        if let Some(v) = self.coords_per_landmark { cfg.coords_per_landmark = v; }
        if let Some(v) = self.num_workers         { cfg.num_workers         = v; }
        if let Some(v) = self.seed                { cfg.seed                = v; }
        if self.val_manifest.is_some() {
            cfg.val_manifest = self.val_manifest;
        }
        if self.no_augment {
            cfg.augment = false;
        }

        Ok(cfg)
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Checkpoint file, or the directory training wrote it to
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint: PathBuf,

    /// Keypoint sequence: .npz / .npy array or a JSON list of frames
    #[arg(long)]
    pub input: PathBuf,

    /// How many ranked labels to show
    #[arg(long, default_value_t = 3)]
    pub top_k: usize,

    #[arg(long, value_enum, default_value_t = DeviceArg::Wgpu)]
    pub device: DeviceArg,
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Checkpoint file, or the directory training wrote it to
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint: PathBuf,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_gives_defaults() {
        assert_eq!(TrainArgs::default().into_config().unwrap(), TrainConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{ "epochs": 3, "batch_size": 4 }"#).unwrap();

        let args = TrainArgs {
            config:     Some(path),
            epochs:     Some(9),
            no_augment: true,
            ..TrainArgs::default()
        };
        let cfg = args.into_config().unwrap();
        assert_eq!(cfg.epochs, 9);
        assert_eq!(cfg.batch_size, 4);
        assert!(!cfg.augment);
    }
}
