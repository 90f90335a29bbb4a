use burn::{
    module::{ModuleVisitor, ParamId},
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
        PositionalEncoding, PositionalEncodingConfig,
    },
    prelude::*,
    tensor::activation::relu,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest sequence Burn's sinusoidal table supports (its default max timescale).
pub const MAX_POSITIONS: usize = 10_000;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SequenceClassifierConfig {
    /// Values per frame (D)
    pub input_width: usize,
    pub num_classes: usize,
    #[config(default = 192)]
    pub d_model:     usize,
    #[config(default = 6)]
    pub num_heads:   usize,
    #[config(default = 4)]
    pub num_layers:  usize,
    #[config(default = 512)]
    pub d_ff:        usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
    /// Longest sequence the positional table is precomputed for
    #[config(default = 1024)]
    pub max_seq_len: usize,
}

impl SequenceClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_width == 0 {
            return Err(ConfigError::invalid("input_width", "must be at least 1"));
        }
        if self.num_classes == 0 {
            return Err(ConfigError::invalid("num_classes", "must be at least 1"));
        }
        if self.d_model == 0 || self.d_model % 2 != 0 {
            return Err(ConfigError::invalid(
                "d_model",
                format!("{} must be even and at least 2", self.d_model),
            ));
        }
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            return Err(ConfigError::invalid(
                "num_heads",
                format!("d_model {} is not divisible by {} heads", self.d_model, self.num_heads),
            ));
        }
        if self.num_layers == 0 {
            return Err(ConfigError::invalid("num_layers", "must be at least 1"));
        }
        if self.max_seq_len == 0 || self.max_seq_len > MAX_POSITIONS {
            return Err(ConfigError::invalid(
                "max_seq_len",
                format!("{} is not in [1, {MAX_POSITIONS}]", self.max_seq_len),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ConfigError::invalid("dropout", format!("{} is not in [0, 1)", self.dropout)));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> SequenceClassifier<B> {
        let input_proj = LinearConfig::new(self.input_width, self.d_model).init(device);
        let pos_encoding = PositionalEncodingConfig::new(self.d_model)
            .with_max_sequence_size(self.max_seq_len)
            .init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let head       = LinearConfig::new(self.d_model, self.num_classes).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        SequenceClassifier {
            input_proj, pos_encoding, layers,
            final_norm, head, dropout,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

/// Plain-serde copy of the hyperparameters, stored in checkpoints.
/// Independent of Burn's config format so the bundle stays stable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
    pub max_seq_len: usize,
}

impl Architecture {
    pub fn from_config(cfg: &SequenceClassifierConfig) -> Self {
        Self {
            d_model:     cfg.d_model,
            num_heads:   cfg.num_heads,
            num_layers:  cfg.num_layers,
            d_ff:        cfg.d_ff,
            dropout:     cfg.dropout,
            max_seq_len: cfg.max_seq_len,
        }
    }

    pub fn to_config(&self, input_width: usize, num_classes: usize) -> SequenceClassifierConfig {
        SequenceClassifierConfig::new(input_width, num_classes)
            .with_d_model(self.d_model)
            .with_num_heads(self.num_heads)
            .with_num_layers(self.num_layers)
            .with_d_ff(self.d_ff)
            .with_dropout(self.dropout)
            .with_max_seq_len(self.max_seq_len)
    }
}

/// Post-norm transformer encoder layer: full (unmasked) self-attention
/// over time, then a ReLU feed-forward, each wrapped in residual + LayerNorm.
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let attn_output = self.self_attn.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            self.dropout.forward(relu(self.ffn_linear1.forward(x.clone())))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct SequenceClassifier<B: Backend> {
    pub input_proj:   Linear<B>,
    pub pos_encoding: PositionalEncoding<B>,
    pub layers:       Vec<EncoderBlock<B>>,
    pub final_norm:   LayerNorm<B>,
    pub head:         Linear<B>,
    pub dropout:      Dropout,
}

impl<B: Backend> SequenceClassifier<B> {
    /// keypoints: [batch, seq_len, input_width] → logits: [batch, num_classes]
    pub fn forward(&self, keypoints: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = self.input_proj.forward(keypoints); // [batch, seq_len, d_model]

        // Self-attention is permutation-invariant, so frame order must be injected explicitly.
        let x = self.pos_encoding.forward(x);
        let mut x = self.dropout.forward(x);
        for layer in &self.layers {
            x = layer.forward(x);
        }

        // Average over time → one vector per sample
        let [batch_size, _, d_model] = x.dims();
        let pooled = x.mean_dim(1).reshape([batch_size, d_model]);

        self.head.forward(self.final_norm.forward(pooled))
    }

    /// Shapes of every learnable tensor, in visiting order.
    pub fn parameter_shapes(&self) -> Vec<Vec<usize>> {
        module_parameter_shapes(self)
    }
}

/// Shapes of every learnable tensor of any module, in visiting order.
pub fn module_parameter_shapes<B: Backend, M: Module<B>>(module: &M) -> Vec<Vec<usize>> {
    let mut collector = ShapeCollector::default();
    module.visit(&mut collector);
    collector.shapes
}

#[derive(Default)]
struct ShapeCollector {
    shapes: Vec<Vec<usize>>,
}

impl<B: Backend> ModuleVisitor<B> for ShapeCollector {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        self.shapes.push(tensor.dims().to_vec());
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn small_config() -> SequenceClassifierConfig {
        small_config_with_classes(3)
    }

    fn small_config_with_classes(num_classes: usize) -> SequenceClassifierConfig {
        SequenceClassifierConfig::new(10, num_classes)
            .with_d_model(16)
            .with_num_heads(2)
            .with_num_layers(2)
            .with_d_ff(32)
            .with_max_seq_len(128)
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: SequenceClassifier<TestBackend> = small_config().init(&device);
        let input = Tensor::<TestBackend, 3>::random([4, 20, 10], burn::tensor::Distribution::Default, &device);
        assert_eq!(model.forward(input).dims(), [4, 3]);
    }

    #[test]
    fn test_defaults_match_reference_architecture() {
        let cfg = SequenceClassifierConfig::new(225, 10);
        assert_eq!((cfg.d_model, cfg.num_heads, cfg.num_layers, cfg.d_ff), (192, 6, 4, 512));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_heads_must_divide_width() {
        assert!(small_config().with_num_heads(3).validate().is_err());
        assert!(small_config_with_classes(0).validate().is_err());
    }

    #[test]
    fn test_odd_or_zero_width_rejected() {
        assert!(small_config().with_d_model(7).with_num_heads(1).validate().is_err());
        assert!(small_config().with_d_model(0).with_num_heads(1).validate().is_err());
    }

    #[test]
    fn test_positional_table_limit() {
        assert!(small_config().with_max_seq_len(MAX_POSITIONS).validate().is_ok());
        assert!(small_config().with_max_seq_len(MAX_POSITIONS + 1).validate().is_err());
        assert!(small_config().with_max_seq_len(0).validate().is_err());
    }

    #[test]
    fn test_architecture_round_trip() {
        let cfg  = small_config();
        let arch = Architecture::from_config(&cfg);
        let back = arch.to_config(cfg.input_width, cfg.num_classes);
        assert_eq!(back.d_model, 16);
        assert_eq!(back.num_layers, 2);
        assert_eq!(back.max_seq_len, 128);
    }

    #[test]
    fn test_parameter_shapes_reflect_architecture() {
        let device = Default::default();
        let a: SequenceClassifier<TestBackend> = small_config().init(&device);
        let b: SequenceClassifier<TestBackend> = small_config_with_classes(4).init(&device);
        assert_eq!(a.parameter_shapes().len(), b.parameter_shapes().len());
        assert_ne!(a.parameter_shapes(), b.parameter_shapes());
    }
}
