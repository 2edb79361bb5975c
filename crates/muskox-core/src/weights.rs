//! Weight layout resolution
//!
//! The checkpoint payload is one flat run of f32 values holding every
//! weight tensor back to back, in an order fixed by the checkpoint format.
//! This module walks that run with an explicit cursor and binds each range
//! to its role. Nothing here allocates; every member of [`Weights`] is a
//! refcounted view into the mapped payload.

use muskox_checkpoint::{Checkpoint, TensorView};
use tracing::debug;

use crate::config::ModelConfig;
use crate::{CoreError, Result};

/// The named weight tensors of one checkpoint.
///
/// Per-layer tensors hold all `n_layers` repetitions contiguously and are
/// addressed through the layer-indexed accessors below.
#[derive(Debug, Clone)]
pub struct Weights {
    config: ModelConfig,

    /// Classifier / output projection, `vocab_size * dim`
    cls: TensorView,
    /// Final RMS norm, `dim`
    final_norm: TensorView,
    /// Token embedding table, `vocab_size * dim`
    token_embedding: TensorView,
    /// Key projections, `n_layers * dim * kv_dim`
    wk: TensorView,
    /// Key norms, `n_layers * head_dim`
    k_norm: TensorView,
    /// Attention norms, `n_layers * dim`
    att_norm: TensorView,
    /// Attention output projections, `n_layers * q_dim * dim`
    wo: TensorView,
    /// Query projections, `n_layers * dim * q_dim`
    wq: TensorView,
    /// Query norms, `n_layers * head_dim`
    q_norm: TensorView,
    /// Value projections, `n_layers * dim * kv_dim`
    wv: TensorView,
    /// Feed-forward down projections, `n_layers * hidden_dim * dim`
    ffn_down: TensorView,
    /// Feed-forward gate projections, `n_layers * dim * hidden_dim`
    ffn_gate: TensorView,
    /// Feed-forward norms, `n_layers * dim`
    ffn_norm: TensorView,
    /// Feed-forward up projections, `n_layers * dim * hidden_dim`
    ffn_up: TensorView,
}

/// Running element cursor over the payload. Each `take` produces one view
/// and advances; the caller has already proven the payload is exactly the
/// right size, so the walk cannot run off the end.
struct Cursor<'a> {
    checkpoint: &'a Checkpoint,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, elements: usize) -> Result<TensorView> {
        let view = self.checkpoint.view(self.offset, elements)?;
        self.offset += elements;
        Ok(view)
    }
}

impl Weights {
    /// Partition the checkpoint payload into the fixed tensor order.
    ///
    /// The order below is fixed by the checkpoint format; it is neither
    /// alphabetical nor grouped by meaning. A payload whose length differs
    /// from the sum of the computed extents is a config/file mismatch and
    /// fails outright.
    pub fn resolve(config: &ModelConfig, checkpoint: &Checkpoint) -> Result<Self> {
        config.validate()?;

        let expected =
            config
                .total_weight_elements()
                .ok_or_else(|| CoreError::InvalidConfig {
                    field: "config",
                    reason: "total weight extent overflows the addressable range".to_string(),
                })?;
        let actual = checkpoint.payload_elements();
        if expected != actual {
            return Err(CoreError::LayoutMismatch { expected, actual });
        }

        let dim = config.dim;
        let hidden_dim = config.hidden_dim;
        let n_layers = config.n_layers;
        let q_dim = config.q_dim();
        let kv_dim = config.kv_dim();
        let vocab = config.vocab_size;

        let mut cursor = Cursor {
            checkpoint,
            offset: 0,
        };

        let weights = Self {
            config: *config,
            cls: cursor.take(vocab * dim)?,
            final_norm: cursor.take(dim)?,
            token_embedding: cursor.take(vocab * dim)?,
            wk: cursor.take(n_layers * dim * kv_dim)?,
            k_norm: cursor.take(n_layers * config.head_dim)?,
            att_norm: cursor.take(n_layers * dim)?,
            wo: cursor.take(n_layers * q_dim * dim)?,
            wq: cursor.take(n_layers * dim * q_dim)?,
            q_norm: cursor.take(n_layers * config.head_dim)?,
            wv: cursor.take(n_layers * dim * kv_dim)?,
            ffn_down: cursor.take(n_layers * hidden_dim * dim)?,
            ffn_gate: cursor.take(n_layers * dim * hidden_dim)?,
            ffn_norm: cursor.take(n_layers * dim)?,
            ffn_up: cursor.take(n_layers * dim * hidden_dim)?,
        };
        debug_assert_eq!(cursor.offset, actual);

        debug!(elements = actual, layers = n_layers, "resolved weight layout");

        Ok(weights)
    }

    fn layer_slice<'a>(&self, view: &'a TensorView, layer: usize, stride: usize) -> &'a [f32] {
        &view.as_f32()[layer * stride..(layer + 1) * stride]
    }

    /// Classifier / output projection, `vocab_size x dim`.
    pub fn cls(&self) -> &[f32] {
        self.cls.as_f32()
    }

    /// Final normalization vector, `dim`.
    pub fn final_norm(&self) -> &[f32] {
        self.final_norm.as_f32()
    }

    /// Full token embedding table, `vocab_size x dim`.
    pub fn token_embedding(&self) -> &[f32] {
        self.token_embedding.as_f32()
    }

    /// Embedding row for one token, `dim`.
    pub fn embedding(&self, token: usize) -> &[f32] {
        let dim = self.config.dim;
        &self.token_embedding.as_f32()[token * dim..(token + 1) * dim]
    }

    /// Query projection for `layer`, `dim x q_dim`.
    pub fn wq(&self, layer: usize) -> &[f32] {
        self.layer_slice(&self.wq, layer, self.config.dim * self.config.q_dim())
    }

    /// Key projection for `layer`, `dim x kv_dim`.
    pub fn wk(&self, layer: usize) -> &[f32] {
        self.layer_slice(&self.wk, layer, self.config.dim * self.config.kv_dim())
    }

    /// Value projection for `layer`, `dim x kv_dim`.
    pub fn wv(&self, layer: usize) -> &[f32] {
        self.layer_slice(&self.wv, layer, self.config.dim * self.config.kv_dim())
    }

    /// Attention output projection for `layer`, `q_dim x dim`.
    pub fn wo(&self, layer: usize) -> &[f32] {
        self.layer_slice(&self.wo, layer, self.config.q_dim() * self.config.dim)
    }

    /// Query normalization vector for `layer`, `head_dim`.
    pub fn q_norm(&self, layer: usize) -> &[f32] {
        self.layer_slice(&self.q_norm, layer, self.config.head_dim)
    }

    /// Key normalization vector for `layer`, `head_dim`.
    pub fn k_norm(&self, layer: usize) -> &[f32] {
        self.layer_slice(&self.k_norm, layer, self.config.head_dim)
    }

    /// Attention normalization vector for `layer`, `dim`.
    pub fn att_norm(&self, layer: usize) -> &[f32] {
        self.layer_slice(&self.att_norm, layer, self.config.dim)
    }

    /// Feed-forward normalization vector for `layer`, `dim`.
    pub fn ffn_norm(&self, layer: usize) -> &[f32] {
        self.layer_slice(&self.ffn_norm, layer, self.config.dim)
    }

    /// Feed-forward down projection for `layer`, `hidden_dim x dim`.
    pub fn ffn_down(&self, layer: usize) -> &[f32] {
        self.layer_slice(
            &self.ffn_down,
            layer,
            self.config.hidden_dim * self.config.dim,
        )
    }

    /// Feed-forward gate projection for `layer`, `dim x hidden_dim`.
    pub fn ffn_gate(&self, layer: usize) -> &[f32] {
        self.layer_slice(
            &self.ffn_gate,
            layer,
            self.config.dim * self.config.hidden_dim,
        )
    }

    /// Feed-forward up projection for `layer`, `dim x hidden_dim`.
    pub fn ffn_up(&self, layer: usize) -> &[f32] {
        self.layer_slice(
            &self.ffn_up,
            layer,
            self.config.dim * self.config.hidden_dim,
        )
    }
}
