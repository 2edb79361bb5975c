//! Model hyperparameters

use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

/// Hyperparameters of one transformer checkpoint.
///
/// Produced by the external container-header parser and never mutated
/// afterwards. All weight layout and workspace sizing derives from these
/// eight values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Embedding dimension
    pub dim: usize,

    /// Feed-forward hidden dimension
    pub hidden_dim: usize,

    /// Number of transformer layers
    pub n_layers: usize,

    /// Number of query heads
    pub n_heads: usize,

    /// Number of key/value heads (GQA)
    pub n_kv_heads: usize,

    /// Vocabulary size
    pub vocab_size: usize,

    /// Maximum sequence length
    pub seq_len: usize,

    /// Dimension of a single attention head
    pub head_dim: usize,
}

impl ModelConfig {
    /// Check the config invariants: every value strictly positive, and no
    /// derived extent overflows the addressable range.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("dim", self.dim),
            ("hidden_dim", self.hidden_dim),
            ("n_layers", self.n_layers),
            ("n_heads", self.n_heads),
            ("n_kv_heads", self.n_kv_heads),
            ("vocab_size", self.vocab_size),
            ("seq_len", self.seq_len),
            ("head_dim", self.head_dim),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(CoreError::InvalidConfig {
                    field,
                    reason: "must be strictly positive".to_string(),
                });
            }
        }

        if self.head_dim.checked_mul(self.n_heads).is_none() {
            return Err(CoreError::InvalidConfig {
                field: "head_dim",
                reason: format!("head_dim * n_heads ({} * {}) overflows", self.head_dim, self.n_heads),
            });
        }
        if self.head_dim.checked_mul(self.n_kv_heads).is_none() {
            return Err(CoreError::InvalidConfig {
                field: "head_dim",
                reason: format!(
                    "head_dim * n_kv_heads ({} * {}) overflows",
                    self.head_dim, self.n_kv_heads
                ),
            });
        }
        if self.total_weight_elements().is_none() {
            return Err(CoreError::InvalidConfig {
                field: "dim",
                reason: "total weight extent overflows the addressable range".to_string(),
            });
        }

        Ok(())
    }

    /// Combined dimension of all query heads.
    pub fn q_dim(&self) -> usize {
        self.n_heads * self.head_dim
    }

    /// Combined dimension of all key/value heads.
    pub fn kv_dim(&self) -> usize {
        self.n_kv_heads * self.head_dim
    }

    /// Total `f32` element count of the checkpoint payload this config
    /// describes, or `None` if the extent overflows `usize`.
    pub fn total_weight_elements(&self) -> Option<usize> {
        let q_dim = self.head_dim.checked_mul(self.n_heads)?;
        let kv_dim = self.head_dim.checked_mul(self.n_kv_heads)?;

        // Shared tensors: classifier, final norm, token embeddings.
        let shared = self
            .vocab_size
            .checked_mul(self.dim)?
            .checked_mul(2)?
            .checked_add(self.dim)?;

        // One layer's worth: k/q/v/o projections, q/k norms, attention and
        // ffn norms, ffn down/gate/up.
        let per_layer = self
            .dim
            .checked_mul(kv_dim)?
            .checked_mul(2)?
            .checked_add(self.dim.checked_mul(q_dim)?.checked_mul(2)?)?
            .checked_add(self.head_dim.checked_mul(2)?)?
            .checked_add(self.dim.checked_mul(2)?)?
            .checked_add(self.hidden_dim.checked_mul(self.dim)?.checked_mul(3)?)?;

        shared.checked_add(per_layer.checked_mul(self.n_layers)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> ModelConfig {
        ModelConfig {
            dim: 8,
            hidden_dim: 16,
            n_layers: 2,
            n_heads: 4,
            n_kv_heads: 2,
            vocab_size: 32,
            seq_len: 10,
            head_dim: 4,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(tiny().validate().is_ok());
    }

    #[test]
    fn zero_field_is_rejected() {
        let mut config = tiny();
        config.n_kv_heads = 0;
        match config.validate() {
            Err(CoreError::InvalidConfig {
                field: "n_kv_heads",
                ..
            }) => {}
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn head_product_overflow_is_rejected() {
        let mut config = tiny();
        config.head_dim = usize::MAX / 2;
        config.n_heads = 4;
        match config.validate() {
            Err(CoreError::InvalidConfig {
                field: "head_dim", ..
            }) => {}
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn total_extent_matches_hand_count() {
        let config = tiny();
        let (dim, hid, l) = (8usize, 16usize, 2usize);
        let (q, kv, hd, vocab) = (16usize, 8usize, 4usize, 32usize);
        let shared = vocab * dim * 2 + dim;
        let per_layer = 2 * dim * kv + 2 * dim * q + 2 * hd + 2 * dim + 3 * hid * dim;
        assert_eq!(
            config.total_weight_elements(),
            Some(shared + per_layer * l)
        );
    }
}
