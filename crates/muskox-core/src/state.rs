//! Per-inference scratch workspace
//!
//! Everything the forward pass mutates lives here: activation buffers,
//! attention scores, logits, and the key/value caches. This module only
//! sizes, allocates, and owns the buffers; their contents are the forward
//! pass's business.

use tracing::debug;

use crate::config::ModelConfig;
use crate::{CoreError, Result};

/// Element counts for every workspace buffer, derived from the config.
///
/// Kept separate from the allocation itself so sizing can be checked
/// without touching multi-gigabyte caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceDims {
    /// Activation-shaped buffers (`x`, `xb`, `xb2`, `xb3`)
    pub activation: usize,
    /// Feed-forward hidden buffers (`hb`, `hb2`)
    pub hidden: usize,
    /// Query projection buffer
    pub q: usize,
    /// Key/value projection buffers
    pub kv: usize,
    /// Attention score buffer, `n_heads * seq_len`
    pub att: usize,
    /// Output logits buffer
    pub logits: usize,
    /// Each of the key and value caches,
    /// `n_layers * seq_len * n_kv_heads * head_dim`
    pub cache: usize,
}

impl WorkspaceDims {
    /// Compute all buffer sizes, rejecting configs whose cache extent
    /// overflows the addressable range.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let q = config.head_dim.checked_mul(config.n_heads);
        let kv = config.head_dim.checked_mul(config.n_kv_heads);
        let att = config.n_heads.checked_mul(config.seq_len);
        let cache = kv
            .and_then(|kv| kv.checked_mul(config.seq_len))
            .and_then(|per_layer| per_layer.checked_mul(config.n_layers));

        match (q, kv, att, cache) {
            (Some(q), Some(kv), Some(att), Some(cache)) => Ok(Self {
                activation: config.dim,
                hidden: config.hidden_dim,
                q,
                kv,
                att,
                logits: config.vocab_size,
                cache,
            }),
            _ => Err(CoreError::InvalidConfig {
                field: "seq_len",
                reason: "workspace extent overflows the addressable range".to_string(),
            }),
        }
    }
}

/// The mutable scratch buffers for one model instance.
///
/// Allocated once at model construction, zero-initialized, and owned
/// exclusively; the key/value caches span all layers and sequence
/// positions and are populated by the external forward pass.
#[derive(Debug)]
pub struct RunState {
    /// Activation at the current timestep
    pub x: Vec<f32>,
    /// General-purpose activation buffer
    pub xb: Vec<f32>,
    /// General-purpose activation buffer
    pub xb2: Vec<f32>,
    /// General-purpose activation buffer
    pub xb3: Vec<f32>,
    /// Feed-forward hidden buffer
    pub hb: Vec<f32>,
    /// Feed-forward hidden buffer
    pub hb2: Vec<f32>,
    /// Query projection at the current timestep
    pub q: Vec<f32>,
    /// Key projection at the current timestep
    pub k: Vec<f32>,
    /// Value projection at the current timestep
    pub v: Vec<f32>,
    /// Attention scores, one row per head
    pub att: Vec<f32>,
    /// Output logits
    pub logits: Vec<f32>,
    /// Key cache over all layers and positions
    pub key_cache: Vec<f32>,
    /// Value cache over all layers and positions
    pub value_cache: Vec<f32>,
}

/// Allocate one zeroed buffer, surfacing allocation failure instead of
/// aborting. On error, buffers allocated earlier drop with the caller's
/// partially built state.
fn zeroed(buffer: &'static str, elements: usize) -> Result<Vec<f32>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(elements)
        .map_err(|_| CoreError::OutOfMemory { buffer, elements })?;
    buf.resize(elements, 0.0);
    Ok(buf)
}

impl RunState {
    /// Allocate the full workspace for `config`.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        config.validate()?;
        let dims = WorkspaceDims::from_config(config)?;

        let state = Self {
            x: zeroed("x", dims.activation)?,
            xb: zeroed("xb", dims.activation)?,
            xb2: zeroed("xb2", dims.activation)?,
            xb3: zeroed("xb3", dims.activation)?,
            hb: zeroed("hb", dims.hidden)?,
            hb2: zeroed("hb2", dims.hidden)?,
            q: zeroed("q", dims.q)?,
            k: zeroed("k", dims.kv)?,
            v: zeroed("v", dims.kv)?,
            att: zeroed("att", dims.att)?,
            logits: zeroed("logits", dims.logits)?,
            key_cache: zeroed("key_cache", dims.cache)?,
            value_cache: zeroed("value_cache", dims.cache)?,
        };

        debug!(
            cache_elements = dims.cache,
            logits = dims.logits,
            "allocated inference workspace"
        );

        Ok(state)
    }
}
