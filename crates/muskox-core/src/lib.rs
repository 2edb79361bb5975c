//! Muskox Core - model loading and inference workspace
//!
//! This crate resolves a mapped checkpoint payload into named weight
//! tensors, allocates the per-inference scratch workspace, and composes
//! both into a [`Model`] handle with a single teardown. The forward pass
//! itself lives outside this crate and consumes what is built here.

pub mod config;
pub mod model;
pub mod state;
pub mod weights;

use thiserror::Error;

/// Errors surfaced while building or tearing down a model
#[derive(Error, Debug)]
pub enum CoreError {
    /// Mapping or reinterpreting the checkpoint failed
    #[error(transparent)]
    Checkpoint(#[from] muskox_checkpoint::Error),

    /// A hyperparameter violates the config invariants
    #[error("invalid config: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// Computed tensor extents disagree with the payload length
    #[error(
        "weight layout mismatch: config requires {expected} f32 elements, payload has {actual}"
    )]
    LayoutMismatch { expected: usize, actual: usize },

    /// A workspace buffer could not be allocated
    #[error("out of memory allocating workspace buffer '{buffer}' ({elements} f32 elements)")]
    OutOfMemory {
        buffer: &'static str,
        elements: usize,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;

// Re-export key types at the crate root
pub use config::ModelConfig;
pub use model::Model;
pub use state::{RunState, WorkspaceDims};
pub use weights::Weights;
