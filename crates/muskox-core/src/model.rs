//! Model lifecycle
//!
//! A [`Model`] ties together the hyperparameters, the resolved weight
//! views, the mapped checkpoint they borrow from, and the inference
//! workspace. Construction acquires everything or nothing; teardown is a
//! single consuming [`Model::close`].

use std::path::Path;
use tracing::info;

use muskox_checkpoint::Checkpoint;

use crate::config::ModelConfig;
use crate::state::RunState;
use crate::weights::Weights;
use crate::Result;

/// A fully loaded model: config, mapped weights, and workspace.
#[derive(Debug)]
pub struct Model {
    config: ModelConfig,
    checkpoint: Checkpoint,
    weights: Weights,
    state: RunState,
}

impl Model {
    /// Open the checkpoint at `path` and build a ready-to-run model.
    ///
    /// `data_offset` is the container header length in bytes, supplied by
    /// the external header parser alongside `config`. If any stage fails,
    /// everything acquired so far is released before the error returns;
    /// in particular a mapping that outlived a failed layout resolution
    /// does not leak.
    pub fn open<P: AsRef<Path>>(path: P, config: ModelConfig, data_offset: u64) -> Result<Self> {
        config.validate()?;

        let checkpoint = Checkpoint::open(path.as_ref(), data_offset)?;
        let weights = Weights::resolve(&config, &checkpoint)?;
        let state = RunState::new(&config)?;

        info!(
            path = %path.as_ref().display(),
            layers = config.n_layers,
            payload_elements = checkpoint.payload_elements(),
            "model loaded"
        );

        Ok(Self {
            config,
            checkpoint,
            weights,
            state,
        })
    }

    /// The model hyperparameters.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// The resolved weight tensors.
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// The inference workspace.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Mutable access to the inference workspace for the forward pass.
    pub fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }

    /// The underlying mapped checkpoint.
    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    /// Tear the model down: frees every workspace buffer and drops the
    /// weight views and the mapping. Consuming `self` makes use after
    /// close unrepresentable.
    pub fn close(self) {
        info!(layers = self.config.n_layers, "model closed");
    }
}
