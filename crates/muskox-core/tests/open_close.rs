//! End-to-end tests over a synthetic checkpoint file
//!
//! These tests build a complete on-disk checkpoint (opaque header plus an
//! exactly sized f32 payload), load it through `Model::open`, and verify
//! the weight views, workspace, and teardown behavior together.

use std::io::Write;
use tempfile::NamedTempFile;

use muskox_core::{CoreError, Model, ModelConfig};

const HEADER_LEN: usize = 32;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn tiny_config() -> ModelConfig {
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

/// Write a checkpoint with an opaque header and an indexed f32 payload
/// sized for `config`, padded or truncated by `extra` elements.
fn write_checkpoint(config: &ModelConfig, extra: isize) -> NamedTempFile {
    let total = config.total_weight_elements().unwrap();
    let elements = (total as isize + extra) as usize;
    let payload: Vec<f32> = (0..elements).map(|i| i as f32).collect();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[0x5Au8; HEADER_LEN]).unwrap();
    file.write_all(bytemuck::cast_slice(&payload)).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn open_builds_weights_and_workspace() {
    init_tracing();
    let config = tiny_config();
    let file = write_checkpoint(&config, 0);

    let model = Model::open(file.path(), config, HEADER_LEN as u64).unwrap();

    // First payload element belongs to the classifier projection.
    assert_eq!(model.weights().cls()[0], 0.0);
    assert_eq!(model.weights().cls().len(), 32 * 8);
    assert_eq!(model.weights().ffn_up(1).len(), 8 * 16);

    assert_eq!(model.state().logits.len(), 32);
    assert_eq!(model.state().key_cache.len(), 2 * 10 * 2 * 4);
    assert_eq!(model.config().n_layers, 2);
}

#[test]
fn forward_pass_can_mutate_workspace() {
    let config = tiny_config();
    let file = write_checkpoint(&config, 0);

    let mut model = Model::open(file.path(), config, HEADER_LEN as u64).unwrap();

    // Stand in for the external forward pass: populate a cache position.
    let kv_dim = config.kv_dim();
    model.state_mut().key_cache[3 * kv_dim] = 1.5;
    assert_eq!(model.state().key_cache[3 * kv_dim], 1.5);

    // Weight views stay readable while the workspace is mutated.
    assert_eq!(model.weights().final_norm().len(), 8);
}

#[test]
fn close_releases_the_mapping_exactly_once() {
    init_tracing();
    let config = tiny_config();
    let file = write_checkpoint(&config, 0);

    let model = Model::open(file.path(), config, HEADER_LEN as u64).unwrap();

    // Hold one extra view so the mapping's handle count stays observable
    // after the model is gone.
    let probe = model.checkpoint().view(0, 1).unwrap();
    // checkpoint + 14 role views + probe
    assert_eq!(probe.mapping_refs(), 16);

    model.close();
    assert_eq!(probe.mapping_refs(), 1);
    assert_eq!(probe.as_f32(), &[0.0]);
}

#[test]
fn short_payload_fails_without_leaking_the_mapping() {
    let config = tiny_config();
    let file = write_checkpoint(&config, -4);

    match Model::open(file.path(), config, HEADER_LEN as u64) {
        Err(CoreError::LayoutMismatch { expected, actual }) => {
            assert_eq!(expected, config.total_weight_elements().unwrap());
            assert_eq!(actual, expected - 4);
        }
        other => panic!("expected LayoutMismatch, got {other:?}"),
    }
}

#[test]
fn oversized_payload_fails_with_layout_mismatch() {
    let config = tiny_config();
    let file = write_checkpoint(&config, 12);

    match Model::open(file.path(), config, HEADER_LEN as u64) {
        Err(CoreError::LayoutMismatch { .. }) => {}
        other => panic!("expected LayoutMismatch, got {other:?}"),
    }
}

#[test]
fn missing_checkpoint_fails_with_map_error() {
    match Model::open("/no/such/model.bin", tiny_config(), 0) {
        Err(CoreError::Checkpoint(muskox_checkpoint::Error::MapFailed { .. })) => {}
        other => panic!("expected MapFailed, got {other:?}"),
    }
}

#[test]
fn invalid_config_is_rejected_before_mapping() {
    let mut config = tiny_config();
    config.seq_len = 0;

    // The path does not exist; a config error proves validation ran first.
    match Model::open("/no/such/model.bin", config, 0) {
        Err(CoreError::InvalidConfig { field: "seq_len", .. }) => {}
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}
