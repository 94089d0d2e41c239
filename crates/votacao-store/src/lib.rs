//! votacao-store: Storage adapters and configuration.
//!
//! Implements the `StorageAdapter` trait for an in-memory store and a JSON
//! state file, and loads `votacao.toml` into the settings the engine and
//! server run with.

pub mod config;
pub mod error;
pub mod json_file;
pub mod memory;

pub use config::{
    create_storage, load_config, load_config_from, parse_config, StorageConfig, VotacaoConfig,
};
pub use error::StoreError;
pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;
