//! TTP Atlas Storage Layer
//!
//! Persistent storage for taxonomy versions, assignment revisions, and the
//! feedback ledger, using RocksDB as the underlying engine.
//!
//! # Architecture
//! - `column_families`: column family definitions and tuning
//! - `serialization`: bincode record serialization and composite key codecs
//! - `rocksdb_backend`: `RocksDbAtlasStore` implementing the three core
//!   store traits

pub mod column_families;
pub mod rocksdb_backend;
pub mod serialization;

// Re-export column family helpers for storage consumers
pub use column_families::{cf_names, get_column_family_descriptors};

pub use rocksdb_backend::{RocksDbAtlasStore, StorageError};
pub use serialization::SerializationError;
