//! TTP Atlas Core Library
//!
//! Provides the domain types, traits, and in-memory store implementations
//! for the TTP Atlas classification and ontology-mapping core.
//!
//! # Architecture
//!
//! This crate defines:
//! - Domain types (`Technique`, `TaxonomyVersion`, `EmbeddingRecord`,
//!   `Assignment`, `FeedbackEvent`, etc.)
//! - Store traits (`TaxonomyStore`, `AssignmentStore`, `FeedbackLedger`)
//! - The embedding ingest adapter and its schema registry
//! - Error types and result aliases
//! - Configuration structures
//!
//! # Example
//!
//! ```
//! use ttp_atlas_core::types::{Modality, TechniqueId};
//!
//! let id = TechniqueId::new("T1059.001").unwrap();
//! assert!(id.is_subtechnique());
//! assert_eq!(Modality::Code.as_str(), "code");
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod similarity;
pub mod stubs;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::{CoreError, CoreResult, RejectionError};
pub use ingest::{EmbeddingIngestAdapter, EmbeddingSchemaRegistry};
