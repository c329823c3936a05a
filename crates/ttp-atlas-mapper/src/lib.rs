//! TTP Atlas Ontology Mapper
//!
//! Resolves ranked classifier candidates into committed, versioned
//! technique assignments:
//!
//! - acceptance threshold and tie-band policy (multi-technique assignments
//!   when candidates are co-equal);
//! - deprecation substitution through the taxonomy store, with provenance;
//! - drop-and-warn degradation for unresolvable candidates;
//! - atomic, monotonically-revisioned commits (append-only history per
//!   document).
//!
//! The [`service::AtlasService`] wires the ingest adapter, classifier
//! engine, mapper, and feedback ledger into the idempotent entry points
//! the orchestrator calls.

pub mod mapper;
pub mod policy;
pub mod service;

pub use mapper::OntologyMapper;
pub use service::AtlasService;
