//! In-memory store implementations.
//!
//! Thread-safe via `DashMap`, no persistence. Suitable for tests,
//! development, and embedding hosts that persist elsewhere; production
//! deployments use the RocksDB-backed store from `ttp-atlas-storage`.

mod in_memory_assignments;
mod in_memory_ledger;
mod in_memory_taxonomy;


pub use in_memory_assignments::InMemoryAssignmentStore;
pub use in_memory_ledger::InMemoryFeedbackLedger;
pub use in_memory_taxonomy::InMemoryTaxonomyStore;
