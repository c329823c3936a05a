//! RocksDB column family definitions.
//!
//! Column families provide logical separation of the three persisted
//! record kinds plus system metadata, and let each get its own access
//! tuning.
//!
//! # Column Families (4 total)
//! | Name | Key Format | Optimization |
//! |------|------------|--------------|
//! | taxonomy_versions | version (u32 BE, 4 bytes) | Bloom filter, cache |
//! | assignments | document uuid (16) + revision (u32 BE) | 16-byte prefix extractor |
//! | feedback | document uuid (16) + millis (8) + seq (u64 BE) | 16-byte prefix extractor |
//! | system | string key | No compression |
//!
//! # Shared Block Cache
//! All column families share a single block cache for predictable memory
//! usage; the size comes from `StorageConfig::cache_size_mb`.

use rocksdb::{BlockBasedOptions, Cache, ColumnFamilyDescriptor, Options, SliceTransform};

/// Column family name constants.
pub mod cf_names {
    /// Published taxonomy snapshots keyed by version number.
    pub const TAXONOMY_VERSIONS: &str = "taxonomy_versions";

    /// Assignment revisions keyed by (document, revision).
    pub const ASSIGNMENTS: &str = "assignments";

    /// Feedback events keyed by (document, timestamp, sequence).
    pub const FEEDBACK: &str = "feedback";

    /// System metadata (latest taxonomy version, decision counter).
    pub const SYSTEM: &str = "system";

    /// All column family names.
    pub const ALL: &[&str] = &[TAXONOMY_VERSIONS, ASSIGNMENTS, FEEDBACK, SYSTEM];
}

/// System CF keys.
pub mod system_keys {
    /// Latest published taxonomy version (u32 BE).
    pub const LATEST_TAXONOMY_VERSION: &str = "latest_taxonomy_version";

    /// Highest decision sequence ever appended (u64 BE).
    pub const LAST_DECISION_SEQ: &str = "last_decision_seq";
}

/// Options for the taxonomy versions family: point lookups by version.
fn taxonomy_options(cache: &Cache) -> Options {
    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_block_cache(cache);
    block_opts.set_bloom_filter(10.0, false);

    let mut opts = Options::default();
    opts.set_block_based_table_factory(&block_opts);
    opts
}

/// Options for per-document range-scan families (assignments, feedback):
/// a 16-byte prefix extractor makes one document's records a single
/// prefix scan.
fn document_scan_options(cache: &Cache) -> Options {
    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_block_cache(cache);
    block_opts.set_bloom_filter(10.0, false);

    let mut opts = Options::default();
    opts.set_block_based_table_factory(&block_opts);
    opts.set_prefix_extractor(SliceTransform::create_fixed_prefix(16));
    opts
}

/// Options for the system family: tiny, rarely accessed, no compression.
fn system_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::None);
    opts
}

/// Build descriptors for all column families sharing one block cache.
#[must_use]
pub fn get_column_family_descriptors(cache_size_bytes: usize) -> Vec<ColumnFamilyDescriptor> {
    let cache = Cache::new_lru_cache(cache_size_bytes);
    vec![
        ColumnFamilyDescriptor::new(cf_names::TAXONOMY_VERSIONS, taxonomy_options(&cache)),
        ColumnFamilyDescriptor::new(cf_names::ASSIGNMENTS, document_scan_options(&cache)),
        ColumnFamilyDescriptor::new(cf_names::FEEDBACK, document_scan_options(&cache)),
        ColumnFamilyDescriptor::new(cf_names::SYSTEM, system_options()),
    ]
}
