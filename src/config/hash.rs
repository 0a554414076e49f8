//! Configuration hashing for change detection.
//!
//! Hashes are computed over the identity-free form of a tree, so a desired
//! tree and the observed tree it produced hash the same.

use sha2::{Digest, Sha256};

use super::tree::{ApplicationTree, Identified};

/// Hasher for configuration trees.
#[derive(Debug, Default)]
pub struct ConfigHasher;

impl ConfigHasher {
    /// Creates a new hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the hash of a tree, ignoring identities and computed fields.
    #[must_use]
    pub fn hash_tree(&self, tree: &ApplicationTree) -> String {
        let canonical = canonical(tree);
        // Serialization of plain data structs cannot fail.
        let bytes = serde_json::to_vec(&canonical).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }

    /// Returns a short (12-char) version of a hash for display.
    #[must_use]
    pub fn short_hash(hash: &str) -> &str {
        &hash[..12.min(hash.len())]
    }

    /// Checks if two hashes match.
    #[must_use]
    pub fn hashes_match(hash1: &str, hash2: &str) -> bool {
        hash1 == hash2
    }
}

fn canonical(tree: &ApplicationTree) -> ApplicationTree {
    let mut canonical = tree.clone();
    canonical.start_application = false;
    canonical.force_stop = false;
    canonical.cloudwatch_logging_options = canonical
        .cloudwatch_logging_options
        .as_ref()
        .map(Identified::without_identity);

    if let Some(config) = canonical.application_configuration.as_mut() {
        config.vpc_configuration = config.vpc_configuration.as_ref().map(Identified::without_identity);
        config.environment_properties = config.environment_properties.as_ref().map(|e| e.normalized());
        config.flink_application_configuration = config
            .flink_application_configuration
            .as_ref()
            .map(|f| f.normalized());

        if let Some(sql) = config.sql_application_configuration.as_mut() {
            sql.input = sql.input.as_ref().map(Identified::without_identity);
            sql.reference_data_source = sql
                .reference_data_source
                .as_ref()
                .map(Identified::without_identity);
            let mut outputs: Vec<_> = sql.outputs.iter().map(Identified::without_identity).collect();
            outputs.sort_by(|a, b| a.name.cmp(&b.name));
            sql.outputs = outputs;
        }
    }

    canonical
}
