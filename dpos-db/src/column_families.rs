//! Column family definitions for the consensus database
//!
//! This module defines the column families used to organize data
//! in the key-value store.

/// Column family names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFamily {
    /// Misc pointers (confirmed head, canonical head)
    Default,
    /// Block headers storage (block_hash -> bincode(Header))
    Headers,
    /// Block number to hash index (big-endian block_number -> block_hash)
    Indices,
    /// DPoS context snapshots (context_root -> bincode(DposContext))
    Contexts,
}

impl ColumnFamily {
    /// Get the string name for this column family
    pub fn name(&self) -> &'static str {
        match self {
            ColumnFamily::Default => "default",
            ColumnFamily::Headers => "headers",
            ColumnFamily::Indices => "indices",
            ColumnFamily::Contexts => "contexts",
        }
    }

    /// Get all column families
    pub fn all() -> &'static [ColumnFamily] {
        &[
            ColumnFamily::Default,
            ColumnFamily::Headers,
            ColumnFamily::Indices,
            ColumnFamily::Contexts,
        ]
    }

    /// Get column family from name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(ColumnFamily::Default),
            "headers" => Some(ColumnFamily::Headers),
            "indices" => Some(ColumnFamily::Indices),
            "contexts" => Some(ColumnFamily::Contexts),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColumnFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
