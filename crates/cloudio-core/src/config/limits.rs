//! Guards against pathological folder trees.

use serde::{Deserialize, Serialize};

/// Upper bounds applied by the tree walks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of `parent_id` hops followed before a chain is
    /// treated as corrupt.
    #[serde(default = "default_max_depth")]
    pub max_tree_depth: usize,
    /// Maximum number of folders a single subtree enumeration may visit.
    #[serde(default = "default_max_descendants")]
    pub max_descendants: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_tree_depth: default_max_depth(),
            max_descendants: default_max_descendants(),
        }
    }
}

fn default_max_depth() -> usize {
    1024
}

fn default_max_descendants() -> usize {
    100_000
}
