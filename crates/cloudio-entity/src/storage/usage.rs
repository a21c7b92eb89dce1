//! Storage usage summary for one user.

use serde::{Deserialize, Serialize};

use crate::file::ContentType;

/// Bytes used by one content category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeUsage {
    /// The category.
    pub content_type: ContentType,
    /// Total bytes of files in this category.
    pub size: u64,
    /// Share of the user's total usage, rounded to a whole percent.
    pub percentage: u8,
}

/// Usage information shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUsage {
    /// Total bytes across all of the user's files.
    pub storage_used: u64,
    /// Quota in bytes.
    pub storage_limit: u64,
    /// `storage_used / storage_limit`, rounded and capped at 100.
    pub storage_percentage: u8,
    /// Number of file records.
    pub file_count: u64,
    /// Number of folder records.
    pub folder_count: u64,
    /// Per-category breakdown, largest first.
    pub type_distribution: Vec<TypeUsage>,
}

impl StorageUsage {
    /// Build a summary from per-category totals.
    ///
    /// `by_type` holds `(category, total bytes, file count)` tuples.
    pub fn new(
        storage_limit: u64,
        folder_count: u64,
        by_type: impl IntoIterator<Item = (ContentType, u64, u64)>,
    ) -> Self {
        let by_type: Vec<_> = by_type.into_iter().collect();
        let storage_used: u64 = by_type.iter().map(|(_, size, _)| size).sum();
        let file_count: u64 = by_type.iter().map(|(_, _, count)| count).sum();

        let mut type_distribution: Vec<TypeUsage> = by_type
            .into_iter()
            .map(|(content_type, size, _)| TypeUsage {
                content_type,
                size,
                percentage: percent_of(size, storage_used),
            })
            .collect();
        type_distribution.sort_by(|a, b| {
            b.size
                .cmp(&a.size)
                .then_with(|| a.content_type.cmp(&b.content_type))
        });

        Self {
            storage_used,
            storage_limit,
            storage_percentage: percent_of(storage_used, storage_limit),
            file_count,
            folder_count,
            type_distribution,
        }
    }

    /// Check if the quota is exceeded.
    pub fn is_exceeded(&self) -> bool {
        self.storage_used > self.storage_limit
    }
}

/// Rounded percentage of `part` in `whole`, capped at 100. Zero when `whole` is zero.
fn percent_of(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    let pct = ((part as f64 / whole as f64) * 100.0).round();
    pct.min(100.0) as u8
}
