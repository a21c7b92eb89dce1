//! Content category of a file.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad category used for icons and the storage breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Raster images.
    Image,
    /// Plain-text and markdown documents.
    Document,
    /// Tabular data.
    Spreadsheet,
    /// PDF documents.
    Pdf,
    /// Source code and markup.
    Code,
    /// Word processor documents.
    Word,
    /// Anything else.
    Other,
}

impl ContentType {
    /// Classify a file by the extension of its name.
    pub fn from_file_name(name: &str) -> Self {
        let extension = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return Self::Other,
        };

        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" => Self::Image,
            "pdf" => Self::Pdf,
            "doc" | "docx" => Self::Word,
            "xls" | "xlsx" | "csv" => Self::Spreadsheet,
            "js" | "ts" | "html" | "css" | "json" | "php" | "py" => Self::Code,
            "txt" | "md" => Self::Document,
            _ => Self::Other,
        }
    }

    /// Lowercase name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Spreadsheet => "spreadsheet",
            Self::Pdf => "pdf",
            Self::Code => "code",
            Self::Word => "word",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
