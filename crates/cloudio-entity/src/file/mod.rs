//! File domain entities.

pub mod content_type;
pub mod model;

pub use content_type::ContentType;
pub use model::File;
