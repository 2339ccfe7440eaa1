pub mod json;

pub use json::{export_catalog, load_catalog, parse_catalog};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog must be a JSON array of entries")]
    NotAnArray,

    #[error("Catalog entry {entry} is not an object")]
    NotAnObject { entry: String },

    #[error("Catalog entry {entry} is missing required field `{field}`")]
    MissingField { entry: String, field: &'static str },

    #[error("Catalog entry {entry} is invalid: {source}")]
    InvalidEntry {
        entry: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog entry {entry} repeats id {id}")]
    DuplicateId { entry: String, id: String },
}
