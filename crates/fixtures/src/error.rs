//! Error taxonomy for fixture generation.
//!
//! Every variant except those wrapped from sinks is fatal for the run: generation
//! is deterministic and local, so nothing here is retried.

use std::path::PathBuf;

use catalog_identity::IdentityError;
use thiserror::Error;

use crate::sink::SinkError;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No synthesizer for type {type_name} (field {entity_type}.{field})")]
    UnsupportedFieldType {
        entity_type: String,
        field: String,
        type_name: String,
    },

    #[error("Cannot create the first primary source: no bootstrap placeholder configured")]
    MissingPrimarySourceBootstrap,

    #[error("Failed to load vocabulary from {}: {reason}", path.display())]
    VocabularyLoadFailure { path: PathBuf, reason: String },

    #[error("Pattern {0:?} draws from a vocabulary, but no vocabulary file is configured")]
    VocabularyMissing(String),

    #[error("Unknown pattern {0:?}")]
    UnknownPattern(String),

    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown entity type {0:?}")]
    UnknownEntityType(String),

    #[error(
        "Seed ranges of {first} and {second} are {spacing} apart, need more than {required}"
    )]
    SeedRangeOverlap {
        first: String,
        second: String,
        spacing: u64,
        required: u64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{entity_type}.{field} failed validation: {reason}")]
    InvalidEntity {
        entity_type: String,
        field: String,
        reason: String,
    },

    #[error("Temporal value out of range: {0}")]
    Temporal(String),

    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
