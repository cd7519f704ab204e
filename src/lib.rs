//! # NER Corpus
//!
//! The data layer for training BIO-scheme named entity recognition models:
//! CoNLL-style corpus ingestion, frozen token/tag vocabularies, and padded,
//! index-encoded mini-batches ready for an external sequence-tagging model.
#![forbid(unsafe_code)]

/// Datasets
pub mod datasets;

/// Pipelines
pub mod pipelines;

/// Utilities
pub mod utils;
