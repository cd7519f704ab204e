//! Sequence tagging over pre-tokenized sentences: frozen vocabularies map
//! surface tokens and BIO tags to dense indices, and the loader streams
//! shuffled, padded batches for an external model.

/// Batcher
pub mod batcher;

/// Token Classification Items
pub mod item;

/// Per-epoch batch loading
pub mod loader;

/// Token and tag vocabularies
pub mod vocab;

pub use batcher::{Batcher, Train};
pub use item::Item;
pub use loader::{Config, EmptySplitError, Loader};
pub use vocab::{TagVocab, TokenVocab, UnknownTagError};
