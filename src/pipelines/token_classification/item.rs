use std::fmt::Debug;

/// A trait for items that can be used for token classification
pub trait Item: Send + Sync + Clone + Debug {
    /// Returns the surface tokens of the sentence
    fn tokens(&self) -> Vec<&str>;

    /// Returns the BIO tag labels, one per token
    fn tags(&self) -> Vec<&str>;
}
