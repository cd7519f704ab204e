/// Token Classification
pub mod token_classification;
