use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{
    batcher::{Batcher, Train},
    vocab::UnknownTagError,
    Item,
};

/// Batch loading configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Number of sentences per batch; the final batch of a pass may be smaller
    pub batch_size: usize,

    /// Reshuffle the split with a fresh permutation on every pass
    pub shuffle: bool,

    /// Fixed RNG seed for reproducible shuffle sequences
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            seed: None,
        }
    }
}

/// Batch generation was requested on a split with zero sentences
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot batch an empty split")]
pub struct EmptySplitError;

/// Streams padded training batches over one split
///
/// Each call to [`Loader::iter`] is one full pass: every sentence of the
/// split lands in exactly one batch. With shuffling enabled, every pass draws
/// its own permutation.
pub struct Loader<I: Item> {
    items: Vec<I>,
    batcher: Batcher,
    config: Config,
    rng: StdRng,
}

impl<I: Item> Loader<I> {
    /// Creates a loader over the given split
    pub fn new<D: Dataset<I>>(
        split: &D,
        batcher: Batcher,
        config: Config,
    ) -> Result<Self, EmptySplitError> {
        assert!(config.batch_size > 0, "batch_size must be positive");

        let items: Vec<I> = split.iter().collect();
        if items.is_empty() {
            return Err(EmptySplitError);
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            items,
            batcher,
            config,
            rng,
        })
    }

    /// Starts a fresh pass over the split
    pub fn iter(&mut self) -> Batches<'_, I> {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        if self.config.shuffle {
            order.shuffle(&mut self.rng);
        }

        Batches {
            items: &self.items,
            batcher: &self.batcher,
            batch_size: self.config.batch_size,
            order,
            cursor: 0,
        }
    }

    /// The number of batches a single pass yields
    pub fn num_batches(&self) -> usize {
        self.items.len().div_ceil(self.config.batch_size)
    }

    /// The number of sentences in the split
    pub fn num_items(&self) -> usize {
        self.items.len()
    }
}

/// A single lazy pass over a split, yielding one encoded batch at a time
pub struct Batches<'a, I: Item> {
    items: &'a [I],
    batcher: &'a Batcher,
    batch_size: usize,
    order: Vec<usize>,
    cursor: usize,
}

impl<'a, I: Item> Iterator for Batches<'a, I> {
    type Item = Result<Train, UnknownTagError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }

        let end = (self.cursor + self.batch_size).min(self.order.len());
        let group: Vec<I> = self.order[self.cursor..end]
            .iter()
            .map(|&i| self.items[i].clone())
            .collect();
        self.cursor = end;

        Some(self.batcher.batch(&group))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        datasets::conll,
        pipelines::token_classification::vocab::{TagVocab, TokenVocab},
    };

    use super::*;

    fn split(n: usize) -> conll::Dataset {
        let items = (0..n)
            .map(|i| conll::Item::new(vec![format!("w{}", i)], vec!["O".to_string()]))
            .collect();

        conll::Dataset::from_items(items)
    }

    fn loader(n: usize, config: Config) -> Loader<conll::Item> {
        let train = split(n);
        let batcher = Batcher::new(TokenVocab::build(&train, None), TagVocab::build(&train));

        Loader::new(&split(n), batcher, config).unwrap()
    }

    fn config(batch_size: usize, shuffle: bool) -> Config {
        Config {
            batch_size,
            shuffle,
            seed: Some(42),
        }
    }

    #[test]
    fn partitions_the_split_into_ceil_n_over_b_batches() {
        let mut loader = loader(10, config(4, false));

        assert_eq!(loader.num_batches(), 3);

        let sizes: Vec<usize> = loader
            .iter()
            .map(|batch| batch.unwrap().lengths.len())
            .collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn preserves_order_without_shuffling() {
        let mut loader = loader(10, config(4, false));

        let first: Vec<Vec<usize>> = loader.iter().next().unwrap().unwrap().tokens;

        // w0..w3 sit at indices 2..=5, after the reserved pad/unk entries
        assert_eq!(first, vec![vec![2], vec![3], vec![4], vec![5]]);
    }

    #[test]
    fn every_sentence_appears_exactly_once_per_pass() {
        let mut loader = loader(25, config(4, true));

        let mut seen: Vec<usize> = loader
            .iter()
            .flat_map(|batch| {
                let batch = batch.unwrap();
                batch
                    .tokens
                    .into_iter()
                    .zip(batch.lengths)
                    .flat_map(|(row, len)| row.into_iter().take(len))
                    .collect::<Vec<_>>()
            })
            .collect();
        seen.sort_unstable();

        let expected: Vec<usize> = (2..27).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn shuffled_passes_use_independent_permutations() {
        let mut first_loader = loader(30, config(30, true));

        let first: Vec<Vec<usize>> = first_loader.iter().next().unwrap().unwrap().tokens;
        let second: Vec<Vec<usize>> = first_loader.iter().next().unwrap().unwrap().tokens;

        assert_ne!(first, second);

        // The same seed reproduces the same shuffle sequence
        let mut replay = loader(30, config(30, true));
        assert_eq!(replay.iter().next().unwrap().unwrap().tokens, first);
    }

    #[test]
    fn rejects_an_empty_split() {
        let train = split(3);
        let batcher = Batcher::new(TokenVocab::build(&train, None), TagVocab::build(&train));

        let result = Loader::new(&conll::Dataset::from_items(vec![]), batcher, config(4, false));

        assert_eq!(result.err(), Some(EmptySplitError));
    }
}
