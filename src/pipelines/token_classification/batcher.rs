use derive_new::new;

use super::{
    vocab::{TagVocab, TokenVocab, UnknownTagError},
    Item,
};

/// A training batch for token classification
///
/// All three grids share the same shape: one row per sentence, padded to the
/// longest sentence in the batch. `lengths` records each row's true length,
/// so a consumer can mask the padding back out.
#[derive(Clone, Debug, PartialEq, Eq, new)]
pub struct Train {
    /// Token indices for the batch
    pub tokens: Vec<Vec<usize>>,

    /// Per-token capitalization flags (1 when the stored token starts with
    /// an uppercase letter)
    pub caps: Vec<Vec<u8>>,

    /// Tag indices for the batch, the training targets
    pub targets: Vec<Vec<usize>>,

    /// True (unpadded) length of each sentence
    pub lengths: Vec<usize>,
}

/// Encodes groups of sentences against the frozen vocabularies
#[derive(Clone, new)]
pub struct Batcher {
    /// The frozen token vocabulary
    pub tokens: TokenVocab,

    /// The frozen tag vocabulary
    pub tags: TagVocab,
}

impl Batcher {
    /// Collects a group of items into a padded training batch
    pub fn batch<I: Item>(&self, items: &[I]) -> Result<Train, UnknownTagError> {
        let batch_size = items.len();
        let max_len = items.iter().map(|item| item.tokens().len()).max().unwrap_or(0);

        let mut token_ids_list = Vec::with_capacity(batch_size);
        let mut caps_list = Vec::with_capacity(batch_size);
        let mut tag_ids_list = Vec::with_capacity(batch_size);
        let mut lengths = Vec::with_capacity(batch_size);

        for item in items {
            let tokens = item.tokens();
            lengths.push(tokens.len());

            let mut token_ids: Vec<usize> =
                tokens.iter().map(|token| self.tokens.encode(token)).collect();

            let mut caps: Vec<u8> = tokens
                .iter()
                .map(|token| u8::from(capitalized(token)))
                .collect();

            let mut tag_ids = item
                .tags()
                .iter()
                .map(|tag| self.tags.encode(tag))
                .collect::<Result<Vec<_>, _>>()?;

            token_ids.resize(max_len, self.tokens.pad_id());
            caps.resize(max_len, 0);
            tag_ids.resize(max_len, self.tags.pad_id());

            token_ids_list.push(token_ids);
            caps_list.push(caps);
            tag_ids_list.push(tag_ids);
        }

        Ok(Train::new(token_ids_list, caps_list, tag_ids_list, lengths))
    }
}

fn capitalized(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}
