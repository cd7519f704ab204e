use std::{
    collections::{BTreeSet, HashMap},
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use burn::data::dataset::Dataset;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::Item;

/// Reserved padding symbol, always index 0
pub static PAD_TOKEN: &str = "<pad>";

/// Reserved unknown-token symbol, always index 1 in the token vocabulary
pub static UNK_TOKEN: &str = "<unk>";

/// A tag observed at encode time with no entry in the frozen tag vocabulary
///
/// Tags are strict where tokens are lenient: the tag set is fixed externally,
/// so an unseen tag is a data error rather than something to absorb.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown tag {0:?}")]
pub struct UnknownTagError(pub String);

/// Errors raised while persisting or restoring a vocabulary
#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    /// The vocabulary file could not be read or written
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The vocabulary file did not contain valid JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// An insertion-ordered bidirectional string <-> index mapping
///
/// Index assignment follows first-seen order, so two builds over the same
/// ordered input produce identical assignments.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
struct StringIndex {
    entries: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl StringIndex {
    fn insert(&mut self, entry: &str) -> usize {
        if let Some(&id) = self.index.get(entry) {
            return id;
        }

        let id = self.entries.len();
        self.entries.push(entry.to_string());
        self.index.insert(entry.to_string(), id);

        id
    }

    fn get(&self, entry: &str) -> Option<usize> {
        self.index.get(entry).copied()
    }

    // The reverse map is dropped during serialization; rebuild it after load
    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(id, entry)| (entry.clone(), id))
            .collect();
    }
}

fn save<T: Serialize>(value: &T, path: &Path) -> Result<(), PersistError> {
    let f = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(f), value)?;

    Ok(())
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    let f = File::open(path)?;

    Ok(serde_json::from_reader(BufReader::new(f))?)
}

/// The frozen token vocabulary
///
/// Built from the training split only. Tokens never seen during construction
/// encode to the reserved unknown index rather than failing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenVocab {
    inner: StringIndex,
}

impl TokenVocab {
    /// Builds the vocabulary from the train split in first-seen order,
    /// optionally unioned with surface forms from a pretrained embedding
    /// vocabulary (supplied pre-parsed; embedding files are not read here)
    pub fn build<I, D>(train: &D, pretrained: Option<&BTreeSet<String>>) -> Self
    where
        I: Item,
        D: Dataset<I>,
    {
        let mut inner = StringIndex::default();
        inner.insert(PAD_TOKEN);
        inner.insert(UNK_TOKEN);

        for item in train.iter() {
            for token in item.tokens() {
                inner.insert(token);
            }
        }

        if let Some(extra) = pretrained {
            for token in extra {
                inner.insert(token);
            }
        }

        log::debug!("built token vocabulary with {} entries", inner.entries.len());

        Self { inner }
    }

    /// Maps a token to its index, falling back to the unknown index
    pub fn encode(&self, token: &str) -> usize {
        self.inner.get(token).unwrap_or(self.unk_id())
    }

    /// Maps an index back to its surface form
    pub fn decode(&self, id: usize) -> Option<&str> {
        self.inner.entries.get(id).map(String::as_str)
    }

    /// The reserved padding index
    pub fn pad_id(&self) -> usize {
        0
    }

    /// The reserved unknown-token index
    pub fn unk_id(&self) -> usize {
        1
    }

    /// The number of entries, reserved symbols included
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the vocabulary holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Writes the vocabulary to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        save(self, path.as_ref())
    }

    /// Restores a vocabulary previously written with [`TokenVocab::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistError> {
        let mut vocab: Self = load(path.as_ref())?;
        vocab.inner.reindex();

        Ok(vocab)
    }
}

/// The frozen tag vocabulary
///
/// Unlike tokens, tags carry no unknown entry: encoding an unseen tag is an
/// [`UnknownTagError`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagVocab {
    inner: StringIndex,
}

impl TagVocab {
    /// Builds the tag vocabulary from the train split in first-seen order
    pub fn build<I, D>(train: &D) -> Self
    where
        I: Item,
        D: Dataset<I>,
    {
        let mut inner = StringIndex::default();
        inner.insert(PAD_TOKEN);

        for item in train.iter() {
            for tag in item.tags() {
                inner.insert(tag);
            }
        }

        log::debug!("built tag vocabulary with {} entries", inner.entries.len());

        Self { inner }
    }

    /// Maps a tag to its index
    pub fn encode(&self, tag: &str) -> Result<usize, UnknownTagError> {
        self.inner
            .get(tag)
            .ok_or_else(|| UnknownTagError(tag.to_string()))
    }

    /// Maps an index back to its tag string, for handing predictions to an
    /// external evaluator
    pub fn decode(&self, id: usize) -> Option<&str> {
        self.inner.entries.get(id).map(String::as_str)
    }

    /// The reserved padding index
    pub fn pad_id(&self) -> usize {
        0
    }

    /// The number of entries, padding included
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the vocabulary holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Writes the vocabulary to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        save(self, path.as_ref())
    }

    /// Restores a vocabulary previously written with [`TagVocab::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistError> {
        let mut vocab: Self = load(path.as_ref())?;
        vocab.inner.reindex();

        Ok(vocab)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::datasets::conll;

    use super::*;

    fn train_split() -> conll::Dataset {
        let input = "EU B-ORG\nrejects O\nGerman B-MISC\ncall O\n\nEU B-ORG\n";
        conll::Dataset::from_items(conll::parse(input.lines()).unwrap())
    }

    #[test]
    fn assigns_indices_in_first_seen_order() {
        let vocab = TokenVocab::build(&train_split(), None);

        assert_eq!(vocab.encode(PAD_TOKEN), 0);
        assert_eq!(vocab.encode(UNK_TOKEN), 1);
        assert_eq!(vocab.encode("EU"), 2);
        assert_eq!(vocab.encode("rejects"), 3);
        assert_eq!(vocab.encode("German"), 4);
        assert_eq!(vocab.encode("call"), 5);
        // Repeated "EU" did not claim a second slot
        assert_eq!(vocab.len(), 6);
    }

    #[test]
    fn construction_is_deterministic() {
        let a = TokenVocab::build(&train_split(), None);
        let b = TokenVocab::build(&train_split(), None);
        assert_eq!(a, b);

        let a = TagVocab::build(&train_split());
        let b = TagVocab::build(&train_split());
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_tokens_map_to_the_unknown_index() {
        let vocab = TokenVocab::build(&train_split(), None);

        assert_eq!(vocab.encode("boycott"), vocab.unk_id());
        assert_eq!(vocab.decode(vocab.unk_id()), Some(UNK_TOKEN));
    }

    #[test]
    fn unknown_tags_are_an_error() {
        let tags = TagVocab::build(&train_split());

        assert!(tags.encode("O").is_ok());
        assert_eq!(
            tags.encode("B-LOC"),
            Err(UnknownTagError("B-LOC".to_string()))
        );
    }

    #[test]
    fn pretrained_surface_forms_extend_the_token_vocabulary() {
        let extra: BTreeSet<String> = ["boycott".to_string(), "EU".to_string()]
            .into_iter()
            .collect();

        let vocab = TokenVocab::build(&train_split(), Some(&extra));

        assert_ne!(vocab.encode("boycott"), vocab.unk_id());
        // Forms already present keep their original index
        assert_eq!(vocab.encode("EU"), 2);
    }

    #[test]
    fn round_trips_through_json() {
        let path = std::env::temp_dir().join("ner-corpus-vocab-test.json");

        let vocab = TokenVocab::build(&train_split(), None);
        vocab.save(&path).unwrap();
        let restored = TokenVocab::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(vocab, restored);
        assert_eq!(restored.encode("German"), 4);
    }
}
