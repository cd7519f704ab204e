use std::{mem, path::PathBuf};

use async_trait::async_trait;
use burn::data::dataset::{self, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{pipelines::token_classification, utils::files::read_lines};

use super::{LoadableDataset, LoadError};

/// The name of the CoNLL-style BIO dataset format
pub static DATASET: &str = "conll";

/// Document boundary marker; lines starting with it are dropped during
/// parsing and do not terminate the current sentence
pub static DOC_MARKER: &str = "-DOCSTART-";

/// Placeholder stored in place of tokens that begin with a digit
pub static NUM_TOKEN: &str = "<num>";

/// A single BIO-tagged sentence
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct Item {
    /// Surface tokens, with digit-initial tokens normalized to [`NUM_TOKEN`]
    pub tokens: Vec<String>,

    /// BIO tags, one per token
    pub tags: Vec<String>,
}

impl token_classification::Item for Item {
    fn tokens(&self) -> Vec<&str> {
        self.tokens.iter().map(String::as_str).collect()
    }

    fn tags(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }
}

/// A malformed line in raw BIO-tagged input
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: expected '<token> <tag>', got {content:?}")]
pub struct FormatError {
    /// 1-based line number within the input
    pub line: usize,

    /// The offending line
    pub content: String,
}

/// One split of a CoNLL-style BIO corpus
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,
}

/// Implement the Dataset trait for the CoNLL dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific sentence from the split
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    /// Returns the number of sentences in the split
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

#[async_trait]
impl LoadableDataset<Item> for Dataset {
    async fn load(data_dir: &str, split: &str) -> Result<Self, LoadError> {
        Self::load(data_dir, split).await
    }
}

impl Dataset {
    /// Constructs a split directly from parsed sentences
    pub fn from_items(items: Vec<Item>) -> Self {
        Self {
            dataset: InMemDataset::new(items),
        }
    }

    /// Loads a split (e.g. "train", "valid", "test") from the data directory
    pub async fn load(data_dir: &str, split: &str) -> Result<Self, LoadError> {
        let path: PathBuf = [data_dir, "datasets", DATASET, &format!("{}.txt", split)]
            .iter()
            .collect();

        let lines = read_lines(&path).await?;
        let items = parse(lines.iter().map(String::as_str))?;

        log::info!(
            "loaded {} sentences for split '{}' from {}",
            items.len(),
            split,
            path.display()
        );

        Ok(Self::from_items(items))
    }
}

/// The three named splits of a BIO-tagged corpus
pub struct Corpus {
    /// The training split, which vocabularies are built from
    pub train: Dataset,

    /// The validation split
    pub valid: Dataset,

    /// The held-out test split
    pub test: Dataset,
}

impl Corpus {
    /// Loads all three splits from the data directory
    pub async fn load(data_dir: &str) -> Result<Self, LoadError> {
        Ok(Self {
            train: Dataset::load(data_dir, "train").await?,
            valid: Dataset::load(data_dir, "valid").await?,
            test: Dataset::load(data_dir, "test").await?,
        })
    }
}

/// Parse raw BIO-tagged lines into sentences
///
/// Each non-blank line carries exactly `<token> <tag>`, whitespace-separated.
/// A blank line closes the current sentence. Lines whose first field contains
/// [`DOC_MARKER`] are skipped without closing the sentence. Tokens are passed
/// through [`normalize`] before storage.
pub fn parse<'a, L>(lines: L) -> Result<Vec<Item>, FormatError>
where
    L: IntoIterator<Item = &'a str>,
{
    let mut items = Vec::new();
    let mut tokens: Vec<String> = Vec::new();
    let mut tags: Vec<String> = Vec::new();

    for (i, line) in lines.into_iter().enumerate() {
        let mut fields = line.split_whitespace();

        let Some(first) = fields.next() else {
            if !tokens.is_empty() {
                items.push(Item::new(mem::take(&mut tokens), mem::take(&mut tags)));
            }
            continue;
        };

        if first.contains(DOC_MARKER) {
            continue;
        }

        let (Some(tag), None) = (fields.next(), fields.next()) else {
            return Err(FormatError {
                line: i + 1,
                content: line.to_string(),
            });
        };

        tokens.push(normalize(first));
        tags.push(tag.to_string());
    }

    // A final sentence may be closed by end-of-input instead of a blank line
    if !tokens.is_empty() {
        items.push(Item::new(tokens, tags));
    }

    Ok(items)
}

/// Replace digit-initial tokens with the numeric placeholder
pub fn normalize(token: &str) -> String {
    match token.chars().next() {
        Some(c) if c.is_ascii_digit() => NUM_TOKEN.to_string(),
        _ => token.to_string(),
    }
}
