use async_trait::async_trait;

/// CoNLL-style BIO-tagged corpora
pub mod conll;

/// A dataset split which can be loaded from a local data directory
#[async_trait]
pub trait LoadableDataset<I>: burn::data::dataset::Dataset<I> {
    /// Load the named split (e.g. "train", "valid", "test")
    async fn load(data_dir: &str, split: &str) -> Result<Self, LoadError>
    where
        Self: std::marker::Sized;
}

/// The Dataset enum
#[derive(Debug)]
pub enum Dataset {
    /// CoNLL-style BIO-tagged corpus
    Conll,
}

impl TryFrom<&str> for Dataset {
    type Error = DatasetError;

    /// Try to convert a string to a Dataset
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value == conll::DATASET {
            Ok(Dataset::Conll)
        } else {
            Err(Self::Error::Unknown(value.to_string()))
        }
    }
}

impl From<Dataset> for String {
    fn from(dataset: Dataset) -> Self {
        match dataset {
            Dataset::Conll => conll::DATASET.to_string(),
        }
    }
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// No dataset found for the given string
    #[error("no dataset found for {0}")]
    Unknown(String),
}

/// Errors raised while loading a dataset split
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// The split file could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The split file contained a malformed line
    #[error(transparent)]
    Format(#[from] conll::FormatError),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resolves_dataset_names_through_the_registry() {
        let dataset = Dataset::try_from("conll").unwrap();
        assert_eq!(String::from(dataset), "conll");

        let err = Dataset::try_from("snips").unwrap_err();
        assert_eq!(err.to_string(), "no dataset found for snips");
    }
}
