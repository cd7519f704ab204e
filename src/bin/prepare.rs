//! Command line tool to load a corpus, freeze vocabularies, and dry-run one
//! pass of batch generation

use anyhow::anyhow;
use ner_corpus::{
    datasets::{conll, Dataset},
    pipelines::token_classification::{Batcher, Config, Loader, TagVocab, TokenVocab},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: prepare DATASET [OPTIONS]

Arguments:
  DATASET              The dataset to use (e.g., 'conll')

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  -b, --batch-size     Batch size
  -s, --seed           Fixed RNG seed for reproducible shuffles
  --no-shuffle         Keep sentences in corpus order
";

#[derive(Debug)]
struct Args {
    dataset: String,
    data_dir: Option<String>,
    batch_size: Option<usize>,
    seed: Option<u64>,
    shuffle: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            seed: pargs.opt_value_from_str(["-s", "--seed"])?,
            dataset: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: DATASET"),
                _ => anyhow!("{}", e),
            })?,
            shuffle: !(pargs.contains("--no-shuffle")),
        };

        Ok(Some(args))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let output = Args::parse()?;

    if output.is_none() {
        print!("{}", HELP);

        return Ok(());
    }
    let args = output.unwrap();

    let dataset = Dataset::try_from(args.dataset.as_str())?;

    match dataset {
        Dataset::Conll => handle_conll(&args).await,
    }
}

async fn handle_conll(args: &Args) -> anyhow::Result<()> {
    let data_dir = args.data_dir.as_deref().unwrap_or("data");

    let corpus = conll::Corpus::load(data_dir).await?;

    let tokens = TokenVocab::build(&corpus.train, None);
    let tags = TagVocab::build(&corpus.train);

    log::info!(
        "froze vocabularies: {} tokens, {} tags",
        tokens.len(),
        tags.len()
    );

    tokens.save(format!("{}/datasets/conll/tokens.json", data_dir))?;
    tags.save(format!("{}/datasets/conll/tags.json", data_dir))?;

    let mut config = Config {
        shuffle: args.shuffle,
        seed: args.seed,
        ..Config::default()
    };

    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }

    let mut loader = Loader::new(&corpus.train, Batcher::new(tokens, tags), config)?;

    let mut max_len = 0;
    let mut num_batches = 0;
    for batch in loader.iter() {
        let batch = batch?;
        max_len = max_len.max(batch.tokens.first().map_or(0, Vec::len));
        num_batches += 1;
    }

    log::info!(
        "one pass over 'train': {} sentences in {} batches (expected {}), longest padded row {}",
        loader.num_items(),
        num_batches,
        loader.num_batches(),
        max_len
    );

    Ok(())
}
