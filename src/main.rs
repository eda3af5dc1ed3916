//! `lexsrt` - resolve a tagged subtitle document against Wikidata lexemes
//! and print the result as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lexsrt::{DocumentResolver, LexSrtConfig, PipelineError, PretaggedTokenizer, TaggedDocument};
use wikidata::HttpEntityFetcher;

#[derive(Parser)]
#[command(name = "lexsrt")]
#[command(about = "Resolve tagged subtitle tokens to Wikidata lexemes")]
struct Args {
    /// Tagged document (JSON): `{"model": .., "sentences": [{"text": .., "tokens": [..]}]}`
    #[arg(long)]
    input: PathBuf,

    /// ISO 639-1 or 639-2 code of the document language
    #[arg(long)]
    language: String,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fetch matched lexemes and include the lemma/gloss report
    #[arg(long)]
    report: bool,

    /// Tagger model name; defaults to the one recorded in the input
    #[arg(long)]
    model: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => LexSrtConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LexSrtConfig::default(),
    };

    let tagged = TaggedDocument::from_file(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let model = args.model.clone().unwrap_or_else(|| tagged.model.clone());
    info!(
        input = %args.input.display(),
        sentences = tagged.sentences.len(),
        language = %args.language,
        "starting"
    );

    let tokenizer = Arc::new(PretaggedTokenizer::new(&tagged));
    let mut resolver = DocumentResolver::from_config(&config, tokenizer)?;
    if args.report {
        let fetcher = HttpEntityFetcher::new(config.wikidata.clone())?;
        resolver = resolver.with_fetcher(Arc::new(fetcher));
    }

    match resolver
        .resolve_document(&tagged.sentence_texts(), &args.language, &model)
        .await
    {
        Ok(result) => {
            print_json(&result, args.pretty)?;
            Ok(())
        }
        Err(err) => {
            if let Some(partial) = err.partial() {
                print_json(partial, args.pretty)?;
            }
            if let PipelineError::RemoteServiceUnavailable { .. } = err {
                error!(error = %err, "Wikidata unreachable, output is partial");
            }
            Err(err.into())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
