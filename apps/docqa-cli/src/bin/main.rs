use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docqa_answer::Resources;
use docqa_core::chunker::Chunker;
use docqa_core::config::{expand_path, Config, PipelineConfig};
use docqa_core::loader::DocumentLoader;
use docqa_embed::get_default_embedder;
use docqa_reader::get_default_reader;
use docqa_vector::{BuildOptions, VectorIndex};

const USAGE: &str = "Usage: docqa <ingest [DIR] [--fresh] [--limit N] | ask \"<question>\" | status>";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn path_setting(config: &Config, key: &str, default: &str) -> PathBuf {
    expand_path(config.get_or(key, default))
}

fn model_dir(config: &Config, key: &str) -> Option<PathBuf> {
    config.get::<String>(key).ok().map(expand_path)
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let pipeline = config.pipeline()?;
    let index_dir = path_setting(&config, "data.index_dir", "data/index");
    let (cmd, args) = parse_args();

    match cmd.as_str() {
        "ingest" => {
            let mut fresh = false; let mut data_dir = None; let mut limit = None;
            let mut i = 0;
            while i < args.len() {
                match args[i].as_str() {
                    "--fresh" => fresh = true,
                    "--limit" => {
                        limit = args.get(i + 1).and_then(|v| v.parse::<usize>().ok());
                        if limit.is_none() { eprintln!("Error: --limit requires a number"); std::process::exit(1); }
                        i += 1;
                    }
                    a if !a.starts_with('-') => data_dir = Some(PathBuf::from(a)),
                    other => { eprintln!("Unknown flag: {other}\n{USAGE}"); std::process::exit(1); }
                }
                i += 1;
            }
            let data_dir = data_dir.unwrap_or_else(|| path_setting(&config, "data.docs_dir", "data/docs"));
            ingest(&config, &pipeline, &data_dir, &index_dir, fresh, limit)?;
        }
        "ask" => {
            let question = args.join(" ");
            if question.trim().is_empty() { eprintln!("Usage: docqa ask \"<question>\""); std::process::exit(1); }
            ask(&config, pipeline, &index_dir, &question)?;
        }
        "status" => {
            if !VectorIndex::exists(&index_dir) {
                println!("No index at {} (run `docqa ingest` first)", index_dir.display());
                return Ok(());
            }
            let index = VectorIndex::load(&index_dir)?;
            let stats = index.stats();
            println!("Index:     {}", index_dir.display());
            println!("Entries:   {}", stats.entries);
            println!("Documents: {}", stats.documents);
            println!("Dimension: {} ({:?})", stats.dim, stats.metric);
            for source in index.sources() { println!("  - {source}"); }
        }
        _ => { eprintln!("Unknown command: {}\n{USAGE}", cmd); std::process::exit(1); }
    }
    Ok(())
}

fn ingest(config: &Config, pipeline: &PipelineConfig, data_dir: &Path, index_dir: &Path, fresh: bool, limit: Option<usize>) -> anyhow::Result<()> {
    println!("Ingesting from {}", data_dir.display());
    let loader = DocumentLoader::new().cleaned();
    let documents = match limit {
        Some(n) => loader.load_with_limit(data_dir, n)?,
        None => loader.load_directory(data_dir)?,
    };
    let chunks = Chunker::new(pipeline.chunk_size, pipeline.chunk_overlap)?.split_documents(&documents);
    println!("Loaded {} documents, {} chunks", documents.len(), chunks.len());

    let embedder = get_default_embedder(model_dir(config, "models.embedder_dir").as_deref())?;
    let mut index = if !fresh && VectorIndex::exists(index_dir) {
        VectorIndex::load(index_dir)?
    } else {
        VectorIndex::new(embedder.dim(), pipeline.metric)
    };
    let options = BuildOptions { metric: index.metric(), batch_size: pipeline.embed_batch_size, show_progress: true };
    let built = VectorIndex::build(&chunks, embedder.as_ref(), options)?;
    let added = index.merge(&built)?;
    index.save(index_dir)?;
    println!("✅ Ingest complete: {} new entries, {} total", added, index.len());
    Ok(())
}

fn ask(config: &Config, pipeline: PipelineConfig, index_dir: &Path, question: &str) -> anyhow::Result<()> {
    let embedder: Arc<dyn docqa_embed::Embedder> = Arc::from(get_default_embedder(model_dir(config, "models.embedder_dir").as_deref())?);
    let reader = get_default_reader(model_dir(config, "models.reader_dir").as_deref(), &pipeline)?;
    let index = if VectorIndex::exists(index_dir) {
        VectorIndex::load(index_dir)?
    } else {
        tracing::warn!(dir = %index_dir.display(), "no index found, answering from an empty corpus");
        VectorIndex::new(embedder.dim(), pipeline.metric)
    };
    let resources = Resources::new(pipeline, embedder, Arc::new(reader), index)?;
    let answer = resources.ask(question)?;
    println!("{}", answer.text);
    if !answer.is_no_answer() {
        println!("This answer was taken from: {}", answer.sources_line());
    }
    Ok(())
}
