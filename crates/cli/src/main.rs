use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;
use voynich_analysis::{
    estimate_refinement_cost, ContextAssembler, EmbeddingRecord, RandomSimilarity,
    ReferenceLibrary, RefinementOrchestrator, ResponseLog, SectionTracker, TruncatingSummarizer,
    DEFAULT_SUMMARY_CHARS,
};
use voynich_chunker::{
    chunk_corpus, chunk_records, lines_to_records, read_corpus_jsonl, write_corpus_jsonl,
    ChunkConfig, ChunkStore,
};
use voynich_services::{ChatClient, EmbedderClient, LocalLlmClient, ReasoningClient};
use voynich_transcript::{parse_file, SectionVocabulary};

mod report;

const DEFAULT_FORMAT_INSTRUCTIONS: &str = "Please return a JSON object with the following keys:\n\
- 'token_structure_analysis': observations on structural patterns in tokens (e.g. prefix/suffix/delimiter organization, character clustering)\n\
- 'possible_function': what functional or grammatical role these patterns may play (e.g. sentence marker, label, connector, emphasis)\n\
- 'delimiter_notes': any structural implications of symbols like '=', '-', or repeated characters\n\
- 'confidence': a float between 0 and 1 indicating your confidence in the analysis\n\n\
Avoid linguistic translations or semantic analogies to known languages unless explicitly structural.";

const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:8001/generate";
const DEFAULT_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_EMBED_ENDPOINT: &str = "http://localhost:8000/embed";

#[derive(Parser)]
#[command(name = "voynich")]
#[command(about = "Cross-lingual structural analysis of manuscript transcriptions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a transcription file and write the chunk store
    Ingest(IngestArgs),

    /// Chunk a reference-corpus JSONL on a character budget
    #[command(name = "chunk-corpus")]
    ChunkCorpus(ChunkCorpusArgs),

    /// Convert a plain text file into corpus records
    #[command(name = "import-text")]
    ImportText(ImportTextArgs),

    /// Embed transcription rows via the external embedding service
    Embed(EmbedArgs),

    /// Select sections, build comparison payloads and submit them
    Analyze(AnalyzeArgs),

    /// Run recursive refinement rounds over the response log
    Refine(RefineArgs),

    /// Estimate the token cost of a refinement run
    Estimate(EstimateArgs),

    /// Show the most recent response-log entries
    Responses(ResponsesArgs),
}

#[derive(Args)]
struct IngestArgs {
    /// Transcription file (Latin-1 encoded)
    transcription: PathBuf,

    /// Transcriber/variant tag to extract
    #[arg(long, default_value = "H")]
    transcriber: String,

    /// Records per chunk
    #[arg(long, default_value_t = 5)]
    chunk_size: usize,

    /// Output chunk store (JSONL)
    #[arg(short, long, default_value = "chunks.jsonl")]
    output: PathBuf,
}

#[derive(Args)]
struct ChunkCorpusArgs {
    /// Input corpus JSONL ({language, source, text} per line)
    input: PathBuf,

    /// Records per chunk
    #[arg(long, default_value_t = 5)]
    chunk_size: usize,

    /// Character budget per source text before sub-splitting
    #[arg(long, default_value_t = 1000)]
    max_chars: usize,

    /// Output chunk store (JSONL)
    #[arg(short, long, default_value = "corpus_chunks.jsonl")]
    output: PathBuf,
}

#[derive(Args)]
struct ImportTextArgs {
    /// Input plain text file
    input: PathBuf,

    /// Language label for the records
    #[arg(long)]
    language: String,

    /// Lines joined into each record
    #[arg(long, default_value_t = 10)]
    lines_per_chunk: usize,

    /// Output corpus JSONL
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct EmbedArgs {
    /// Transcription file (Latin-1 encoded)
    transcription: PathBuf,

    /// Transcriber/variant tag to extract
    #[arg(long, default_value = "H")]
    transcriber: String,

    /// Embedding service endpoint
    #[arg(long, default_value = DEFAULT_EMBED_ENDPOINT)]
    endpoint: String,

    /// Rows per embedding request
    #[arg(long, default_value_t = 16)]
    batch_size: usize,

    /// Output embeddings JSONL
    #[arg(short, long, default_value = "embeddings.jsonl")]
    output: PathBuf,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Embeddings JSONL produced by `embed`
    #[arg(long)]
    embeddings: PathBuf,

    /// Processed-set file
    #[arg(long, default_value = "processed_sections.json")]
    processed: PathBuf,

    /// Reference corpus as Language=path (repeatable)
    #[arg(long = "reference", value_parser = parse_reference, required = true)]
    references: Vec<(String, PathBuf)>,

    /// Number of sections to select
    #[arg(short = 'n', long, default_value_t = 3)]
    count: usize,

    /// Allow re-analyzing already processed sections
    #[arg(long)]
    include_processed: bool,

    /// Override the analysis format instructions
    #[arg(long)]
    format_instructions: Option<String>,

    /// Response log file
    #[arg(long, default_value = "responses.jsonl")]
    responses: PathBuf,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Args)]
struct RefineArgs {
    /// Number of refinement rounds
    #[arg(short, long, default_value_t = 3)]
    rounds: usize,

    /// Character cap for the serialized response history
    #[arg(long, default_value_t = DEFAULT_SUMMARY_CHARS)]
    max_summary_chars: usize,

    /// Response log file
    #[arg(long, default_value = "responses.jsonl")]
    responses: PathBuf,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Args)]
struct EstimateArgs {
    /// Number of refinement rounds to project
    #[arg(short, long, default_value_t = 3)]
    rounds: usize,

    /// Model whose tokenizer prices the prompt
    #[arg(long, default_value = "gpt-4.1")]
    model: String,

    /// Estimated output tokens as a multiple of input tokens
    #[arg(long, default_value_t = 1.0)]
    output_multiplier: f64,

    /// Response log file
    #[arg(long, default_value = "responses.jsonl")]
    responses: PathBuf,
}

#[derive(Args)]
struct ResponsesArgs {
    /// Maximum entries to show
    #[arg(long, default_value_t = 5)]
    max: usize,

    /// Response log file
    #[arg(long, default_value = "responses.jsonl")]
    responses: PathBuf,
}

#[derive(Args)]
struct ServiceArgs {
    /// Reasoning backend
    #[arg(long, value_enum, default_value_t = Backend::Local)]
    backend: Backend,

    /// Reasoning endpoint (defaults per backend)
    #[arg(long)]
    endpoint: Option<String>,

    /// Model name (chat backend)
    #[arg(long, default_value = "gpt-4.1")]
    model: String,

    /// Sampling temperature (chat backend)
    #[arg(long, default_value_t = 0.3)]
    temperature: f32,

    /// Generation budget (local backend)
    #[arg(long, default_value_t = 300)]
    max_new_tokens: usize,
}

#[derive(Copy, Clone, ValueEnum)]
enum Backend {
    /// Locally hosted /generate endpoint
    Local,
    /// OpenAI-style chat completions endpoint
    Chat,
}

fn parse_reference(value: &str) -> std::result::Result<(String, PathBuf), String> {
    let (language, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected Language=path, got '{value}'"))?;
    if language.is_empty() {
        return Err(format!("empty language in '{value}'"));
    }
    Ok((language.to_string(), PathBuf::from(path)))
}

fn build_client(args: &ServiceArgs) -> Result<Box<dyn ReasoningClient>> {
    match args.backend {
        Backend::Local => {
            let endpoint = args
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCAL_ENDPOINT.to_string());
            Ok(Box::new(LocalLlmClient::new(endpoint, args.max_new_tokens)?))
        }
        Backend::Chat => {
            let endpoint = args
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAT_ENDPOINT.to_string());
            let api_key = std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set for the chat backend")?;
            Ok(Box::new(ChatClient::new(
                endpoint,
                api_key,
                args.model.clone(),
                args.temperature,
            )?))
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Ingest(args) => ingest(args).await,
        Commands::ChunkCorpus(args) => chunk_corpus_cmd(args).await,
        Commands::ImportText(args) => import_text(args).await,
        Commands::Embed(args) => embed(args).await,
        Commands::Analyze(args) => analyze(args).await,
        Commands::Refine(args) => refine(args).await,
        Commands::Estimate(args) => estimate(args).await,
        Commands::Responses(args) => responses(args).await,
    }
}

async fn ingest(args: IngestArgs) -> Result<()> {
    let config = ChunkConfig {
        chunk_size: args.chunk_size,
        ..Default::default()
    };
    config.validate()?;

    let records = parse_file(
        &args.transcription,
        &args.transcriber,
        &SectionVocabulary::default(),
    )
    .await?;
    let chunks = chunk_records(&records, &config);
    ChunkStore::new(&args.output).save(&chunks).await?;
    println!(
        "Saved {} chunks ({} records) to {}",
        chunks.len(),
        records.len(),
        args.output.display()
    );
    Ok(())
}

async fn chunk_corpus_cmd(args: ChunkCorpusArgs) -> Result<()> {
    let config = ChunkConfig {
        chunk_size: args.chunk_size,
        max_chars: args.max_chars,
    };
    config.validate()?;

    let records = read_corpus_jsonl(&args.input).await?;
    let chunks = chunk_corpus(&records, &config);
    ChunkStore::new(&args.output).save(&chunks).await?;
    println!(
        "Saved {} chunks ({} records) to {}",
        chunks.len(),
        records.len(),
        args.output.display()
    );
    Ok(())
}

async fn import_text(args: ImportTextArgs) -> Result<()> {
    let records = lines_to_records(&args.input, &args.language, args.lines_per_chunk).await?;
    write_corpus_jsonl(&args.output, &records).await?;
    println!("Saved {} records to {}", records.len(), args.output.display());
    Ok(())
}

async fn embed(args: EmbedArgs) -> Result<()> {
    let records = parse_file(
        &args.transcription,
        &args.transcriber,
        &SectionVocabulary::default(),
    )
    .await?;
    let client = EmbedderClient::new(&args.endpoint)?;

    let mut embedded = Vec::with_capacity(records.len());
    for batch in records.chunks(args.batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|rec| rec.raw.clone()).collect();
        let vectors = client.embed_texts(&texts).await?;
        for (rec, embedding) in batch.iter().zip(vectors) {
            embedded.push(EmbeddingRecord {
                page: rec.page.clone(),
                paragraph: rec.paragraph.clone(),
                tokens: rec.tokens.clone(),
                raw: rec.raw.clone(),
                embedding,
            });
        }
    }

    let mut out = String::new();
    for rec in &embedded {
        out.push_str(&serde_json::to_string(rec)?);
        out.push('\n');
    }
    tokio::fs::write(&args.output, out).await?;
    println!("Saved {} embedded rows to {}", embedded.len(), args.output.display());
    Ok(())
}

async fn analyze(args: AnalyzeArgs) -> Result<()> {
    let mut tracker = SectionTracker::new(&args.embeddings, &args.processed).await?;
    let reference_paths: BTreeMap<String, PathBuf> = args.references.into_iter().collect();
    let library = ReferenceLibrary::load(&reference_paths).await?;
    let assembler = ContextAssembler::new(library, Box::new(RandomSimilarity));

    let ids = tracker.choose(args.count, args.include_processed)?;
    let instructions = args
        .format_instructions
        .as_deref()
        .unwrap_or(DEFAULT_FORMAT_INSTRUCTIONS);
    let payloads = assembler
        .build_payloads(&mut tracker, &ids, instructions)
        .await?;

    let client = build_client(&args.service)?;
    let orchestrator = RefinementOrchestrator::new(client, ResponseLog::new(&args.responses));
    for payload in &payloads {
        log::info!("Analyzing section {}", payload.id);
        let result = orchestrator.analyze(&payload.prompt).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

async fn refine(args: RefineArgs) -> Result<()> {
    let client = build_client(&args.service)?;
    let orchestrator = RefinementOrchestrator::new(client, ResponseLog::new(&args.responses))
        .with_summarizer(Box::new(TruncatingSummarizer::new(args.max_summary_chars)));
    let final_reply = orchestrator.refine(args.rounds).await?;
    println!("{final_reply}");
    Ok(())
}

async fn estimate(args: EstimateArgs) -> Result<()> {
    let log = ResponseLog::new(&args.responses);
    let estimate =
        estimate_refinement_cost(&log, args.rounds, &args.model, args.output_multiplier).await?;
    println!("{}", serde_json::to_string_pretty(&estimate)?);
    Ok(())
}

async fn responses(args: ResponsesArgs) -> Result<()> {
    let log = ResponseLog::new(&args.responses);
    let entries = log.recent(args.max).await?;
    println!("{}", report::render_responses(&entries));
    Ok(())
}
