//! CLI for gemini-analyzer: video, text and long-document analysis.
//!
//! Every invocation prints exactly one JSON envelope to stdout and exits 0, whether the
//! analysis succeeded or not. Diagnostics go to stderr when `--debug` or `GEMINI_DEBUG`
//! is set.

use clap::{builder::RangedU64ValueParser, Args, Parser, Subcommand};
use gemini_analyzer::{
    chunker::DEFAULT_MAX_CHARS,
    config::{self, DEBUG_VAR},
    write_envelope, AnalysisError, Analyzer, AnalyzerConfig, ChunkConfig, Config, Envelope,
    ErrorKind, Gemini, GenerationOptions, OutputEncoding, PollConfig, DEFAULT_VIDEO_PROMPT,
};
use snafu::{ResultExt, Snafu};
use std::{io, path::PathBuf, process::ExitCode, time::Duration};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gemini-analyzer")]
#[command(about = "Analyze videos and long texts with Google Gemini, printing JSON")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Write diagnostics to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Escape non-ASCII characters in the JSON output
    #[arg(long, global = true)]
    ascii: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a video, wait until it is processed, then analyze it
    Video(VideoArgs),

    /// Generate text from a prompt
    Text(TextArgs),

    /// Analyze a long document, splitting it into parts when needed
    Novel(NovelArgs),

    /// Check that the API is reachable with the configured key
    Test(TestArgs),
}

#[derive(Args)]
struct GenerationArgs {
    /// Model to use instead of GEMINI_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(long)]
    temperature: Option<f32>,

    /// Upper bound on generated tokens
    #[arg(long)]
    max_output_tokens: Option<i32>,
}

impl GenerationArgs {
    fn options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

#[derive(Args)]
struct VideoArgs {
    /// Path of the video file
    path: PathBuf,

    /// What to ask about the video
    prompt: Option<String>,

    #[command(flatten)]
    generation: GenerationArgs,

    /// Seconds between status checks
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    /// Seconds to wait for processing before giving up
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u64).range(1..))]
    max_wait: u64,
}

#[derive(Args)]
struct TextArgs {
    /// Prompt text
    content: String,

    /// High-level guidance for the model
    system_instruction: Option<String>,

    #[command(flatten)]
    generation: GenerationArgs,
}

#[derive(Args)]
struct NovelArgs {
    /// The document, or a path to it with --file
    content: String,

    /// What to ask about the document
    prompt: String,

    /// Treat CONTENT as a path and read the document from it
    #[arg(long)]
    file: bool,

    /// Longest part sent in one request, in characters
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_CHARS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    max_length: usize,

    /// Model to use instead of GEMINI_MODEL
    #[arg(long)]
    model: Option<String>,
}

#[derive(Args)]
struct TestArgs {
    #[command(flatten)]
    generation: GenerationArgs,
}

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("failed to read '{}'", path.display()))]
    ReadDocument {
        source: io::Error,
        path: PathBuf,
    },
}

impl CliError {
    fn kind(&self) -> ErrorKind {
        match self {
            CliError::ReadDocument { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                ErrorKind::NotFound
            }
            CliError::ReadDocument { .. } => ErrorKind::Input,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let envelope = Envelope::failure(&e, ErrorKind::Input);
            return emit(&envelope, OutputEncoding::Utf8);
        }
    };

    let debug_env = std::env::var(DEBUG_VAR).is_ok_and(|value| config::is_truthy(&value));
    if cli.debug || debug_env {
        init_tracing();
    }

    let encoding = if cli.ascii {
        OutputEncoding::Ascii
    } else {
        OutputEncoding::Utf8
    };

    let envelope = match Config::from_env() {
        Ok(config) => run(cli.command, config).await.unwrap_or_else(|failure| failure),
        Err(e) => Envelope::failure(&e, e.kind()),
    };

    emit(&envelope, encoding)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();
}

fn emit(envelope: &Envelope, encoding: OutputEncoding) -> ExitCode {
    match write_envelope(io::stdout().lock(), envelope, encoding) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "failed to write output");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> Result<Envelope, Envelope> {
    match command {
        Command::Video(args) => {
            let analyzer = analyzer(
                config.with_model(args.generation.model.clone()),
                AnalyzerConfig {
                    poll: PollConfig {
                        interval: Duration::from_secs(args.poll_interval),
                        max_wait: Duration::from_secs(args.max_wait),
                    },
                    generation: args.generation.options(),
                    ..Default::default()
                },
            )?;
            let prompt = args.prompt.as_deref().unwrap_or(DEFAULT_VIDEO_PROMPT);
            info!(path = %args.path.display(), "analyzing video");

            analyzer
                .analyze_video(&args.path, prompt)
                .await
                .map(Envelope::analysis)
                .map_err(analysis_failure)
        }
        Command::Text(args) => {
            let analyzer = analyzer(
                config.with_model(args.generation.model.clone()),
                AnalyzerConfig {
                    generation: args.generation.options(),
                    ..Default::default()
                },
            )?;

            analyzer
                .generate_text(&args.content, args.system_instruction.as_deref())
                .await
                .map(Envelope::analysis)
                .map_err(analysis_failure)
        }
        Command::Novel(args) => {
            let document = if args.file {
                let path = PathBuf::from(&args.content);
                tokio::fs::read_to_string(&path)
                    .await
                    .context(ReadDocumentSnafu { path: &path })
                    .map_err(|e| Envelope::failure(&e, e.kind()))?
            } else {
                args.content
            };

            let analyzer = analyzer(
                config.with_model(args.model),
                AnalyzerConfig {
                    chunk: ChunkConfig::new(args.max_length),
                    ..Default::default()
                },
            )?;

            analyzer
                .analyze_novel(&document, &args.prompt)
                .await
                .map(Envelope::analysis)
                .map_err(analysis_failure)
        }
        Command::Test(args) => {
            let analyzer = analyzer(
                config.with_model(args.generation.model.clone()),
                AnalyzerConfig {
                    generation: args.generation.options(),
                    ..Default::default()
                },
            )?;
            analyzer
                .test_connection()
                .await
                .map(Envelope::connection)
                .map_err(analysis_failure)
        }
    }
}

fn analyzer(
    config: Config,
    analyzer_config: AnalyzerConfig,
) -> Result<Analyzer<Gemini>, Envelope> {
    info!(model = %config.model, "creating client");
    let client = config.client().map_err(|e| Envelope::failure(&e, e.kind()))?;
    Ok(Analyzer::new(client, analyzer_config))
}

fn analysis_failure(error: AnalysisError) -> Envelope {
    Envelope::failure(&error, error.kind())
}
