use snafu::{OptionExt, ResultExt, Snafu};
use std::{path::Path, time::Duration};
use tracing::{info, instrument, warn};

use crate::{
    analysis::{Analysis, ConnectionReport, Generator},
    asset::{AssetError, AssetPoller, AssetStore, PollConfig, RemoteAsset},
    chunker::{split_text, ChunkConfig},
    client::Error as ClientError,
    clock::{Clock, TokioClock},
    error::ErrorKind,
    generation::{ContentBuilder, GenerateContentRequest},
};

/// Prompt used by the `video` command when the caller gives none.
pub const DEFAULT_VIDEO_PROMPT: &str = "Summarize this video. Then create a quiz with an answer key based on the information in this video.";

const CONNECTION_TEST_PROMPT: &str = "Reply with: connection test succeeded";
const CONNECTION_TEST_MAX_OUTPUT_TOKENS: i32 = 100;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("generation request failed"))]
    Generate { source: Box<ClientError> },

    #[snafu(display("asset is not usable"))]
    Asset { source: AssetError },

    #[snafu(display("asset '{handle}' has no URI to reference"))]
    MissingUri { handle: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Generate { source } => source.kind(),
            Error::Asset { source } => source.kind(),
            Error::MissingUri { .. } => ErrorKind::Remote,
        }
    }
}

/// Sampling parameters applied to every request an [`Analyzer`] sends.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub chunk: ChunkConfig,
    /// Delay between consecutive chunk calls
    pub pacing: Duration,
    pub poll: PollConfig,
    pub generation: GenerationOptions,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkConfig::default(),
            pacing: Duration::from_secs(1),
            poll: PollConfig::default(),
            generation: GenerationOptions::default(),
        }
    }
}

/// Runs analyses against a [`Generator`], one remote call at a time.
pub struct Analyzer<G, C = TokioClock> {
    generator: G,
    clock: C,
    config: AnalyzerConfig,
}

impl<G: Generator> Analyzer<G> {
    pub fn new(generator: G, config: AnalyzerConfig) -> Self {
        Self::with_clock(generator, TokioClock, config)
    }
}

impl<G: Generator, C: Clock> Analyzer<G, C> {
    pub fn with_clock(generator: G, clock: C, config: AnalyzerConfig) -> Self {
        Self {
            generator,
            clock,
            config,
        }
    }

    /// Single generation call with an optional system instruction.
    pub async fn generate_text(
        &self,
        content: &str,
        system_instruction: Option<&str>,
    ) -> Result<Analysis, Error> {
        let mut builder = ContentBuilder::new().with_user_message(content);
        if let Some(instruction) = system_instruction {
            builder = builder.with_system_instruction(instruction);
        }
        self.generate(builder).await
    }

    /// Analyze a long document, chunking it when it exceeds the configured length.
    ///
    /// Chunks are sent strictly in order with the pacing delay between calls. The first
    /// failing chunk aborts the run and its error is returned as is.
    #[instrument(skip_all, fields(
        document.chars = text.chars().count(),
        chunk.max_chars = self.config.chunk.max_chars,
    ))]
    pub async fn analyze_novel(&self, text: &str, prompt: &str) -> Result<Analysis, Error> {
        if self.config.chunk.fits(text) {
            return self
                .generate_text(&format!("{prompt}\n\nContent:\n{text}"), None)
                .await;
        }

        let chunks = split_text(text, &self.config.chunk);
        let total = chunks.len();
        info!(chunks = total, "document split into chunks");

        let mut parts = Vec::with_capacity(total);
        for (index, chunk) in chunks.into_iter().enumerate() {
            if index > 0 {
                self.clock.sleep(self.config.pacing).await;
            }

            let part = index + 1;
            let chunk_prompt =
                format!("{prompt}\n\nThis is part {part} of {total} of the text:\n\n{chunk}");
            let analysis = self
                .generate_text(&chunk_prompt, None)
                .await
                .inspect_err(|error| warn!(part, total, %error, "chunk analysis failed"))?;
            parts.push(analysis);
        }

        Ok(Analysis::merge(parts))
    }

    /// Ask the model about an already active asset.
    pub async fn analyze_asset(
        &self,
        asset: &RemoteAsset,
        prompt: &str,
    ) -> Result<Analysis, Error> {
        let uri = asset.uri.as_deref().context(MissingUriSnafu {
            handle: asset.handle.as_str(),
        })?;
        let mime_type = asset
            .mime_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        let builder = ContentBuilder::new().with_user_message_and_file(prompt, mime_type, uri);
        let analysis = self.generate(builder).await?;
        Ok(analysis.with_file_id(asset.handle.as_str()))
    }

    /// Small round trip that reports how long the API took to answer.
    ///
    /// Output is capped at 100 tokens unless the configured options set their own cap.
    pub async fn test_connection(&self) -> Result<ConnectionReport, Error> {
        let builder = ContentBuilder::new()
            .with_user_message(CONNECTION_TEST_PROMPT)
            .with_max_output_tokens(CONNECTION_TEST_MAX_OUTPUT_TOKENS);
        let request = self.apply_options(builder).build();

        let start = self.clock.now();
        let analysis = self.send(request).await?;
        let response_time = self.clock.now().saturating_duration_since(start);

        Ok(ConnectionReport {
            text: analysis.text,
            usage: analysis.usage,
            response_time,
        })
    }

    async fn generate(&self, builder: ContentBuilder) -> Result<Analysis, Error> {
        self.send(self.apply_options(builder).build()).await
    }

    fn apply_options(&self, mut builder: ContentBuilder) -> ContentBuilder {
        let options = self.config.generation;
        if let Some(temperature) = options.temperature {
            builder = builder.with_temperature(temperature);
        }
        if let Some(max_output_tokens) = options.max_output_tokens {
            builder = builder.with_max_output_tokens(max_output_tokens);
        }
        builder
    }

    async fn send(&self, request: GenerateContentRequest) -> Result<Analysis, Error> {
        let response = self
            .generator
            .generate(request)
            .await
            .map_err(Box::new)
            .context(GenerateSnafu)?;
        Ok(Analysis::from_response(&response))
    }
}

impl<G: Generator + AssetStore, C: Clock> Analyzer<G, C> {
    /// Upload a local video, wait until it is active, then analyze it.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn analyze_video(&self, path: &Path, prompt: &str) -> Result<Analysis, Error> {
        let poller = AssetPoller::new(&self.generator, &self.clock, self.config.poll);
        let asset = poller.upload_and_wait(path).await.context(AssetSnafu)?;
        self.analyze_asset(&asset, prompt).await
    }
}
