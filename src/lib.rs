//! # gemini-analyzer
//!
//! Video and long-document analysis on top of the Google Gemini API.
//!
//! The [`asset`] module uploads local media and polls it until the API has processed it;
//! the [`analysis`] module splits oversized documents with [`chunker`], analyzes the
//! parts in order and merges them. Both wait through the [`clock::Clock`] trait.

pub mod analysis;
pub mod asset;
pub mod chunker;
pub mod client;
pub mod clock;
mod common;
pub mod config;
pub mod error;
pub mod files;
pub mod generation;
pub mod models;
pub mod output;
pub mod prelude;


pub use analysis::{
    Analysis, AnalysisError, Analyzer, AnalyzerConfig, ConnectionReport, GenerationOptions,
    Generator, TokenUsage, DEFAULT_VIDEO_PROMPT,
};
pub use asset::{
    AssetError, AssetPoller, AssetState, AssetStore, PollConfig, PollState, RemoteAsset,
};
pub use chunker::{split_text, ChunkConfig};
pub use client::{Error as ClientError, Gemini, Model};
pub use clock::{Clock, TokioClock};
pub use config::{Config, Error as ConfigError};
pub use error::ErrorKind;
pub use generation::{
    Candidate, ContentBuilder, FinishReason, GenerateContentRequest, GenerationConfig,
    GenerationResponse, UsageMetadata,
};
pub use models::{Content, Part, Role};
pub use output::{write_envelope, Envelope, OutputEncoding};
