//! # Prelude for gemini-analyzer
//!
//! This module re-exports the types needed to run an analysis end to end.
//!
//! ```rust,ignore
//! use gemini_analyzer::prelude::*;
//! ```

pub use crate::analysis::{Analysis, Analyzer, AnalyzerConfig, GenerationOptions, TokenUsage};
pub use crate::asset::{AssetStore, PollConfig, RemoteAsset};
pub use crate::chunker::ChunkConfig;
pub use crate::client::{Error as ClientError, Gemini, Model};
pub use crate::config::Config;
pub use crate::error::ErrorKind;
pub use crate::output::{write_envelope, Envelope, OutputEncoding};
