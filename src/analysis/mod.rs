//! Text, long-document and video analysis on top of a [`Generator`].
//!
//! Documents longer than the configured chunk length are split with
//! [`split_text`](crate::chunker::split_text), analyzed part by part and merged into a
//! single [`Analysis`] whose usage is the sum of every call.

pub mod analyzer;
pub mod generator;
pub mod model;

pub use analyzer::{
    Analyzer, AnalyzerConfig, Error as AnalysisError, GenerationOptions, DEFAULT_VIDEO_PROMPT,
};
pub use generator::Generator;
pub use model::{Analysis, ConnectionReport, TokenUsage};
