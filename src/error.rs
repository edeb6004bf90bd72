use serde::Serialize;
use std::fmt;

/// Coarse classification of every failure the CLI can report.
///
/// Each module keeps its own error enum; this is what callers of the JSON output get to
/// branch on instead of matching message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing API key, malformed proxy or base URL
    Configuration,
    /// Bad command-line usage or an unreadable local file
    Input,
    /// The local file to upload does not exist
    NotFound,
    /// The uploaded asset never became active
    Timeout,
    /// The remote store reported that processing failed
    ProcessingFailed,
    /// Network or API failure
    Remote,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Input => "input",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::ProcessingFailed => "processing_failed",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
