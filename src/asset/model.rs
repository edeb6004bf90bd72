use serde::Serialize;
use std::fmt;

use crate::files::{File, FileState};

/// Readiness of an uploaded asset as seen by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetState {
    /// Still being processed remotely
    Pending,
    /// Usable in generation requests
    Active,
    /// Remote processing failed
    Failed,
    /// Anything the remote reported that we do not recognise
    Unknown,
}

impl AssetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FileState> for AssetState {
    fn from(state: FileState) -> Self {
        match state {
            FileState::Processing => AssetState::Pending,
            FileState::Active => AssetState::Active,
            FileState::Failed => AssetState::Failed,
            FileState::StateUnspecified | FileState::Unknown => AssetState::Unknown,
        }
    }
}

/// A snapshot of an uploaded file. Never mutated; each status fetch yields a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteAsset {
    /// Resource name, e.g. `files/abc-123`
    pub handle: String,
    pub state: AssetState,
    /// URI to reference the asset in generation requests
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    /// Remote error message, present when processing failed
    pub error: Option<String>,
}

impl From<File> for RemoteAsset {
    fn from(file: File) -> Self {
        Self {
            handle: file.name,
            state: file.state.into(),
            uri: file.uri,
            mime_type: file.mime_type.map(|mime| mime.to_string()),
            error: file
                .error
                .map(|status| status.message)
                .filter(|message| !message.is_empty()),
        }
    }
}
