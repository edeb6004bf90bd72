use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::common::serde::{deserialize_optional_string_to_i64, mime_as_string};

/// Metadata for a file stored by the Files API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Resource name, e.g. `files/abc-123`
    pub name: String,

    /// Human-readable display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(
        default,
        with = "mime_as_string::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub mime_type: Option<mime::Mime>,

    /// Size in bytes, sent by the API as a string
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_string_to_i64"
    )]
    pub size_bytes: Option<i64>,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub create_time: Option<OffsetDateTime>,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub update_time: Option<OffsetDateTime>,

    /// When the API garbage-collects the file (48 hours after upload)
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expiration_time: Option<OffsetDateTime>,

    /// URI to reference the file in generation requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Processing state; missing on some upload responses
    #[serde(default)]
    pub state: FileState,

    /// Processing error, set when `state` is `FAILED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,
}

/// The processing state of an uploaded file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    #[default]
    StateUnspecified,
    /// The file is being processed and cannot be used for inference yet
    Processing,
    /// Ready for inference
    Active,
    /// Processing failed
    Failed,
    /// A state this crate does not know about
    #[serde(other)]
    Unknown,
}

/// A `google.rpc.Status` error payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Body of the resumable upload `start` command
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateFileRequest {
    pub file: CreateFileMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateFileMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Body returned by the `upload, finalize` command
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadFileResponse {
    pub file: File,
}
