//! # Core Gemini API Data Primitives
//!
//! This module defines the building blocks shared by content generation requests and
//! responses: `Content`, `Part` and `Role`. Only the part kinds this crate sends are
//! modelled explicitly; anything else the API returns is kept as raw JSON.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user
    User,
    /// Message from the model
    Model,
}

/// Content part that can be included in a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Text content
    Text {
        /// The text content
        text: String,
        /// Whether this is a thought summary (Gemini 2.5 series only)
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Reference to a file previously uploaded through the Files API
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    /// Any part kind this crate does not interpret (function calls, inline blobs, ...)
    Other(serde_json::Value),
}

/// Coordinates of an uploaded file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// The MIME type of the referenced file
    pub mime_type: String,
    /// The URI returned by the Files API
    pub file_uri: String,
}

/// Content of a message
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Parts of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    /// Role of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Content {
    /// Create a new text content
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: Some(vec![Part::Text {
                text: text.into(),
                thought: None,
            }]),
            role: None,
        }
    }

    /// Create a new content referencing an uploaded file
    pub fn file_data(mime_type: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Self {
            parts: Some(vec![Part::FileData {
                file_data: FileData {
                    mime_type: mime_type.into(),
                    file_uri: file_uri.into(),
                },
            }]),
            role: None,
        }
    }

    /// Append the parts of another content to this one
    pub fn with_parts_of(mut self, other: Content) -> Self {
        if let Some(parts) = other.parts {
            self.parts.get_or_insert_with(Vec::new).extend(parts);
        }
        self
    }

    /// Add a role to this content
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}
