//! The JSON envelope printed for every command.
//!
//! Success and failure share one shape: `success` plus either `text`/`usage` or
//! `error`/`kind`. How non-ASCII characters are written is chosen by the caller through
//! [`OutputEncoding`].

use display_error_chain::DisplayErrorChain;
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::io::{self, Write};

use crate::{
    analysis::{Analysis, ConnectionReport, TokenUsage},
    error::ErrorKind,
};

const CONNECTION_OK: &str = "connection OK";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Envelope {
    fn empty(success: bool) -> Self {
        Self {
            success,
            message: None,
            text: None,
            file_id: None,
            usage: None,
            response_time_ms: None,
            error: None,
            kind: None,
        }
    }

    pub fn analysis(analysis: Analysis) -> Self {
        Self {
            text: analysis.text,
            file_id: analysis.file_id,
            usage: Some(analysis.usage),
            ..Self::empty(true)
        }
    }

    pub fn connection(report: ConnectionReport) -> Self {
        Self {
            message: Some(CONNECTION_OK.to_string()),
            text: report.text,
            usage: Some(report.usage),
            response_time_ms: Some(
                u64::try_from(report.response_time.as_millis()).unwrap_or(u64::MAX),
            ),
            ..Self::empty(true)
        }
    }

    /// A failure carrying the full chain of `error` and its sources.
    pub fn failure<E>(error: &E, kind: ErrorKind) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self {
            error: Some(DisplayErrorChain::new(error).to_string()),
            kind: Some(kind),
            ..Self::empty(false)
        }
    }
}

/// How characters outside ASCII are written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// Raw UTF-8
    #[default]
    Utf8,
    /// Escaped as `\uXXXX`, with surrogate pairs beyond the BMP
    Ascii,
}

/// Write `envelope` as one line of compact JSON.
pub fn write_envelope<W: Write>(
    mut writer: W,
    envelope: &Envelope,
    encoding: OutputEncoding,
) -> io::Result<()> {
    match encoding {
        OutputEncoding::Utf8 => serde_json::to_writer(&mut writer, envelope)?,
        OutputEncoding::Ascii => {
            let mut serializer = Serializer::with_formatter(&mut writer, AsciiFormatter);
            envelope.serialize(&mut serializer)?;
        }
    }
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Compact output with every non-ASCII character escaped. All other tokens use the
/// default (compact) formatting.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut rest = fragment;
        while let Some(offset) = rest.find(|c: char| !c.is_ascii()) {
            writer.write_all(rest[..offset].as_bytes())?;

            let mut chars = rest[offset..].chars();
            if let Some(c) = chars.next() {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
            rest = chars.as_str();
        }
        writer.write_all(rest.as_bytes())
    }
}
