//! Source document ingestion. Plain text formats are decoded locally; PDF and
//! Word files go through a remote extraction service.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ReportError, Result, require};
use crate::util::{now_utc_string, sha256_hex};

use super::{endpoint, http_client};

const INGEST_ACTION: &str = "ingest document";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    Markdown,
    Csv,
    Json,
    Pdf,
    Docx,
    Doc,
}

impl SourceKind {
    /// Resolve from a declared MIME type first, then the file extension.
    pub fn detect(file_name: &str, declared: Option<&str>) -> Option<Self> {
        if let Some(kind) = declared.and_then(Self::from_mime) {
            return Some(kind);
        }
        let extension = Path::new(file_name)
            .extension()
            .and_then(|value| value.to_str())?
            .to_ascii_lowercase();
        match extension.as_str() {
            "txt" | "text" | "log" => Some(Self::Text),
            "md" | "markdown" => Some(Self::Markdown),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            _ => None,
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" => Some(Self::Text),
            "text/markdown" => Some(Self::Markdown),
            "text/csv" => Some(Self::Csv),
            "application/json" => Some(Self::Json),
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "application/msword" => Some(Self::Doc),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Markdown => "text/markdown",
            Self::Csv => "text/csv",
            Self::Json => "application/json",
            Self::Pdf => "application/pdf",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Doc => "application/msword",
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(self, Self::Pdf | Self::Docx | Self::Doc)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceDocument {
    pub file_name: String,
    pub kind: SourceKind,
    pub byte_len: usize,
    pub sha256: String,
    pub char_count: usize,
    pub extracted_at: String,
    pub text: String,
}

/// Turns binary document bytes into plain text.
pub trait RemoteExtractor {
    fn extract(&self, file_name: &str, kind: SourceKind, bytes: &[u8]) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ExtractedText {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpExtractor {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpExtractor {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = require("configure extractor", "service url", base_url)?;
        Ok(Self {
            client: http_client("configure extractor", timeout)?,
            base_url: base_url.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

impl RemoteExtractor for HttpExtractor {
    fn extract(&self, file_name: &str, kind: SourceKind, bytes: &[u8]) -> Result<String> {
        let mut request = self
            .client
            .post(endpoint(&self.base_url, "extract-text"))
            .header(CONTENT_TYPE, kind.mime())
            .header("X-File-Name", file_name)
            .body(bytes.to_vec());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|err| ReportError::External {
            action: INGEST_ACTION,
            cause: err.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::External {
                action: INGEST_ACTION,
                cause: format!("extraction service returned {status}"),
            });
        }

        let body = response
            .json::<ExtractedText>()
            .map_err(|err| ReportError::External {
                action: INGEST_ACTION,
                cause: format!("unreadable response: {err}"),
            })?;
        if let Some(error) = body.error.filter(|error| !error.trim().is_empty()) {
            return Err(ReportError::External {
                action: INGEST_ACTION,
                cause: error,
            });
        }
        Ok(body.text.unwrap_or_default())
    }
}

/// Lossy UTF-8 decode with any leading byte-order mark removed.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

pub fn ingest(
    file_name: &str,
    bytes: &[u8],
    declared: Option<&str>,
    extractor: Option<&dyn RemoteExtractor>,
) -> Result<SourceDocument> {
    if bytes.is_empty() {
        return Err(ReportError::Validation {
            action: INGEST_ACTION,
            field: "file content",
        });
    }
    let Some(kind) = SourceKind::detect(file_name, declared) else {
        return Err(ReportError::External {
            action: INGEST_ACTION,
            cause: format!("unsupported file type: {file_name}"),
        });
    };

    let text = if kind.is_binary() {
        let Some(extractor) = extractor else {
            return Err(ReportError::External {
                action: INGEST_ACTION,
                cause: "no extraction service configured for binary documents".to_string(),
            });
        };
        debug!(file = %file_name, kind = ?kind, "sending document to extractor");
        extractor.extract(file_name, kind, bytes)?
    } else {
        decode_text(bytes)
    };

    if text.trim().is_empty() {
        return Err(ReportError::External {
            action: INGEST_ACTION,
            cause: format!("no text could be extracted from {file_name}"),
        });
    }

    info!(file = %file_name, kind = ?kind, chars = text.chars().count(), "ingested document");
    Ok(SourceDocument {
        file_name: file_name.to_string(),
        kind,
        byte_len: bytes.len(),
        sha256: sha256_hex(bytes),
        char_count: text.chars().count(),
        extracted_at: now_utc_string(),
        text,
    })
}

/// Concatenate documents into one source text block for generation.
pub fn combine_sources(documents: &[SourceDocument]) -> String {
    documents
        .iter()
        .map(|document| format!("--- {} ---\n{}", document.file_name, document.text.trim()))
        .collect::<Vec<String>>()
        .join("\n\n")
}
