//! AI drafting and enhancement client.
//!
//! Any non-success answer means "no content produced"; callers keep the
//! original text untouched. `GenerationSession` runs one request at a time on
//! a worker thread and discards responses that arrive after a cancel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use clap::ValueEnum;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ReportError, Result, require};
use crate::model::AcademicDetails;

use super::{endpoint, http_client};

const GENERATE_ACTION: &str = "generate report";
const ENHANCE_ACTION: &str = "enhance content";

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub title: String,
    /// Template id in standard mode, report type in academic mode.
    pub template_or_report_type: String,
    pub source_document_text: String,
    pub additional_instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_details: Option<AcademicDetails>,
    pub include_abstract: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EnhancementType {
    Expand,
    AddCitations,
    AcademicTone,
    AddExamples,
    Simplify,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementRequest {
    pub selected_text: String,
    pub enhancement_type: EnhancementType,
    pub tone: String,
}

pub trait ContentGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
    fn enhance(&self, request: &EnhancementRequest) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct GeneratedContent {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpContentGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpContentGenerator {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = require("configure ai client", "service url", base_url)?.to_string();
        Ok(Self {
            client: http_client("configure ai client", timeout)?,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    fn post<T: Serialize>(&self, action: &'static str, path: &str, body: &T) -> Result<String> {
        let url = endpoint(&self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|err| ReportError::External {
            action,
            cause: err.to_string(),
        })?;
        let status = response.status();
        if let Some(err) = status_error(action, status) {
            warn!(status = status.as_u16(), url = %url, "ai service rejected request");
            return Err(err);
        }

        let body = response
            .json::<GeneratedContent>()
            .map_err(|err| ReportError::External {
                action,
                cause: format!("unreadable response: {err}"),
            })?;
        content_from_body(action, body)
    }
}

impl ContentGenerator for HttpContentGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        require(GENERATE_ACTION, "title", &request.title)?;
        self.post(GENERATE_ACTION, "generate-report", request)
    }

    fn enhance(&self, request: &EnhancementRequest) -> Result<String> {
        require(ENHANCE_ACTION, "selected text", &request.selected_text)?;
        self.post(ENHANCE_ACTION, "enhance-content", request)
    }
}

fn status_error(action: &'static str, status: StatusCode) -> Option<ReportError> {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Some(ReportError::RateLimited { action }),
        StatusCode::PAYMENT_REQUIRED => Some(ReportError::QuotaExhausted { action }),
        status if !status.is_success() => Some(ReportError::External {
            action,
            cause: format!("service returned {status}"),
        }),
        _ => None,
    }
}

fn content_from_body(action: &'static str, body: GeneratedContent) -> Result<String> {
    if let Some(error) = body.error.filter(|error| !error.trim().is_empty()) {
        return Err(ReportError::External {
            action,
            cause: error,
        });
    }

    match body.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(ReportError::External {
            action,
            cause: "service returned no content".to_string(),
        }),
    }
}

/// Owns the "current request" generation counter. Starting a request or
/// cancelling bumps the counter; a pending request whose id no longer matches
/// drops its response.
pub struct GenerationSession {
    generator: Arc<dyn ContentGenerator>,
    current: Arc<AtomicU64>,
}

pub struct PendingGeneration {
    id: u64,
    current: Arc<AtomicU64>,
    receiver: mpsc::Receiver<Result<String>>,
}

impl GenerationSession {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            generator,
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run `request` on a worker thread. Supersedes any request still pending.
    pub fn start(&self, request: GenerationRequest) -> PendingGeneration {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        let (sender, receiver) = mpsc::channel();
        let generator = Arc::clone(&self.generator);

        thread::spawn(move || {
            let result = generator.generate(&request);
            // The receiver is gone when the caller stopped waiting.
            let _ = sender.send(result);
        });

        debug!(request_id = id, "started generation");
        PendingGeneration {
            id,
            current: Arc::clone(&self.current),
            receiver,
        }
    }

    pub fn cancel(&self) {
        let previous = self.current.fetch_add(1, Ordering::SeqCst);
        info!(request_id = previous, "cancelled generation");
    }
}

impl PendingGeneration {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.id
    }

    /// Block until the worker answers. With a timeout, expiry cancels this
    /// request and reports a failure.
    pub fn wait(self, timeout: Option<Duration>) -> Result<String> {
        let received = match timeout {
            Some(limit) => match self.receiver.recv_timeout(limit) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => {
                    let _ = self.current.compare_exchange(
                        self.id,
                        self.id + 1,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    );
                    return Err(ReportError::External {
                        action: GENERATE_ACTION,
                        cause: format!("timed out after {}s", limit.as_secs_f32()),
                    });
                }
                Err(RecvTimeoutError::Disconnected) => return Err(worker_exited()),
            },
            None => self.receiver.recv().map_err(|_| worker_exited())?,
        };

        if !self.is_current() {
            debug!(request_id = self.id, "discarding late generation response");
            return Err(ReportError::Cancelled {
                action: GENERATE_ACTION,
            });
        }
        received
    }
}

fn worker_exited() -> ReportError {
    ReportError::External {
        action: GENERATE_ACTION,
        cause: "generation worker exited without a response".to_string(),
    }
}
