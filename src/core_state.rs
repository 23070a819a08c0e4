//! Desk state shared by every command.
//!
//! One owner for the order store, the extraction backend, the chat input
//! buffer, the extraction status and the open review. State lives on the
//! interaction thread; only the model call runs on a worker, and its result
//! comes back over a channel.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use serde::Serialize;
use thiserror::Error;

use crate::models::{OrderDetails, OrderRecord};
use crate::orders::{OrderStore, StoreError};
use crate::pipeline::structuring::{ExtractionError, OrderExtractor};
use crate::review::{ReviewInputError, ReviewSession, ValidationReport};

/// Shown when extraction is triggered with nothing pasted.
pub const EMPTY_INPUT_MESSAGE: &str = "Please paste the chat text first.";

/// Shown for any network, service or response failure.
pub const EXTRACTION_FAILED_MESSAGE: &str = "AI failed to extract details. Please try again.";

/// Extraction trigger state. `Loading` disables the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtractionStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Please paste the chat text first.")]
    EmptyChatInput,
    #[error("An extraction is already in progress")]
    ExtractionInProgress,
    #[error("AI failed to extract details. Please try again.")]
    ExtractionFailed(#[source] ExtractionError),
    #[error("No order is open for review")]
    NoActiveReview,
    #[error(transparent)]
    ReviewInput(#[from] ReviewInputError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result of asking to save the open review.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Saved(OrderRecord),
    /// Validation failed; the review stays open, unchanged.
    Blocked(ValidationReport),
}

type ExtractionResult = Result<OrderDetails, ExtractionError>;

pub struct DeskState {
    store: OrderStore,
    extractor: Arc<dyn OrderExtractor>,
    chat_input: String,
    status: ExtractionStatus,
    review: Option<ReviewSession>,
    /// Last user-visible message (error or notice).
    message: Option<String>,
    /// Result channel of the extraction in flight, if any.
    pending: Option<Receiver<ExtractionResult>>,
}

impl DeskState {
    pub fn new(store: OrderStore, extractor: Arc<dyn OrderExtractor>) -> Self {
        Self {
            store,
            extractor,
            chat_input: String::new(),
            status: ExtractionStatus::Idle,
            review: None,
            message: None,
            pending: None,
        }
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    pub fn chat_input(&self) -> &str {
        &self.chat_input
    }

    pub fn set_chat_input(&mut self, text: &str) {
        self.chat_input = text.to_string();
    }

    pub fn status(&self) -> ExtractionStatus {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn review(&self) -> Option<&ReviewSession> {
        self.review.as_ref()
    }

    pub fn review_mut(&mut self) -> Result<&mut ReviewSession, CoreError> {
        self.review.as_mut().ok_or(CoreError::NoActiveReview)
    }

    // ── Extraction ──────────────────────────────────────────

    /// Check the input and mark the trigger busy. Returns the text to send.
    fn begin_extraction(&mut self) -> Result<String, CoreError> {
        if self.status == ExtractionStatus::Loading {
            return Err(CoreError::ExtractionInProgress);
        }
        if self.chat_input.trim().is_empty() {
            self.message = Some(EMPTY_INPUT_MESSAGE.to_string());
            return Err(CoreError::EmptyChatInput);
        }

        self.status = ExtractionStatus::Loading;
        self.message = None;
        Ok(self.chat_input.clone())
    }

    /// Apply the outcome of an extraction started with `begin_extraction`.
    /// The chat input is kept either way so the user can retry. A draft
    /// replaces any review opened while the call was in flight.
    fn finish_extraction(&mut self, result: ExtractionResult) -> Result<&ReviewSession, CoreError> {
        match result {
            Ok(draft) => {
                self.status = ExtractionStatus::Success;
                Ok(&*self.review.insert(ReviewSession::from_extraction(draft)))
            }
            Err(e) if e.is_input_error() => {
                self.status = ExtractionStatus::Idle;
                self.message = Some(EMPTY_INPUT_MESSAGE.to_string());
                Err(CoreError::EmptyChatInput)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Extraction failed");
                self.status = ExtractionStatus::Error;
                self.message = Some(EXTRACTION_FAILED_MESSAGE.to_string());
                Err(CoreError::ExtractionFailed(e))
            }
        }
    }

    /// Send the current chat input to the extractor on a worker thread.
    ///
    /// Returns once the worker is running; the status stays `Loading`
    /// until `poll_extraction` or `wait_extraction` picks up the result.
    pub fn start_extraction(&mut self) -> Result<(), CoreError> {
        let text = self.begin_extraction()?;
        let extractor = Arc::clone(&self.extractor);
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("order-extraction".into())
            .spawn(move || {
                // The receiver is gone only if the desk was dropped.
                let _ = tx.send(extractor.extract(&text));
            });

        match spawned {
            Ok(_) => {
                self.pending = Some(rx);
                Ok(())
            }
            Err(e) => {
                let failure = ExtractionError::Connection(format!("worker thread: {e}"));
                self.finish_extraction(Err(failure)).map(|_| ())
            }
        }
    }

    /// Apply the in-flight result if it has arrived. `None` while the call
    /// is still running or when nothing was started.
    pub fn poll_extraction(&mut self) -> Option<Result<&ReviewSession, CoreError>> {
        let rx = self.pending.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(worker_stopped()),
        };
        self.pending = None;
        Some(self.finish_extraction(result))
    }

    /// Block until the in-flight extraction finishes and apply it. `None`
    /// when nothing was started.
    pub fn wait_extraction(&mut self) -> Option<Result<&ReviewSession, CoreError>> {
        let rx = self.pending.take()?;
        let result = rx.recv().unwrap_or_else(|_| Err(worker_stopped()));
        Some(self.finish_extraction(result))
    }

    // ── Review ──────────────────────────────────────────────

    /// Open the blank manual-entry template.
    pub fn start_manual(&mut self) -> &ReviewSession {
        self.message = None;
        self.review.insert(ReviewSession::manual())
    }

    /// Save the open review as a confirmed order.
    ///
    /// On success the review closes, the chat input is cleared and the
    /// status resets. If only the snapshot write fails the order is still
    /// in history and the error is returned.
    pub fn confirm_review(&mut self) -> Result<ConfirmOutcome, CoreError> {
        let session = self.review.as_ref().ok_or(CoreError::NoActiveReview)?;
        let details = match session.confirm() {
            Ok(details) => details,
            Err(report) => return Ok(ConfirmOutcome::Blocked(report)),
        };

        self.review = None;
        self.chat_input.clear();
        self.status = ExtractionStatus::Idle;
        self.message = None;

        match self.store.append(details) {
            Ok(record) => Ok(ConfirmOutcome::Saved(record.clone())),
            Err(e) => {
                self.message = Some(format!("Order saved for this session only: {e}"));
                Err(CoreError::Store(e))
            }
        }
    }

    /// Close the open review without saving. Returns whether one was open.
    pub fn discard_review(&mut self) -> bool {
        match self.review.take() {
            Some(session) => {
                session.cancel();
                if self.status == ExtractionStatus::Success {
                    self.status = ExtractionStatus::Idle;
                }
                true
            }
            None => false,
        }
    }

    // ── History ─────────────────────────────────────────────

    pub fn delete_order(&mut self, id: &str) -> Result<bool, CoreError> {
        Ok(self.store.delete(id)?)
    }
}

fn worker_stopped() -> ExtractionError {
    ExtractionError::Connection("extraction worker stopped without a result".into())
}
