//! Events sent to the client during a run.

use serde::{Deserialize, Serialize};
use tandem_core::{BranchMetrics, ModelId, RunId};

/// Terminal outcome carried by a `status` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    /// Branch finished successfully
    Complete,
    /// Branch failed, or its result could not be saved
    Error,
}

/// One outbound relay event, serialized as a single JSON object.
///
/// # Examples
///
/// ```
/// use tandem_core::ModelId;
/// use tandem_relay::RelayEvent;
///
/// let event = RelayEvent::chunk(ModelId::Gemini, "Hello ");
/// assert_eq!(
///     serde_json::to_string(&event).unwrap(),
///     r#"{"type":"chunk","modelId":"gemini","data":"Hello "}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RelayEvent {
    /// Run identifier, always first
    #[serde(rename_all = "camelCase")]
    Session {
        /// Identifier of the created run
        session_id: RunId,
    },
    /// One increment from a branch
    #[serde(rename_all = "camelCase")]
    Chunk {
        /// Branch the increment belongs to
        model_id: ModelId,
        /// Increment text
        data: String,
    },
    /// Branch terminal event, or a save warning
    #[serde(rename_all = "camelCase")]
    Status {
        /// Branch the status belongs to
        model_id: ModelId,
        /// Outcome
        status: BranchStatus,
        /// Present on successful completion
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metrics: Option<BranchMetrics>,
        /// Present on errors
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Both branches are done; nothing follows
    AllComplete,
}

impl RelayEvent {
    /// Chunk event.
    pub fn chunk(model_id: ModelId, data: impl Into<String>) -> Self {
        Self::Chunk {
            model_id,
            data: data.into(),
        }
    }

    /// Successful completion with metrics.
    pub fn complete(model_id: ModelId, metrics: BranchMetrics) -> Self {
        Self::Status {
            model_id,
            status: BranchStatus::Complete,
            metrics: Some(metrics),
            message: None,
        }
    }

    /// Error status with a user-facing message.
    pub fn error(model_id: ModelId, message: impl Into<String>) -> Self {
        Self::Status {
            model_id,
            status: BranchStatus::Error,
            metrics: None,
            message: Some(message.into()),
        }
    }

    /// Short name of the event type, as it appears in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayEvent::Session { .. } => "session",
            RelayEvent::Chunk { .. } => "chunk",
            RelayEvent::Status { .. } => "status",
            RelayEvent::AllComplete => "all-complete",
        }
    }
}
