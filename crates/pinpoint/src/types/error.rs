/*! Error types for Pinpoint operations. */

use super::{AnnotationId, NodeId};

/// Errors that can occur inside Pinpoint.
///
/// Most public entry points never surface these: they are logged and turned
/// into a sentinel (`None`, `false`, empty list) at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum PinpointError {
  #[error("Annotation not found: {0}")]
  AnnotationNotFound(AnnotationId),

  #[error("Node not found: {0}")]
  NodeNotFound(NodeId),

  #[error("Invalid selector '{selector}': {reason}")]
  InvalidSelector { selector: String, reason: String },

  #[error("Storage error: {0}")]
  Storage(String),

  #[error("Storage quota exceeded writing '{key}': needed {needed} bytes, {available} available")]
  QuotaExceeded {
    key: String,
    needed: usize,
    available: usize,
  },

  #[error("Serialization error: {0}")]
  Serialization(String),

  #[error("Before-create hook failed: {0}")]
  Hook(String),

  #[error("Invalid DOM snapshot: {0}")]
  InvalidSnapshot(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PinpointError {
  fn from(e: serde_json::Error) -> Self {
    Self::Serialization(e.to_string())
  }
}

/// Result type for Pinpoint operations.
pub type PinpointResult<T> = Result<T, PinpointError>;
