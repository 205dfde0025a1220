//! Error types for `lanas-core`.
//!
//! Each error variant carries enough context to diagnose the problem without
//! a debugger. Lead contents (names, emails) never appear in error messages,
//! only field identifiers and catalog codes.

use serde::Serialize;

use lanas_storage::StorageError;

use crate::form::FieldId;

/// A single reason a field fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldIssue {
    /// A required field is empty.
    #[error("{field} is required")]
    Missing { field: FieldId },

    /// The email field does not look like an address.
    #[error("{field} is not a valid email address")]
    InvalidEmail { field: FieldId },

    /// A choice field holds a code its catalog does not define.
    #[error("{field} has no option '{code}'")]
    UnknownCode { field: FieldId, code: String },

    /// `other` was selected but the paired free-text field is empty.
    #[error("{field} requires {text_field} when 'other' is selected")]
    OtherTextMissing { field: FieldId, text_field: FieldId },

    /// A multi-select holds more items than its ceiling allows.
    #[error("{field} allows at most {max} selections, got {actual}")]
    TooManySelections {
        field: FieldId,
        max: usize,
        actual: usize,
    },
}

impl FieldIssue {
    /// The field the issue is attached to.
    #[must_use]
    pub fn field(&self) -> FieldId {
        match self {
            Self::Missing { field }
            | Self::InvalidEmail { field }
            | Self::UnknownCode { field, .. }
            | Self::OtherTextMissing { field, .. }
            | Self::TooManySelections { field, .. } => *field,
        }
    }
}

/// Errors from step validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// One or more fields of a step are not satisfied.
    #[error("step {step} is incomplete: {}", describe(.issues))]
    Step { step: usize, issues: Vec<FieldIssue> },

    /// A single field failed while building the lead record.
    #[error("invalid field: {0}")]
    Field(FieldIssue),

    /// The step number is outside the step plan.
    #[error("step {step} does not exist (plan has {count} steps)")]
    NoSuchStep { step: usize, count: usize },
}

impl ValidationError {
    /// Field issues carried by this error (empty for [`ValidationError::NoSuchStep`]).
    #[must_use]
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::Step { issues, .. } => issues,
            Self::Field(issue) => std::slice::from_ref(issue),
            Self::NoSuchStep { .. } => &[],
        }
    }
}

fn describe(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from form state mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// The operation does not fit the field's kind (e.g. toggling a text field).
    #[error("{field} is a {actual} field, expected a {expected} field")]
    WrongKind {
        field: FieldId,
        expected: &'static str,
        actual: &'static str,
    },

    /// A field name that the form does not define.
    #[error("unknown field '{name}'")]
    UnknownField { name: String },
}

/// Errors from the lead store.
#[derive(Debug, thiserror::Error)]
pub enum LeadStoreError {
    /// The underlying storage backend failed.
    #[error("lead storage error: {0}")]
    Storage(#[from] StorageError),

    /// A lead could not be serialized for storage.
    #[error("failed to encode lead: {reason}")]
    Encode { reason: String },

    /// A stored lead could not be decoded.
    #[error("failed to decode lead at '{key}': {reason}")]
    Decode { key: String, reason: String },

    /// A database-backed store failed outside the key-value layer.
    #[error("lead database error: {reason}")]
    Database { reason: String },
}

/// Errors from sending the confirmation email.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// No email provider is configured.
    #[error("email delivery is not configured")]
    NotConfigured,

    /// The provider could not be reached.
    #[error("email transport failed: {reason}")]
    Transport { reason: String },

    /// The provider answered with an error status.
    #[error("email provider rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
}
