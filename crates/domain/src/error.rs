//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors; the domain only knows about
//! malformed names and about failures reported by the control system.

/// A device path segment or member name that breaks the naming rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name segment must not be empty")]
    EmptySegment,
    #[error("'{0}' is a path traversal segment")]
    PathTraversal(String),
    #[error("'{segment}' contains the disallowed character {character:?}")]
    DisallowedCharacter { segment: String, character: char },
    #[error("device path '{0}' must have exactly three segments")]
    WrongSegmentCount(String),
}

/// Failure reported by the control system behind the entity model port.
///
/// These are passed through to clients as upstream failures and are never
/// reinterpreted as addressing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The device (or its server) cannot be reached.
    #[error("device {device} is unreachable")]
    Unreachable { device: String },
    /// The device, attribute, command or property does not exist.
    #[error("{what} not found on the control system")]
    Unknown { what: String },
    /// The control system refused the operation.
    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },
    /// The call did not complete in time.
    #[error("call to {device} timed out")]
    Timeout { device: String },
    /// The control system rejected the request (wrong type, read-only, …).
    #[error("rejected by the control system: {reason}")]
    Rejected { reason: String },
}

impl DeviceError {
    /// Shorthand for [`DeviceError::Unknown`].
    pub fn unknown(what: impl Into<String>) -> Self {
        Self::Unknown { what: what.into() }
    }

    /// Shorthand for [`DeviceError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}
