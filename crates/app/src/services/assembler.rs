//! Response assembler — final representations and failure kinds.
//!
//! A response is either a fully linked [`Representation`] or an
//! [`ErrorRepresentation`]; there is no hybrid carrying partial links.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::{Map, Value};

use tangorest_domain::error::DeviceError;

use crate::services::link_graph::LinkRelations;
use crate::services::locator::Unresolvable;

const LINKS_KEY: &str = "_links";

/// Machine-readable classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    /// The URI does not match the address grammar.
    Unresolvable,
    /// The URI is well formed but the entity does not exist.
    NotFound,
    /// The method is not supported by the resource kind.
    MethodNotAllowed,
    MalformedRequestBody,
    UpstreamUnreachable,
    UpstreamTimeout,
    UpstreamPermissionDenied,
    /// The control system refused the value or operation.
    UpstreamRejected,
    /// A representation could not be serialised.
    Internal,
}

impl FailureKind {
    /// HTTP status code clients receive for this kind.
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            Self::Unresolvable | Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::MalformedRequestBody => 400,
            Self::UpstreamPermissionDenied => 403,
            Self::UpstreamRejected => 422,
            Self::UpstreamUnreachable => 502,
            Self::UpstreamTimeout => 504,
            Self::Internal => 500,
        }
    }

    /// Whether the failure originates in the control system.
    #[must_use]
    pub fn is_upstream(self) -> bool {
        matches!(
            self,
            Self::UpstreamUnreachable
                | Self::UpstreamTimeout
                | Self::UpstreamPermissionDenied
                | Self::UpstreamRejected
        )
    }
}

impl From<&DeviceError> for FailureKind {
    fn from(err: &DeviceError) -> Self {
        match err {
            DeviceError::Unreachable { .. } => Self::UpstreamUnreachable,
            DeviceError::Timeout { .. } => Self::UpstreamTimeout,
            DeviceError::PermissionDenied { .. } => Self::UpstreamPermissionDenied,
            DeviceError::Rejected { .. } => Self::UpstreamRejected,
            DeviceError::Unknown { .. } => Self::NotFound,
        }
    }
}

/// A request that ended in a `Failed` state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {detail}")]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}

impl Failure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<DeviceError> for Failure {
    fn from(err: DeviceError) -> Self {
        Self::new(FailureKind::from(&err), err.to_string())
    }
}

impl From<Unresolvable> for Failure {
    fn from(err: Unresolvable) -> Self {
        Self::new(FailureKind::Unresolvable, err.to_string())
    }
}

/// Successful response body: payload fields followed by `_links`.
#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    payload: Map<String, Value>,
    links: LinkRelations,
}

impl Representation {
    #[must_use]
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    #[must_use]
    pub fn links(&self) -> &LinkRelations {
        &self.links
    }
}

impl Serialize for Representation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.payload.len() + 1))?;
        for (key, value) in &self.payload {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(LINKS_KEY, &self.links)?;
        map.end()
    }
}

/// Error response body: `{"error": {"kind": …, "detail": …}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRepresentation {
    error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ErrorBody {
    kind: FailureKind,
    detail: String,
}

impl ErrorRepresentation {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        self.error.kind
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.error.detail
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.error.kind.status_code()
    }
}

impl From<Failure> for ErrorRepresentation {
    fn from(failure: Failure) -> Self {
        ResponseAssembler::assemble_error(failure.kind, failure.detail)
    }
}

/// Builds the outbound representations.
pub struct ResponseAssembler;

impl ResponseAssembler {
    /// Merge a payload with its links. A `_links` field already present in
    /// the payload is dropped in favour of `links`.
    #[must_use]
    pub fn assemble(mut payload: Map<String, Value>, links: LinkRelations) -> Representation {
        payload.remove(LINKS_KEY);
        Representation { payload, links }
    }

    pub fn assemble_error(kind: FailureKind, detail: impl Into<String>) -> ErrorRepresentation {
        ErrorRepresentation {
            error: ErrorBody {
                kind,
                detail: detail.into(),
            },
        }
    }

    /// Turn a domain value into payload fields.
    ///
    /// Objects contribute their fields; any other JSON value is placed under
    /// `value`.
    ///
    /// # Errors
    ///
    /// Returns an [`FailureKind::Internal`] failure when `value` cannot be
    /// serialised.
    pub fn payload<T: Serialize>(value: &T) -> Result<Map<String, Value>, Failure> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Ok(map)
            }
            Err(err) => Err(Failure::new(
                FailureKind::Internal,
                format!("cannot serialise representation: {err}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::link_graph::{LinkTarget, Relation};
    use serde_json::json;

    fn self_link(uri: &str) -> LinkRelations {
        let mut links = LinkRelations::default();
        links.insert(Relation::SelfLink, LinkTarget::One(uri.to_string()));
        links
    }

    #[test]
    fn should_append_links_after_payload_fields() {
        let payload = ResponseAssembler::payload(&json!({"state": "ON", "status": "ok"})).unwrap();
        let representation = ResponseAssembler::assemble(payload, self_link("/rest/v1"));
        assert_eq!(
            serde_json::to_string(&representation).unwrap(),
            r#"{"state":"ON","status":"ok","_links":{"_self":"/rest/v1"}}"#
        );
    }

    #[test]
    fn should_replace_links_smuggled_in_payload() {
        let payload =
            ResponseAssembler::payload(&json!({"name": "x", "_links": {"_self": "bogus"}})).unwrap();
        let representation = ResponseAssembler::assemble(payload, self_link("/rest/v1"));
        let value = serde_json::to_value(&representation).unwrap();
        assert_eq!(value, json!({"name": "x", "_links": {"_self": "/rest/v1"}}));
    }

    #[test]
    fn should_wrap_non_object_payload_under_value() {
        let payload = ResponseAssembler::payload(&42).unwrap();
        assert_eq!(payload.get("value"), Some(&json!(42)));
    }

    #[test]
    fn should_serialize_error_without_links() {
        let error = ResponseAssembler::assemble_error(FailureKind::NotFound, "no such device");
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(
            value,
            json!({"error": {"kind": "NotFound", "detail": "no such device"}})
        );
        assert!(value.get("_links").is_none());
    }

    #[test]
    fn should_map_kinds_to_status_codes() {
        assert_eq!(FailureKind::Unresolvable.status_code(), 404);
        assert_eq!(FailureKind::NotFound.status_code(), 404);
        assert_eq!(FailureKind::MethodNotAllowed.status_code(), 405);
        assert_eq!(FailureKind::MalformedRequestBody.status_code(), 400);
        assert_eq!(FailureKind::UpstreamUnreachable.status_code(), 502);
        assert_eq!(FailureKind::UpstreamTimeout.status_code(), 504);
        assert_eq!(FailureKind::UpstreamPermissionDenied.status_code(), 403);
    }

    #[test]
    fn should_pass_device_errors_through_as_upstream_kinds() {
        let cases = [
            (
                DeviceError::Unreachable {
                    device: "a/b/c".to_string(),
                },
                FailureKind::UpstreamUnreachable,
            ),
            (
                DeviceError::Timeout {
                    device: "a/b/c".to_string(),
                },
                FailureKind::UpstreamTimeout,
            ),
            (
                DeviceError::PermissionDenied {
                    reason: "locked".to_string(),
                },
                FailureKind::UpstreamPermissionDenied,
            ),
            (DeviceError::rejected("read-only"), FailureKind::UpstreamRejected),
            (DeviceError::unknown("device a/b/c"), FailureKind::NotFound),
        ];
        for (err, kind) in cases {
            let failure = Failure::from(err.clone());
            assert_eq!(failure.kind, kind);
            assert_eq!(failure.detail, err.to_string());
        }
    }

    #[test]
    fn should_flag_only_control_system_failures_as_upstream() {
        assert!(FailureKind::UpstreamTimeout.is_upstream());
        assert!(!FailureKind::NotFound.is_upstream());
        assert!(!FailureKind::MalformedRequestBody.is_upstream());
    }
}
