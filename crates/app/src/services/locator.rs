//! Resource locator — the addressing authority of the API.
//!
//! Maps every [`EntityRef`] to exactly one canonical URI and parses URIs back
//! into references. The address space is:
//!
//! ```text
//! <prefix>/v1
//! <prefix>/v1/devices
//! <prefix>/v1/devices/<domain>/<family>/<member>
//! <prefix>/v1/devices/<domain>/<family>/<member>/state
//! <prefix>/v1/devices/<domain>/<family>/<member>/{attributes,commands,properties}
//! <prefix>/v1/devices/<domain>/<family>/<member>/{attributes,commands,properties}/<name>
//! <prefix>/v1/devices/<domain>/<family>/<member>/attributes/<name>/info
//! ```
//!
//! `…/state` is an alias: it resolves to the device state, whose canonical
//! address is `…/attributes/State`.

use std::borrow::Cow;
use std::fmt;

use tangorest_domain::entity::{ChildKind, EntityRef};
use tangorest_domain::error::ValidationError;
use tangorest_domain::path::{DevicePath, MemberName, validate_segment};

/// Prefix the API is mounted under unless configured otherwise.
pub const DEFAULT_PREFIX: &str = "/rest";

const DEVICES: &str = "devices";
const STATE: &str = "state";
const INFO: &str = "info";

/// Versions of the address space this locator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApiVersion {
    #[default]
    V1,
}

impl ApiVersion {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
        }
    }

    /// Parse a version segment; matching is exact.
    #[must_use]
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "v1" => Some(Self::V1),
            _ => None,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URI that does not name any entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot resolve '{path}': {reason}")]
pub struct Unresolvable {
    pub path: String,
    pub reason: UnresolvableReason,
}

/// Why a URI could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnresolvableReason {
    #[error("not under the API root {0}")]
    OutsideApiRoot(String),
    #[error("unknown API version '{0}'")]
    UnknownVersion(String),
    #[error("no resource named '{0}'")]
    UnknownResource(String),
    #[error("segment is not valid percent-encoded UTF-8")]
    InvalidEncoding,
    #[error("invalid segment: {0}")]
    InvalidSegment(#[from] ValidationError),
    #[error("path stops before naming a resource")]
    Incomplete,
}

/// Bidirectional mapping between entity references and URIs.
///
/// Built once at startup and passed to whoever needs to address resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    prefix: String,
    version: ApiVersion,
}

impl Default for ResourceLocator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl ResourceLocator {
    /// Create a locator for the API mounted under `prefix` (e.g. `/rest`).
    ///
    /// A trailing slash on the prefix is ignored.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        while prefix.ends_with('/') {
            prefix.pop();
        }
        Self {
            prefix,
            version: ApiVersion::default(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// Canonical URI of `entity`.
    ///
    /// Device segments are already lower-cased and names only contain
    /// unreserved characters, so no escaping is needed.
    #[must_use]
    pub fn encode(&self, entity: &EntityRef) -> String {
        let mut uri = format!("{}/{}", self.prefix, self.version);
        match entity {
            EntityRef::Database => {}
            EntityRef::DeviceList => push_segment(&mut uri, DEVICES),
            EntityRef::Device(device) => push_device(&mut uri, device),
            EntityRef::DeviceState(device) => {
                push_child(&mut uri, device, ChildKind::Attributes, MemberName::STATE);
            }
            EntityRef::Collection(device, kind) => {
                push_device(&mut uri, device);
                push_segment(&mut uri, kind.segment());
            }
            EntityRef::Attribute(attribute) => {
                push_child(
                    &mut uri,
                    attribute.device(),
                    ChildKind::Attributes,
                    attribute.name().as_str(),
                );
            }
            EntityRef::AttributeInfo(device, name) => {
                push_child(&mut uri, device, ChildKind::Attributes, name.as_str());
                push_segment(&mut uri, INFO);
            }
            EntityRef::Command(device, name) => {
                push_child(&mut uri, device, ChildKind::Commands, name.as_str());
            }
            EntityRef::Property(device, name) => {
                push_child(&mut uri, device, ChildKind::Properties, name.as_str());
            }
        }
        uri
    }

    /// Resolve a request URI into the entity it names.
    ///
    /// Query string and fragment are ignored. Segments are percent-decoded
    /// before validation, so encoded traversal sequences are rejected too.
    ///
    /// # Errors
    ///
    /// Returns [`Unresolvable`] when the URI is outside the API root, uses an
    /// unknown version, contains an invalid segment, or does not match the
    /// address grammar.
    pub fn decode(&self, uri: &str) -> Result<EntityRef, Unresolvable> {
        let path = uri.split(['?', '#']).next().unwrap_or_default();
        self.resolve(path).map_err(|reason| Unresolvable {
            path: path.to_string(),
            reason,
        })
    }

    fn resolve(&self, path: &str) -> Result<EntityRef, UnresolvableReason> {
        let rest = path
            .strip_prefix(self.prefix.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .ok_or_else(|| UnresolvableReason::OutsideApiRoot(self.prefix.clone()))?;
        let decoded = rest
            .split('/')
            .skip(1)
            .map(decode_segment)
            .collect::<Result<Vec<_>, _>>()?;
        let segments: Vec<&str> = decoded.iter().map(std::ops::Deref::deref).collect();

        match segments.as_slice() {
            [] => Err(UnresolvableReason::Incomplete),
            [version, tail @ ..] => {
                if ApiVersion::parse(version) != Some(self.version) {
                    return Err(UnresolvableReason::UnknownVersion((*version).to_string()));
                }
                resolve_under_root(tail)
            }
        }
    }
}

fn push_segment(uri: &mut String, segment: &str) {
    uri.push('/');
    uri.push_str(segment);
}

fn push_device(uri: &mut String, device: &DevicePath) {
    push_segment(uri, DEVICES);
    push_segment(uri, device.domain());
    push_segment(uri, device.family());
    push_segment(uri, device.member());
}

fn push_child(uri: &mut String, device: &DevicePath, kind: ChildKind, name: &str) {
    push_device(uri, device);
    push_segment(uri, kind.segment());
    push_segment(uri, name);
}

fn decode_segment(raw: &str) -> Result<Cow<'_, str>, UnresolvableReason> {
    let decoded = urlencoding::decode(raw).map_err(|_| UnresolvableReason::InvalidEncoding)?;
    validate_segment(&decoded)?;
    Ok(decoded)
}

fn resolve_under_root(segments: &[&str]) -> Result<EntityRef, UnresolvableReason> {
    match segments {
        [] => Ok(EntityRef::Database),
        [DEVICES] => Ok(EntityRef::DeviceList),
        [DEVICES, domain, family, member, tail @ ..] => {
            let device = DevicePath::new(domain, family, member)?;
            resolve_device(device, tail)
        }
        [DEVICES, ..] => Err(UnresolvableReason::Incomplete),
        [other, ..] => Err(UnresolvableReason::UnknownResource((*other).to_string())),
    }
}

fn resolve_device(device: DevicePath, tail: &[&str]) -> Result<EntityRef, UnresolvableReason> {
    let [collection, rest @ ..] = tail else {
        return Ok(EntityRef::Device(device));
    };
    if *collection == STATE && rest.is_empty() {
        return Ok(EntityRef::DeviceState(device));
    }
    let kind = ChildKind::from_segment(collection)
        .ok_or_else(|| UnresolvableReason::UnknownResource((*collection).to_string()))?;
    match (kind, rest) {
        (_, []) => Ok(EntityRef::Collection(device, kind)),
        (_, [name]) => Ok(EntityRef::child(device, kind, MemberName::new(*name)?)),
        (ChildKind::Attributes, [name, INFO]) => {
            Ok(EntityRef::AttributeInfo(device, MemberName::new(*name)?))
        }
        (_, [_, extra, ..]) => Err(UnresolvableReason::UnknownResource((*extra).to_string())),
    }
}
