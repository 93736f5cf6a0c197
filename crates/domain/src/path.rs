//! Device paths and member names — the naming authority's vocabulary.
//!
//! The control system names devices with three segments
//! (`domain/family/member`) and matches them case-insensitively. A
//! [`DevicePath`] is therefore stored lower-cased, which is the canonical case
//! echoed back in links. Attribute, command and property names
//! ([`MemberName`]) keep the case they were given; the control system reports
//! their canonical spelling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Check a single name segment against the naming rules.
///
/// Segments are non-empty, made of ASCII letters, digits, `_`, `-` and `.`,
/// and never consist of dots only (`.`, `..`, …).
///
/// # Errors
///
/// Returns the first rule the segment breaks.
pub fn validate_segment(segment: &str) -> Result<(), ValidationError> {
    if segment.is_empty() {
        return Err(ValidationError::EmptySegment);
    }
    if segment.chars().all(|c| c == '.') {
        return Err(ValidationError::PathTraversal(segment.to_string()));
    }
    if let Some(character) = segment.chars().find(|c| !is_allowed(*c)) {
        return Err(ValidationError::DisallowedCharacter {
            segment: segment.to_string(),
            character,
        });
    }
    Ok(())
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Identity of a device: `domain/family/member`, lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DevicePath {
    domain: String,
    family: String,
    member: String,
}

impl DevicePath {
    /// Validate the three segments and normalise them to canonical case.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if any segment breaks the naming rules.
    pub fn new(domain: &str, family: &str, member: &str) -> Result<Self, ValidationError> {
        validate_segment(domain)?;
        validate_segment(family)?;
        validate_segment(member)?;
        Ok(Self {
            domain: domain.to_ascii_lowercase(),
            family: family.to_ascii_lowercase(),
            member: member.to_ascii_lowercase(),
        })
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    #[must_use]
    pub fn member(&self) -> &str {
        &self.member
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.domain, self.family, self.member)
    }
}

impl FromStr for DevicePath {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(domain), Some(family), Some(member), None) => Self::new(domain, family, member),
            _ => Err(ValidationError::WrongSegmentCount(s.to_string())),
        }
    }
}

impl TryFrom<String> for DevicePath {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DevicePath> for String {
    fn from(path: DevicePath) -> Self {
        path.to_string()
    }
}

/// Name of an attribute, command or property on a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberName(String);

impl MemberName {
    /// Name of the well-known attribute holding the device state.
    pub const STATE: &'static str = "State";
    /// Name of the well-known attribute holding the device status text.
    pub const STATUS: &'static str = "Status";

    /// Validate a member name, keeping its case.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name breaks the naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_segment(&name)?;
        Ok(Self(name))
    }

    /// The `State` attribute name.
    #[must_use]
    pub fn state() -> Self {
        Self(Self::STATE.to_string())
    }

    /// The `Status` attribute name.
    #[must_use]
    pub fn status() -> Self {
        Self(Self::STATUS.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, the way the control system matches names.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    /// Whether this names the well-known `State` attribute.
    #[must_use]
    pub fn is_state(&self) -> bool {
        self.matches(Self::STATE)
    }
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MemberName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for MemberName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MemberName> for String {
    fn from(name: MemberName) -> Self {
        name.0
    }
}
