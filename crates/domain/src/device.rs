//! Device — state, status and static information reported for a device.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::DevicePath;

/// Operational state of a device, as defined by the control system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DevState {
    On,
    Off,
    Close,
    Open,
    Insert,
    Extract,
    Moving,
    Standby,
    Fault,
    Init,
    Running,
    Alarm,
    Disable,
    #[default]
    Unknown,
}

impl DevState {
    /// Upper-case wire name (`ON`, `STANDBY`, …).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Close => "CLOSE",
            Self::Open => "OPEN",
            Self::Insert => "INSERT",
            Self::Extract => "EXTRACT",
            Self::Moving => "MOVING",
            Self::Standby => "STANDBY",
            Self::Fault => "FAULT",
            Self::Init => "INIT",
            Self::Running => "RUNNING",
            Self::Alarm => "ALARM",
            Self::Disable => "DISABLE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DevState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `State` and `Status` attributes of a device, read together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    pub state: DevState,
    pub status: String,
}

/// Static information about a device and the server hosting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: DevicePath,
    pub class_name: String,
    pub server: String,
    pub hostname: String,
    pub exported: bool,
    pub pid: u32,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_unknown() {
        assert_eq!(DevState::default(), DevState::Unknown);
    }

    #[test]
    fn should_display_uppercase_name() {
        assert_eq!(DevState::On.to_string(), "ON");
        assert_eq!(DevState::Standby.to_string(), "STANDBY");
    }

    #[test]
    fn should_serialize_like_display() {
        for state in [DevState::Moving, DevState::Fault, DevState::Disable] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    #[test]
    fn should_serialize_state_summary_fields() {
        let summary = StateSummary {
            state: DevState::On,
            status: "Device is OK".to_string(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"state": "ON", "status": "Device is OK"})
        );
    }
}
