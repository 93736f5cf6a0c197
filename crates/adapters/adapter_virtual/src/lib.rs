//! # tangorest-adapter-virtual
//!
//! Virtual control system that provides simulated devices for testing and
//! demonstration purposes.
//!
//! ## Provided devices
//!
//! | Device | Class | Behaviour |
//! |--------|-------|-----------|
//! | `sys/database/2` | `DataBase` | Always ON, status "Device is OK" |
//! | `sys/tg_test/1` | `TangoTest` | Scalars of every common type, a read-only spectrum, a write-protected attribute, echo commands |
//! | `test/motor/1` | `Motor` | `Position`/`Velocity`, responds to `On` / `Off` / `Stop` |
//! | `test/offline/1` | `Motor` | Registered but not running: every call is unreachable |
//!
//! ## Dependency rule
//!
//! Depends on `tangorest-app` (port traits) and `tangorest-domain` only.

mod devices;
mod wildcard;

use std::collections::BTreeMap;

use tangorest_app::ports::DeviceModel;
use tangorest_domain::attribute::{
    AttributeInfo, AttributeInfoUpdate, AttributeReading, DataValue,
};
use tangorest_domain::command::{CommandInfo, CommandResult};
use tangorest_domain::device::{DeviceInfo, StateSummary};
use tangorest_domain::entity::{ChildKind, EntityRef};
use tangorest_domain::error::{DeviceError, ValidationError};
use tangorest_domain::path::{DevicePath, MemberName};
use tangorest_domain::property::PropertyValue;

use devices::VirtualDevice;

/// In-memory control system holding the simulated devices.
pub struct VirtualControlSystem {
    devices: BTreeMap<DevicePath, VirtualDevice>,
}

impl VirtualControlSystem {
    /// Create the control system with its built-in devices.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a built-in device or member name is
    /// rejected.
    pub fn new() -> Result<Self, ValidationError> {
        let devices = [
            devices::database()?,
            devices::tg_test()?,
            devices::motor("test/motor/1", true)?,
            devices::motor("test/offline/1", false)?,
        ];
        Ok(Self {
            devices: devices
                .into_iter()
                .map(|device| (device.path().clone(), device))
                .collect(),
        })
    }

    /// Number of registered devices, exported or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// A registered device, whether or not its server runs.
    fn registered(&self, path: &DevicePath) -> Result<&VirtualDevice, DeviceError> {
        self.devices
            .get(path)
            .ok_or_else(|| DeviceError::unknown(format!("device {path}")))
    }

    /// A device that can be talked to.
    fn reachable(&self, path: &DevicePath) -> Result<&VirtualDevice, DeviceError> {
        let device = self.registered(path)?;
        if device.is_exported() {
            Ok(device)
        } else {
            Err(DeviceError::Unreachable {
                device: path.to_string(),
            })
        }
    }
}

impl DeviceModel for VirtualControlSystem {
    async fn list_devices(&self, pattern: &str) -> Result<Vec<DevicePath>, DeviceError> {
        Ok(self
            .devices
            .keys()
            .filter(|path| wildcard::matches(pattern, &path.to_string()))
            .cloned()
            .collect())
    }

    async fn list_children(
        &self,
        device: &DevicePath,
        kind: ChildKind,
        pattern: &str,
    ) -> Result<Vec<EntityRef>, DeviceError> {
        let found = self.reachable(device)?;
        Ok(found
            .member_names(kind)
            .into_iter()
            .filter(|name| wildcard::matches(pattern, name.as_str()))
            .map(|name| EntityRef::child(device.clone(), kind, name))
            .collect())
    }

    async fn device_info(&self, device: &DevicePath) -> Result<DeviceInfo, DeviceError> {
        Ok(self.registered(device)?.info().clone())
    }

    async fn read_state(&self, device: &DevicePath) -> Result<StateSummary, DeviceError> {
        Ok(self.reachable(device)?.state())
    }

    async fn read_attribute(
        &self,
        device: &DevicePath,
        attribute: &MemberName,
    ) -> Result<AttributeReading, DeviceError> {
        self.reachable(device)?.read_attribute(attribute)
    }

    async fn attribute_info(
        &self,
        device: &DevicePath,
        attribute: &MemberName,
    ) -> Result<AttributeInfo, DeviceError> {
        self.reachable(device)?.attribute_info(attribute)
    }

    async fn write_attribute_info(
        &self,
        device: &DevicePath,
        attribute: &MemberName,
        update: AttributeInfoUpdate,
    ) -> Result<AttributeInfo, DeviceError> {
        self.reachable(device)?
            .configure_attribute(attribute, update)
    }

    async fn write_attribute(
        &self,
        device: &DevicePath,
        attribute: &MemberName,
        value: DataValue,
    ) -> Result<AttributeReading, DeviceError> {
        self.reachable(device)?.write_attribute(attribute, &value)
    }

    async fn command_info(
        &self,
        device: &DevicePath,
        command: &MemberName,
    ) -> Result<CommandInfo, DeviceError> {
        self.reachable(device)?.command_info(command)
    }

    async fn execute_command(
        &self,
        device: &DevicePath,
        command: &MemberName,
        input: Option<DataValue>,
    ) -> Result<CommandResult, DeviceError> {
        self.reachable(device)?
            .execute_command(command, input.as_ref())
    }

    async fn read_property(
        &self,
        device: &DevicePath,
        property: &MemberName,
    ) -> Result<PropertyValue, DeviceError> {
        self.registered(device)?.read_property(property)
    }

    async fn write_property(
        &self,
        device: &DevicePath,
        property: &MemberName,
        values: Vec<String>,
    ) -> Result<PropertyValue, DeviceError> {
        Ok(self.registered(device)?.write_property(property, values))
    }
}
