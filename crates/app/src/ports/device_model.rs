//! Device model port — access to the control system behind the API.
//!
//! The dispatcher only ever talks to the control system through this trait.
//! Implementations own their connection handling (pooling, retries, write
//! serialisation, timeouts); the core treats every call as a plain
//! request/response.

use std::future::Future;

use tangorest_domain::attribute::{
    AttributeInfo, AttributeInfoUpdate, AttributeReading, DataValue,
};
use tangorest_domain::command::{CommandInfo, CommandResult};
use tangorest_domain::device::{DeviceInfo, StateSummary};
use tangorest_domain::entity::{ChildKind, EntityRef};
use tangorest_domain::error::DeviceError;
use tangorest_domain::path::{DevicePath, MemberName};
use tangorest_domain::property::PropertyValue;

/// Read/write/execute access to devices of the control system.
///
/// Name lookups are case-insensitive; results carry the canonical spelling
/// the control system uses.
pub trait DeviceModel {
    /// List devices whose `domain/family/member` name matches a `*` wildcard.
    fn list_devices(
        &self,
        pattern: &str,
    ) -> impl Future<Output = Result<Vec<DevicePath>, DeviceError>> + Send;

    /// List the attributes, commands or properties of a device whose name
    /// matches a `*` wildcard.
    fn list_children(
        &self,
        device: &DevicePath,
        kind: ChildKind,
        pattern: &str,
    ) -> impl Future<Output = Result<Vec<EntityRef>, DeviceError>> + Send;

    /// Static information about a device.
    fn device_info(
        &self,
        device: &DevicePath,
    ) -> impl Future<Output = Result<DeviceInfo, DeviceError>> + Send;

    /// Read the `State` and `Status` attributes together.
    fn read_state(
        &self,
        device: &DevicePath,
    ) -> impl Future<Output = Result<StateSummary, DeviceError>> + Send;

    fn read_attribute(
        &self,
        device: &DevicePath,
        attribute: &MemberName,
    ) -> impl Future<Output = Result<AttributeReading, DeviceError>> + Send;

    fn attribute_info(
        &self,
        device: &DevicePath,
        attribute: &MemberName,
    ) -> impl Future<Output = Result<AttributeInfo, DeviceError>> + Send;

    /// Change the configuration of an attribute and return the new one.
    fn write_attribute_info(
        &self,
        device: &DevicePath,
        attribute: &MemberName,
        update: AttributeInfoUpdate,
    ) -> impl Future<Output = Result<AttributeInfo, DeviceError>> + Send;

    /// Write an attribute and return the reading taken right after the write.
    fn write_attribute(
        &self,
        device: &DevicePath,
        attribute: &MemberName,
        value: DataValue,
    ) -> impl Future<Output = Result<AttributeReading, DeviceError>> + Send;

    fn command_info(
        &self,
        device: &DevicePath,
        command: &MemberName,
    ) -> impl Future<Output = Result<CommandInfo, DeviceError>> + Send;

    /// Execute a command; `input` is `None` for commands taking no argument.
    fn execute_command(
        &self,
        device: &DevicePath,
        command: &MemberName,
        input: Option<DataValue>,
    ) -> impl Future<Output = Result<CommandResult, DeviceError>> + Send;

    fn read_property(
        &self,
        device: &DevicePath,
        property: &MemberName,
    ) -> impl Future<Output = Result<PropertyValue, DeviceError>> + Send;

    /// Replace the values of a property, creating it if needed.
    fn write_property(
        &self,
        device: &DevicePath,
        property: &MemberName,
        values: Vec<String>,
    ) -> impl Future<Output = Result<PropertyValue, DeviceError>> + Send;
}
