//! Simulated devices — the database server, a `TangoTest` device and motors.
//!
//! Every device is described by a table of attributes, commands and
//! properties built with [`DeviceBuilder`]. Mutable state (device state,
//! status text, attribute configuration and values, properties) sits behind
//! one mutex per device.

mod database;
mod motor;

pub use database::database;
pub use motor::motor;
pub use tg_test::tg_test;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tangorest_domain::attribute::{
    AttributeInfo, AttributeInfoUpdate, AttributeReading, DataFormat, DataType, DataValue, DispLevel, Quality, Writable,
};
use tangorest_domain::command::{CommandInfo, CommandResult};
use tangorest_domain::device::{DevState, DeviceInfo, StateSummary};
use tangorest_domain::entity::ChildKind;
use tangorest_domain::error::{DeviceError, ValidationError};
use tangorest_domain::path::{DevicePath, MemberName};
use tangorest_domain::property::PropertyValue;
use tangorest_domain::time::now;

/// Status text a device reports after switching to `state`.
fn status_for(state: DevState) -> String {
    format!("The device is in {state} state.")
}

struct Stored {
    value: DataValue,
    w_value: Option<DataValue>,
}

struct Runtime {
    state: DevState,
    status: String,
    attributes: Vec<(MemberName, AttributeInfo)>,
    values: BTreeMap<String, Stored>,
    properties: Vec<PropertyValue>,
}

/// One simulated device.
pub struct VirtualDevice {
    info: DeviceInfo,
    initial_state: DevState,
    initial_status: String,
    commands: Vec<(MemberName, CommandInfo)>,
    protected: Vec<String>,
    runtime: Mutex<Runtime>,
}

impl VirtualDevice {
    /// Start describing a device exported by `server`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `path` is not a valid device name.
    pub fn builder(
        path: &str,
        class_name: &str,
        server: &str,
    ) -> Result<DeviceBuilder, ValidationError> {
        Ok(DeviceBuilder {
            info: DeviceInfo {
                name: path.parse()?,
                class_name: class_name.to_string(),
                server: server.to_string(),
                hostname: "localhost".to_string(),
                exported: true,
                pid: 0,
                version: "5".to_string(),
            },
            state: DevState::On,
            status: None,
            attributes: Vec::new(),
            commands: Vec::new(),
            protected: Vec::new(),
            values: BTreeMap::new(),
            properties: Vec::new(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &DevicePath {
        &self.info.name
    }

    #[must_use]
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Whether the device server is running.
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.info.exported
    }

    /// Names of the members of one collection, in declaration order.
    #[must_use]
    pub fn member_names(&self, kind: ChildKind) -> Vec<MemberName> {
        match kind {
            ChildKind::Attributes => self
                .lock()
                .attributes
                .iter()
                .map(|(name, _)| name.clone())
                .collect(),
            ChildKind::Commands => self.commands.iter().map(|(name, _)| name.clone()).collect(),
            ChildKind::Properties => self
                .lock()
                .properties
                .iter()
                .filter_map(|property| MemberName::new(property.name.as_str()).ok())
                .collect(),
        }
    }

    #[must_use]
    pub fn state(&self) -> StateSummary {
        let runtime = self.lock();
        StateSummary {
            state: runtime.state,
            status: runtime.status.clone(),
        }
    }

    /// Current configuration of an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unknown`] if the device has no such attribute.
    pub fn attribute_info(&self, name: &MemberName) -> Result<AttributeInfo, DeviceError> {
        self.find_attribute(name)
    }

    /// Change the configuration of an attribute.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::Unknown`] if the device has no such attribute.
    /// - [`DeviceError::PermissionDenied`] if changes to it are refused.
    /// - [`DeviceError::Rejected`] if the new limits are inverted.
    pub fn configure_attribute(
        &self,
        name: &MemberName,
        update: AttributeInfoUpdate,
    ) -> Result<AttributeInfo, DeviceError> {
        let mut runtime = self.lock();
        let info = runtime
            .attributes
            .iter_mut()
            .find(|(candidate, _)| candidate.matches(name.as_str()))
            .map(|(_, info)| info)
            .ok_or_else(|| self.unknown("attribute", name.as_str()))?;
        if self.is_protected(&info.name) {
            return Err(self.denied(&info.name));
        }
        update.apply(info)?;
        tracing::debug!(device = %self.path(), attribute = %info.name, "attribute configured");
        Ok(info.clone())
    }

    /// Read an attribute. `State` and `Status` reflect the device state.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unknown`] if the device has no such attribute.
    pub fn read_attribute(&self, name: &MemberName) -> Result<AttributeReading, DeviceError> {
        let info = self.find_attribute(name)?;
        let runtime = self.lock();
        let (value, w_value) = if info.name == MemberName::STATE {
            (DataValue::from(runtime.state.as_str()), None)
        } else if info.name == MemberName::STATUS {
            (DataValue::from(runtime.status.as_str()), None)
        } else {
            let stored = runtime
                .values
                .get(&info.name)
                .ok_or_else(|| self.unknown("attribute", name.as_str()))?;
            (stored.value.clone(), stored.w_value.clone())
        };
        Ok(AttributeReading {
            name: info.name.clone(),
            value,
            quality: Quality::Valid,
            timestamp: now(),
            w_value,
        })
    }

    /// Write an attribute, coercing `value` to its data type.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::Unknown`] if the device has no such attribute.
    /// - [`DeviceError::PermissionDenied`] if writes to it are refused.
    /// - [`DeviceError::Rejected`] if it is read-only or `value` does not fit
    ///   its data type.
    pub fn write_attribute(
        &self,
        name: &MemberName,
        value: &DataValue,
    ) -> Result<AttributeReading, DeviceError> {
        let info = self.find_attribute(name)?;
        if self.is_protected(&info.name) {
            return Err(self.denied(&info.name));
        }
        if !info.writable.is_writable() {
            return Err(DeviceError::rejected(format!(
                "attribute {} is read-only",
                info.name
            )));
        }
        let coerced = info.data_type.coerce(value).ok_or_else(|| {
            DeviceError::rejected(format!(
                "attribute {} expects a {:?} value",
                info.name, info.data_type
            ))
        })?;

        self.lock().values.insert(
            info.name.clone(),
            Stored {
                value: coerced.clone(),
                w_value: Some(coerced),
            },
        );
        tracing::debug!(device = %self.path(), attribute = %info.name, "attribute written");
        self.read_attribute(name)
    }

    /// Description of a command.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unknown`] if the device has no such command.
    pub fn command_info(&self, name: &MemberName) -> Result<CommandInfo, DeviceError> {
        self.find_command(name).cloned()
    }

    /// Execute a command, checking `input` against its input type.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::Unknown`] if the device has no such command.
    /// - [`DeviceError::Rejected`] if `input` is missing, unexpected or of
    ///   the wrong type.
    pub fn execute_command(
        &self,
        name: &MemberName,
        input: Option<&DataValue>,
    ) -> Result<CommandResult, DeviceError> {
        let info = self.find_command(name)?;
        let argument = match (info.in_type, input) {
            (DataType::DevVoid, None) => None,
            (DataType::DevVoid, Some(_)) => {
                return Err(DeviceError::rejected(format!(
                    "command {} takes no input",
                    info.name
                )));
            }
            (in_type, Some(value)) => Some(in_type.coerce(value).ok_or_else(|| {
                DeviceError::rejected(format!("command {} expects a {in_type:?} input", info.name))
            })?),
            (in_type, None) => {
                return Err(DeviceError::rejected(format!(
                    "command {} expects a {in_type:?} input",
                    info.name
                )));
            }
        };

        let mut runtime = self.lock();
        let next = match info.name.as_str() {
            "On" => Some(DevState::On),
            "Off" => Some(DevState::Off),
            "Stop" => Some(DevState::Standby),
            "SwitchStates" => Some(if runtime.state == DevState::On {
                DevState::Off
            } else {
                DevState::On
            }),
            _ => None,
        };
        if let Some(state) = next {
            runtime.state = state;
            runtime.status = status_for(state);
        } else if info.name == "Init" {
            runtime.state = self.initial_state;
            runtime.status.clone_from(&self.initial_status);
        }

        let output = match info.name.as_str() {
            "State" => Some(DataValue::from(runtime.state.as_str())),
            "Status" => Some(DataValue::from(runtime.status.as_str())),
            "DbInfo" => Some(DataValue::from(format!(
                "TANGO Database {} (virtual)",
                self.path()
            ))),
            _ => argument,
        };
        drop(runtime);

        tracing::debug!(device = %self.path(), command = %info.name, "command executed");
        Ok(CommandResult {
            name: info.name.clone(),
            output,
        })
    }

    /// Values of a device property.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unknown`] if the property is not defined.
    pub fn read_property(&self, name: &MemberName) -> Result<PropertyValue, DeviceError> {
        self.lock()
            .properties
            .iter()
            .find(|property| name.matches(&property.name))
            .cloned()
            .ok_or_else(|| self.unknown("property", name.as_str()))
    }

    /// Define or replace a device property. An existing property keeps its
    /// canonical name.
    pub fn write_property(&self, name: &MemberName, values: Vec<String>) -> PropertyValue {
        let mut runtime = self.lock();
        let property = if let Some(existing) = runtime
            .properties
            .iter_mut()
            .find(|property| name.matches(&property.name))
        {
            existing.values = values;
            existing.clone()
        } else {
            let property = PropertyValue {
                name: name.to_string(),
                values,
            };
            runtime.properties.push(property.clone());
            property
        };
        tracing::debug!(device = %self.path(), property = %property.name, "property written");
        property
    }

    fn find_attribute(&self, name: &MemberName) -> Result<AttributeInfo, DeviceError> {
        self.lock()
            .attributes
            .iter()
            .find(|(candidate, _)| candidate.matches(name.as_str()))
            .map(|(_, info)| info.clone())
            .ok_or_else(|| self.unknown("attribute", name.as_str()))
    }

    fn is_protected(&self, attribute: &str) -> bool {
        self.protected.iter().any(|protected| protected == attribute)
    }

    fn denied(&self, attribute: &str) -> DeviceError {
        DeviceError::PermissionDenied {
            reason: format!("changing {attribute} on {} is not allowed", self.path()),
        }
    }

    fn find_command(&self, name: &MemberName) -> Result<&CommandInfo, DeviceError> {
        self.commands
            .iter()
            .find(|(candidate, _)| candidate.matches(name.as_str()))
            .map(|(_, info)| info)
            .ok_or_else(|| self.unknown("command", name.as_str()))
    }

    fn unknown(&self, what: &str, name: &str) -> DeviceError {
        DeviceError::unknown(format!("{what} {name} of device {}", self.path()))
    }

    fn lock(&self) -> MutexGuard<'_, Runtime> {
        self.runtime.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Table-driven description of a [`VirtualDevice`].
///
/// Every device gets the `State` and `Status` attributes and commands.
pub struct DeviceBuilder {
    info: DeviceInfo,
    state: DevState,
    status: Option<String>,
    attributes: Vec<(MemberName, AttributeInfo)>,
    commands: Vec<(MemberName, CommandInfo)>,
    protected: Vec<String>,
    values: BTreeMap<String, Stored>,
    properties: Vec<PropertyValue>,
}

impl DeviceBuilder {
    /// Initial state, restored by `Init`. Without a status, the standard
    /// status text for the state is used.
    #[must_use]
    pub fn state(mut self, state: DevState, status: Option<&str>) -> Self {
        self.state = state;
        self.status = status.map(str::to_string);
        self
    }

    /// Mark the device server as not running.
    #[must_use]
    pub fn not_exported(mut self) -> Self {
        self.info.exported = false;
        self
    }

    #[must_use]
    pub fn server_pid(mut self, pid: u32) -> Self {
        self.info.pid = pid;
        self
    }

    /// Declare an attribute holding `value`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `name` is not a valid member name.
    pub fn attribute(
        mut self,
        name: &str,
        data_type: DataType,
        writable: Writable,
        value: impl Into<DataValue>,
    ) -> Result<Self, ValidationError> {
        let value = value.into();
        let (data_format, max_dim_x) = match &value {
            DataValue::Array(items) => (
                DataFormat::Spectrum,
                u32::try_from(items.len()).unwrap_or(u32::MAX),
            ),
            _ => (DataFormat::Scalar, 1),
        };
        let member = MemberName::new(name)?;
        self.attributes.push((
            member,
            AttributeInfo {
                name: name.to_string(),
                data_type,
                data_format,
                writable,
                label: name.to_string(),
                description: String::new(),
                unit: String::new(),
                format: default_format(data_type).to_string(),
                min_value: None,
                max_value: None,
                max_dim_x,
                max_dim_y: 0,
                level: DispLevel::Operator,
            },
        ));
        let w_value = writable.is_writable().then(|| value.clone());
        self.values
            .insert(name.to_string(), Stored { value, w_value });
        Ok(self)
    }

    /// Refuse every write to an already declared attribute.
    #[must_use]
    pub fn protect(mut self, name: &str) -> Self {
        self.protected.push(name.to_string());
        self
    }

    /// Declare a command.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `name` is not a valid member name.
    pub fn command(
        mut self,
        name: &str,
        in_type: DataType,
        out_type: DataType,
    ) -> Result<Self, ValidationError> {
        self.commands.push((
            MemberName::new(name)?,
            CommandInfo {
                name: name.to_string(),
                in_type,
                out_type,
                in_type_desc: describe(in_type).to_string(),
                out_type_desc: describe(out_type).to_string(),
                level: DispLevel::Operator,
            },
        ));
        Ok(self)
    }

    #[must_use]
    pub fn property(mut self, name: &str, values: &[&str]) -> Self {
        self.properties.push(PropertyValue {
            name: name.to_string(),
            values: values.iter().map(ToString::to_string).collect(),
        });
        self
    }

    /// Finish the device, adding the standard `State`/`Status` members.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a standard member name is rejected.
    pub fn build(self) -> Result<VirtualDevice, ValidationError> {
        let status = self.status.unwrap_or_else(|| status_for(self.state));
        let mut attributes = vec![
            standard_attribute(MemberName::STATE, DataType::DevState)?,
            standard_attribute(MemberName::STATUS, DataType::DevString)?,
        ];
        attributes.extend(self.attributes);
        let mut commands = vec![
            standard_command(MemberName::STATE, DataType::DevState)?,
            standard_command(MemberName::STATUS, DataType::DevString)?,
        ];
        commands.extend(self.commands);

        Ok(VirtualDevice {
            info: self.info,
            initial_state: self.state,
            initial_status: status.clone(),
            commands,
            protected: self.protected,
            runtime: Mutex::new(Runtime {
                state: self.state,
                status,
                attributes,
                values: self.values,
                properties: self.properties,
            }),
        })
    }
}

fn standard_attribute(
    name: &str,
    data_type: DataType,
) -> Result<(MemberName, AttributeInfo), ValidationError> {
    Ok((
        MemberName::new(name)?,
        AttributeInfo {
            name: name.to_string(),
            data_type,
            data_format: DataFormat::Scalar,
            writable: Writable::Read,
            label: name.to_string(),
            description: String::new(),
            unit: String::new(),
            format: default_format(data_type).to_string(),
            min_value: None,
            max_value: None,
            max_dim_x: 1,
            max_dim_y: 0,
            level: DispLevel::Operator,
        },
    ))
}

fn standard_command(
    name: &str,
    out_type: DataType,
) -> Result<(MemberName, CommandInfo), ValidationError> {
    Ok((
        MemberName::new(name)?,
        CommandInfo {
            name: name.to_string(),
            in_type: DataType::DevVoid,
            out_type,
            in_type_desc: describe(DataType::DevVoid).to_string(),
            out_type_desc: format!("Device {}", name.to_ascii_lowercase()),
            level: DispLevel::Operator,
        },
    ))
}

fn default_format(data_type: DataType) -> &'static str {
    match data_type {
        DataType::DevShort | DataType::DevLong | DataType::DevVarShortArray => "%d",
        DataType::DevDouble | DataType::DevVarDoubleArray => "%6.2f",
        DataType::DevVoid
        | DataType::DevBoolean
        | DataType::DevString
        | DataType::DevState
        | DataType::DevVarStringArray => "%s",
    }
}

fn describe(data_type: DataType) -> &'static str {
    match data_type {
        DataType::DevVoid => "Uninitialised",
        _ => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str) -> MemberName {
        MemberName::new(name).unwrap()
    }

    fn sample() -> VirtualDevice {
        VirtualDevice::builder("test/sample/1", "Sample", "Sample/test")
            .unwrap()
            .attribute("Level", DataType::DevDouble, Writable::ReadWrite, 1.0)
            .unwrap()
            .attribute("Label", DataType::DevString, Writable::Read, "x")
            .unwrap()
            .attribute("Locked", DataType::DevLong, Writable::ReadWrite, 0_i64)
            .unwrap()
            .protect("Locked")
            .command("On", DataType::DevVoid, DataType::DevVoid)
            .unwrap()
            .command("Off", DataType::DevVoid, DataType::DevVoid)
            .unwrap()
            .command("Init", DataType::DevVoid, DataType::DevVoid)
            .unwrap()
            .command("DevDouble", DataType::DevDouble, DataType::DevDouble)
            .unwrap()
            .property("Speed", &["10"])
            .state(DevState::Standby, Some("Waiting"))
            .build()
            .unwrap()
    }

    #[test]
    fn should_prepend_standard_members_when_built() {
        let device = sample();
        let attributes: Vec<String> = device
            .member_names(ChildKind::Attributes)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(attributes, ["State", "Status", "Level", "Label", "Locked"]);
        let commands = device.member_names(ChildKind::Commands);
        assert_eq!(commands[0].as_str(), "State");
        assert_eq!(commands[1].as_str(), "Status");
    }

    #[test]
    fn should_report_canonical_name_when_lookup_case_differs() {
        let reading = sample().read_attribute(&member("LEVEL")).unwrap();
        assert_eq!(reading.name, "Level");
        assert_eq!(reading.value, DataValue::Float(1.0));
        assert_eq!(reading.w_value, Some(DataValue::Float(1.0)));
    }

    #[test]
    fn should_read_state_and_status_as_attributes() {
        let device = sample();
        assert_eq!(
            device.read_attribute(&member("state")).unwrap().value,
            DataValue::from("STANDBY")
        );
        assert_eq!(
            device.read_attribute(&member("Status")).unwrap().value,
            DataValue::from("Waiting")
        );
    }

    #[test]
    fn should_coerce_value_when_writing() {
        let device = sample();
        let reading = device
            .write_attribute(&member("level"), &DataValue::Int(3))
            .unwrap();
        assert_eq!(reading.value, DataValue::Float(3.0));
    }

    #[test]
    fn should_reject_write_when_type_mismatches() {
        let err = sample()
            .write_attribute(&member("Level"), &DataValue::from("high"))
            .unwrap_err();
        assert!(matches!(err, DeviceError::Rejected { .. }));
    }

    #[test]
    fn should_reject_write_when_attribute_is_read_only() {
        let device = sample();
        for name in ["Label", "State", "Status"] {
            let err = device
                .write_attribute(&member(name), &DataValue::from("y"))
                .unwrap_err();
            assert!(matches!(err, DeviceError::Rejected { .. }), "{name}");
        }
    }

    #[test]
    fn should_deny_write_when_attribute_is_protected() {
        let err = sample()
            .write_attribute(&member("Locked"), &DataValue::Int(1))
            .unwrap_err();
        assert!(matches!(err, DeviceError::PermissionDenied { .. }));
    }

    #[test]
    fn should_keep_new_configuration_when_attribute_is_configured() {
        let device = sample();
        let update = AttributeInfoUpdate {
            unit: Some("mm".to_string()),
            max_value: Some(5.0),
            ..AttributeInfoUpdate::default()
        };
        let info = device.configure_attribute(&member("LEVEL"), update).unwrap();
        assert_eq!(info.name, "Level");
        assert_eq!(info.unit, "mm");
        assert_eq!(device.attribute_info(&member("level")).unwrap().max_value, Some(5.0));
    }

    #[test]
    fn should_refuse_configuration_of_protected_or_unknown_attribute() {
        let device = sample();
        assert!(matches!(
            device.configure_attribute(&member("Locked"), AttributeInfoUpdate::default()),
            Err(DeviceError::PermissionDenied { .. })
        ));
        assert!(matches!(
            device.configure_attribute(&member("Nope"), AttributeInfoUpdate::default()),
            Err(DeviceError::Unknown { .. })
        ));
    }

    #[test]
    fn should_reject_inverted_limits_when_configuring() {
        let device = sample();
        let update = AttributeInfoUpdate {
            min_value: Some(2.0),
            max_value: Some(1.0),
            ..AttributeInfoUpdate::default()
        };
        assert!(matches!(
            device.configure_attribute(&member("Level"), update),
            Err(DeviceError::Rejected { .. })
        ));
    }

    #[test]
    fn should_change_state_when_commands_run() {
        let device = sample();
        device.execute_command(&member("on"), None).unwrap();
        assert_eq!(device.state().state, DevState::On);
        assert_eq!(device.state().status, "The device is in ON state.");

        device.execute_command(&member("Off"), None).unwrap();
        assert_eq!(device.state().state, DevState::Off);

        device.execute_command(&member("Init"), None).unwrap();
        assert_eq!(
            device.state(),
            StateSummary {
                state: DevState::Standby,
                status: "Waiting".to_string()
            }
        );
    }

    #[test]
    fn should_check_command_input_type() {
        let device = sample();
        let result = device
            .execute_command(&member("DevDouble"), Some(&DataValue::Int(2)))
            .unwrap();
        assert_eq!(result.output, Some(DataValue::Float(2.0)));

        let missing = device.execute_command(&member("DevDouble"), None);
        assert!(matches!(missing, Err(DeviceError::Rejected { .. })));

        let unexpected = device.execute_command(&member("On"), Some(&DataValue::Int(1)));
        assert!(matches!(unexpected, Err(DeviceError::Rejected { .. })));
    }

    #[test]
    fn should_return_state_from_state_command() {
        let result = sample().execute_command(&member("State"), None).unwrap();
        assert_eq!(result.output, Some(DataValue::from("STANDBY")));
    }

    #[test]
    fn should_keep_canonical_name_when_property_is_replaced() {
        let device = sample();
        let property = device.write_property(&member("SPEED"), vec!["20".to_string()]);
        assert_eq!(property.name, "Speed");
        assert_eq!(device.read_property(&member("speed")).unwrap().values, ["20"]);
    }

    #[test]
    fn should_define_new_property_when_written() {
        let device = sample();
        device.write_property(&member("Offset"), vec!["1".to_string()]);
        let names: Vec<String> = device
            .member_names(ChildKind::Properties)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, ["Speed", "Offset"]);
    }

    #[test]
    fn should_return_unknown_when_member_is_missing() {
        let device = sample();
        assert!(matches!(
            device.read_attribute(&member("Nope")),
            Err(DeviceError::Unknown { .. })
        ));
        assert!(matches!(
            device.command_info(&member("Nope")),
            Err(DeviceError::Unknown { .. })
        ));
        assert!(matches!(
            device.read_property(&member("Nope")),
            Err(DeviceError::Unknown { .. })
        ));
    }
}
