//! The database server device every control system exposes.

use tangorest_domain::attribute::{DataType, DataValue, Writable};
use tangorest_domain::device::DevState;
use tangorest_domain::error::ValidationError;

use super::VirtualDevice;

/// `sys/database/2` — always ON.
///
/// # Errors
///
/// Returns a validation error if a built-in name is rejected.
pub fn database() -> Result<VirtualDevice, ValidationError> {
    VirtualDevice::builder("sys/database/2", "DataBase", "DataBaseds/2")?
        .server_pid(1042)
        .state(DevState::On, Some("Device is OK"))
        .attribute(
            "Timing_info",
            DataType::DevVarStringArray,
            Writable::Read,
            DataValue::Array(vec![
                DataValue::from("Method name|calls|avg (ms)"),
                DataValue::from("DbGetDeviceList|0|0.0"),
            ]),
        )?
        .command("DbInfo", DataType::DevVoid, DataType::DevString)?
        .command("Init", DataType::DevVoid, DataType::DevVoid)?
        .build()
}
