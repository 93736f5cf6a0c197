//! Simulated motor axes.

use tangorest_domain::attribute::{DataType, Writable};
use tangorest_domain::device::DevState;
use tangorest_domain::error::ValidationError;

use super::VirtualDevice;

/// A motor standing still in `STANDBY`.
///
/// An offline motor is registered with the database but its server is not
/// running.
///
/// # Errors
///
/// Returns a validation error if `path` is not a valid device name.
pub fn motor(path: &str, online: bool) -> Result<VirtualDevice, ValidationError> {
    let mut builder = VirtualDevice::builder(path, "Motor", "Motor/test")?;
    if !online {
        builder = builder.not_exported();
    }
    builder
        .state(DevState::Standby, None)
        .attribute("Position", DataType::DevDouble, Writable::ReadWrite, 0.0)?
        .attribute("Velocity", DataType::DevDouble, Writable::ReadWrite, 1.0)?
        .command("On", DataType::DevVoid, DataType::DevVoid)?
        .command("Off", DataType::DevVoid, DataType::DevVoid)?
        .command("Stop", DataType::DevVoid, DataType::DevVoid)?
        .property("Acceleration", &["2.5"])
        .build()
}
