//! Attributes — readings, configuration and the data types behind them.

pub mod value;

use serde::{Deserialize, Serialize};

pub use value::DataValue;

use crate::error::DeviceError;
use crate::time::Timestamp;

/// Data type of an attribute or of a command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::enum_variant_names)]
pub enum DataType {
    DevVoid,
    DevBoolean,
    DevShort,
    DevLong,
    DevDouble,
    DevString,
    DevState,
    DevVarShortArray,
    DevVarDoubleArray,
    DevVarStringArray,
}

impl DataType {
    /// Convert `value` into this type, or `None` when it does not fit.
    ///
    /// Integers widen to doubles; nothing narrows except integers that fit a
    /// short.
    #[must_use]
    pub fn coerce(self, value: &DataValue) -> Option<DataValue> {
        match (self, value) {
            (Self::DevBoolean, DataValue::Bool(_))
            | (Self::DevLong, DataValue::Int(_))
            | (Self::DevString, DataValue::String(_)) => Some(value.clone()),
            (Self::DevShort, DataValue::Int(v)) => {
                i16::try_from(*v).ok().map(|_| DataValue::Int(*v))
            }
            (Self::DevDouble, v) => v.as_f64().map(DataValue::Float),
            (Self::DevVarShortArray, DataValue::Array(items)) => {
                Self::coerce_all(Self::DevShort, items)
            }
            (Self::DevVarDoubleArray, DataValue::Array(items)) => {
                Self::coerce_all(Self::DevDouble, items)
            }
            (Self::DevVarStringArray, DataValue::Array(items)) => {
                Self::coerce_all(Self::DevString, items)
            }
            _ => None,
        }
    }

    fn coerce_all(item_type: Self, items: &[DataValue]) -> Option<DataValue> {
        items
            .iter()
            .map(|item| item_type.coerce(item))
            .collect::<Option<Vec<_>>>()
            .map(DataValue::Array)
    }
}

/// Dimensionality of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataFormat {
    Scalar,
    Spectrum,
    Image,
}

/// Whether and how an attribute can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Writable {
    Read,
    Write,
    ReadWrite,
    ReadWithWrite,
}

impl Writable {
    #[must_use]
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// Audience an attribute or command is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DispLevel {
    #[default]
    Operator,
    Expert,
}

/// Quality flag attached to every reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "ATTR_VALID")]
    Valid,
    #[serde(rename = "ATTR_INVALID")]
    Invalid,
    #[serde(rename = "ATTR_ALARM")]
    Alarm,
    #[serde(rename = "ATTR_CHANGING")]
    Changing,
    #[serde(rename = "ATTR_WARNING")]
    Warning,
}

/// One reading of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeReading {
    /// Canonical attribute name as reported by the device.
    pub name: String,
    pub value: DataValue,
    pub quality: Quality,
    pub timestamp: Timestamp,
    /// Last written set point, for writable attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w_value: Option<DataValue>,
}

/// Configuration of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    pub data_type: DataType,
    pub data_format: DataFormat,
    pub writable: Writable,
    pub label: String,
    pub description: String,
    pub unit: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    pub max_dim_x: u32,
    pub max_dim_y: u32,
    pub level: DispLevel,
}

/// Changes to the editable part of an attribute's configuration.
///
/// Absent fields keep their current value. Type, format, dimensions and
/// write access are fixed by the device and cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeInfoUpdate {
    pub label: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub format: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub level: Option<DispLevel>,
}

impl AttributeInfoUpdate {
    /// Apply the changes to `info`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Rejected`], leaving `info` untouched, when the
    /// resulting limits are inverted.
    pub fn apply(self, info: &mut AttributeInfo) -> Result<(), DeviceError> {
        let min_value = self.min_value.or(info.min_value);
        let max_value = self.max_value.or(info.max_value);
        if let Some((min, max)) = min_value.zip(max_value).filter(|(min, max)| min > max) {
            return Err(DeviceError::rejected(format!(
                "min_value {min} is above max_value {max} for {}",
                info.name
            )));
        }

        if let Some(label) = self.label {
            info.label = label;
        }
        if let Some(description) = self.description {
            info.description = description;
        }
        if let Some(unit) = self.unit {
            info.unit = unit;
        }
        if let Some(format) = self.format {
            info.format = format;
        }
        if let Some(level) = self.level {
            info.level = level;
        }
        info.min_value = min_value;
        info.max_value = max_value;
        Ok(())
    }
}
