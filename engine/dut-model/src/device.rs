//! The device capability interface

use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

/// Direction of a device port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    In,
    Out,
}

/// Static description of one port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub name: &'static str,
    pub direction: PortDirection,
    /// Width in bits, 1..=64
    pub width: u8,
}

impl PortSpec {
    pub const fn input(name: &'static str, width: u8) -> Self {
        Self { name, direction: PortDirection::In, width }
    }

    pub const fn output(name: &'static str, width: u8) -> Self {
        Self { name, direction: PortDirection::Out, width }
    }

    /// Mask covering every bit of the port
    #[inline]
    pub fn mask(&self) -> u64 {
        if self.width >= 64 { u64::MAX } else { (1u64 << self.width) - 1 }
    }

    /// Check that `value` may be driven onto this port
    pub fn check_drive(&self, value: u64) -> Result<(), DeviceError> {
        if self.direction != PortDirection::In {
            return Err(DeviceError::NotAnInput { port: self.name.to_string() });
        }
        if value & !self.mask() != 0 {
            return Err(DeviceError::ValueTooWide {
                port: self.name.to_string(),
                width: self.width,
                value,
            });
        }
        Ok(())
    }
}

/// Look up a port by name in a device's port table
pub fn find_port(
    device: &'static str,
    ports: &'static [PortSpec],
    name: &str,
) -> Result<&'static PortSpec, DeviceError> {
    ports
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| DeviceError::UnknownPort { device, port: name.to_string() })
}

/// An evaluable, edge-triggered digital design.
///
/// Inputs take effect only when [`Device::evaluate`] runs; outputs are registered and
/// change only on evaluation. Implementations are single-threaded and hold no
/// internal concurrency.
pub trait Device {
    /// Model name, used in logs and waveform headers
    fn name(&self) -> &'static str;

    /// Every port the design declares
    fn ports(&self) -> &'static [PortSpec];

    /// Drive an input port. The value is sampled at the next evaluation.
    fn set_input(&mut self, port: &str, value: u64) -> Result<(), DeviceError>;

    /// Read an output port as of the last evaluation
    fn get_output(&self, port: &str) -> Result<u64, DeviceError>;

    /// Read any port, input or output. Intended for waveform capture only.
    fn probe(&self, port: &str) -> Result<u64, DeviceError>;

    /// Re-evaluate the design after an input change
    fn evaluate(&mut self) -> Result<(), DeviceError>;
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn ports(&self) -> &'static [PortSpec] {
        (**self).ports()
    }

    fn set_input(&mut self, port: &str, value: u64) -> Result<(), DeviceError> {
        (**self).set_input(port, value)
    }

    fn get_output(&self, port: &str) -> Result<u64, DeviceError> {
        (**self).get_output(port)
    }

    fn probe(&self, port: &str) -> Result<u64, DeviceError> {
        (**self).probe(port)
    }

    fn evaluate(&mut self) -> Result<(), DeviceError> {
        (**self).evaluate()
    }
}
