//! I2C device access.

use bytes::Bytes;
use pigwire_frame::{command, Extent};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::Session;

/// Daemon handle for an open I2C device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct I2cHandle(pub u32);

impl Session {
    /// Open device `address` on `bus`. `flags` is reserved and should be 0.
    pub fn i2c_open(&self, bus: u32, address: u32, flags: u32) -> Result<I2cHandle> {
        let handle = self.execute_checked(
            command::I2CO,
            bus,
            address,
            &[Extent::from_u32(flags)],
        )?;
        Ok(I2cHandle(handle))
    }

    /// Release a handle returned by [`i2c_open`](Self::i2c_open).
    pub fn i2c_close(&self, handle: I2cHandle) -> Result<()> {
        self.execute_checked(command::I2CC, handle.0, 0, &[])?;
        Ok(())
    }

    /// Write `data` to the device in a single transfer.
    pub fn i2c_write_device(&self, handle: I2cHandle, data: &[u8]) -> Result<()> {
        let payload = Extent::new(Bytes::copy_from_slice(data));
        self.execute_checked(command::I2CWD, handle.0, 0, &[payload])?;
        Ok(())
    }

    /// Read up to `count` bytes from the device.
    ///
    /// The daemon answers with the byte count in the header followed by the
    /// bytes themselves, so the command lock stays held until both are read.
    pub fn i2c_read_device(&self, handle: I2cHandle, count: u32) -> Result<Bytes> {
        let mut held = self.execute_held_checked(command::I2CRD, handle.0, count, &[])?;
        let len = held.value() as usize;
        held.read_payload(len)
    }
}
