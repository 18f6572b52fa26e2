//! # Bus Transport Module
//!
//! All peripherals on the board sit on the same two-wire register bus. The drivers in this crate
//! never talk to the bus hardware directly, instead they are generic over [`BusTransport`], which
//! provides the handful of byte-level transfers they need.
//!
//! Several drivers sharing one physical bus must go through a [`SharedBus`], which serialises
//! every transfer behind a single lock. Drivers run their multi-step sequences (a frequency
//! change, a framebuffer flush) under [`BusTransport::transaction`], which a [`SharedBus`] holds
//! its lock for, so no other driver's traffic lands in the middle of them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod mock;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::blocking::i2c::{Write, WriteRead};
use log::trace;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Byte-level register access to devices on a two-wire bus.
pub trait BusTransport {
    /// Read `len` bytes from the device at `addr`, starting at register `reg`.
    fn read_bytes(&mut self, addr: u8, reg: u8, len: usize) -> Result<Vec<u8>, BusError>;

    /// Write a single byte to register `reg` of the device at `addr`.
    fn write_byte(&mut self, addr: u8, reg: u8, byte: u8) -> Result<(), BusError>;

    /// Write a single byte to the device at `addr` with no register prefix.
    fn write_raw(&mut self, addr: u8, byte: u8) -> Result<(), BusError>;

    /// Write a block of bytes to register `reg` of the device at `addr`.
    ///
    /// The default implementation issues one [`BusTransport::write_byte`] per byte, transports
    /// which support block writes should override it.
    fn write_block(&mut self, addr: u8, reg: u8, data: &[u8]) -> Result<(), BusError> {
        for byte in data {
            self.write_byte(addr, reg, *byte)?;
        }

        Ok(())
    }

    /// Run a multi-step sequence with exclusive use of the transport.
    ///
    /// Shared transports hold their lock for the whole of `f`. A transport with a single owner
    /// just runs `f`. `f` must not try to reach the same bus through another handle, it would
    /// block forever.
    fn transaction<R, F>(&mut self, f: F) -> Result<R, BusError>
    where
        Self: Sized,
        F: FnOnce(&mut dyn BusTransport) -> Result<R, BusError>
    {
        f(self)
    }
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A transport shared between several drivers (and threads).
///
/// Every transfer locks the underlying bus, so transfers from different drivers never interleave
/// at the byte level.
pub struct SharedBus<B> {
    inner: Arc<Mutex<B>>,
}

/// [`BusTransport`] implementation for any `embedded-hal` blocking I2C device.
pub struct HalBus<I2C> {
    i2c: I2C,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BusError {
    #[error("I2C transfer with device 0x{addr:02x} failed: {msg}")]
    Transfer { addr: u8, msg: String },

    #[error("Expected {expected} bytes from device 0x{addr:02x} but got {got}")]
    ShortRead { addr: u8, expected: usize, got: usize },

    #[error("The shared bus lock was poisoned by a panicking thread")]
    Poisoned,

    #[error("Cannot open I2C bus {bus}: {msg}")]
    Open { bus: u8, msg: String },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<B> SharedBus<B>
where
    B: BusTransport
{
    /// Wrap a transport so it can be shared.
    pub fn new(bus: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus))
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, B>, BusError> {
        self.inner.lock().map_err(|_| BusError::Poisoned)
    }
}

impl<B> Clone for SharedBus<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone()
        }
    }
}

impl<B> BusTransport for SharedBus<B>
where
    B: BusTransport
{
    fn read_bytes(&mut self, addr: u8, reg: u8, len: usize) -> Result<Vec<u8>, BusError> {
        self.lock()?.read_bytes(addr, reg, len)
    }

    fn write_byte(&mut self, addr: u8, reg: u8, byte: u8) -> Result<(), BusError> {
        self.lock()?.write_byte(addr, reg, byte)
    }

    fn write_raw(&mut self, addr: u8, byte: u8) -> Result<(), BusError> {
        self.lock()?.write_raw(addr, byte)
    }

    fn write_block(&mut self, addr: u8, reg: u8, data: &[u8]) -> Result<(), BusError> {
        self.lock()?.write_block(addr, reg, data)
    }

    fn transaction<R, F>(&mut self, f: F) -> Result<R, BusError>
    where
        Self: Sized,
        F: FnOnce(&mut dyn BusTransport) -> Result<R, BusError>
    {
        let mut bus = self.lock()?;

        f(&mut *bus)
    }
}

impl<I2C> HalBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Release the underlying I2C device.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> BusTransport for HalBus<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: Debug
{
    fn read_bytes(&mut self, addr: u8, reg: u8, len: usize) -> Result<Vec<u8>, BusError> {
        let mut buf = vec![0u8; len];

        self.i2c
            .write_read(addr, &[reg], &mut buf)
            .map_err(|e| transfer_error(addr, e))?;

        trace!("read 0x{:02x}[0x{:02x}] -> {:02x?}", addr, reg, buf);

        Ok(buf)
    }

    fn write_byte(&mut self, addr: u8, reg: u8, byte: u8) -> Result<(), BusError> {
        trace!("write 0x{:02x}[0x{:02x}] <- 0x{:02x}", addr, reg, byte);

        self.i2c
            .write(addr, &[reg, byte])
            .map_err(|e| transfer_error(addr, e))
    }

    fn write_raw(&mut self, addr: u8, byte: u8) -> Result<(), BusError> {
        trace!("write 0x{:02x} <- 0x{:02x}", addr, byte);

        self.i2c
            .write(addr, &[byte])
            .map_err(|e| transfer_error(addr, e))
    }

    fn write_block(&mut self, addr: u8, reg: u8, data: &[u8]) -> Result<(), BusError> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(reg);
        frame.extend_from_slice(data);

        trace!("write 0x{:02x}[0x{:02x}] <- {} bytes", addr, reg, data.len());

        self.i2c
            .write(addr, &frame)
            .map_err(|e| transfer_error(addr, e))
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Open one of the Raspberry Pi's hardware I2C buses.
#[cfg(target_arch = "arm")]
pub fn open_rpi_bus(bus: u8) -> Result<HalBus<rppal::i2c::I2c>, BusError> {
    let i2c = rppal::i2c::I2c::with_bus(bus)
        .map_err(|e| BusError::Open { bus, msg: e.to_string() })?;

    Ok(HalBus::new(i2c))
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn transfer_error<E: Debug>(addr: u8, e: E) -> BusError {
    BusError::Transfer {
        addr,
        msg: format!("{:?}", e)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
