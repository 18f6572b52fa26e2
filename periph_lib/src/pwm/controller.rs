//! [`PwmController`] implementation for the PCA9685

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use log::{debug, info, trace};

use crate::bus::{BusError, BusTransport};
use super::{
    regs, ChannelValue, Params, PwmError, PwmMode, CYCLE_TICKS, NUM_CHANNELS, OSC_FREQ_HZ
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Time for the oscillator to start after leaving sleep.
const OSC_SETTLE: Duration = Duration::from_millis(5);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Driver for the PCA9685 PWM generator.
pub struct PwmController<B> {
    bus: B,

    address: u8,

    /// Mode of every channel which has been initialised.
    channels: HashMap<u8, PwmMode>,

    /// Prescale currently programmed into the chip.
    prescale: u8,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<B> PwmController<B>
where
    B: BusTransport
{
    /// Bring up the PWM chip and register the channels listed in the parameters.
    ///
    /// The chip is woken from sleep and programmed to `params.frequency_hz`.
    pub fn new(bus: B, params: &Params) -> Result<Self, PwmError> {
        params.are_valid()?;

        // Validate the frequency before touching the chip
        prescale_for(params.frequency_hz)?;

        let mut ctrl = Self {
            bus,
            address: params.address,
            channels: HashMap::new(),
            prescale: 0,
        };

        let address = ctrl.address;
        ctrl.bus.transaction(|bus| {
            write_reg(bus, address, regs::MODE2, regs::OUTDRV)?;
            write_reg(bus, address, regs::MODE1, regs::ALLCALL)?;
            thread::sleep(OSC_SETTLE);

            let mode1 = read_reg(bus, address, regs::MODE1)?;
            write_reg(bus, address, regs::MODE1, mode1 & !regs::SLEEP)?;
            thread::sleep(OSC_SETTLE);

            Ok(())
        })?;

        ctrl.set_frequency(params.frequency_hz)?;

        for cfg in params.channels.iter() {
            ctrl.init_channel(cfg.channel as i32, cfg.mode)?;
        }

        info!(
            "PWM chip at 0x{:02x} initialised at {} Hz with {} channels",
            ctrl.address, params.frequency_hz, ctrl.channels.len()
        );

        Ok(ctrl)
    }

    /// Program the PWM frequency, returning the prescale written to the chip.
    ///
    /// The prescale register can only be written while the oscillator is stopped, so the chip is
    /// put to sleep, the prescale written, and the previous mode restored.
    pub fn set_frequency(&mut self, freq_hz: f64) -> Result<u8, PwmError> {
        let prescale = prescale_for(freq_hz)?;

        let address = self.address;
        self.bus.transaction(|bus| {
            let old_mode = read_reg(bus, address, regs::MODE1)?;
            let sleep_mode = (old_mode & !regs::RESTART) | regs::SLEEP;

            write_reg(bus, address, regs::MODE1, sleep_mode)?;
            write_reg(bus, address, regs::PRESCALE, prescale)?;
            write_reg(bus, address, regs::MODE1, old_mode)?;
            thread::sleep(OSC_SETTLE);
            write_reg(bus, address, regs::MODE1, old_mode | regs::SUB1)
        })?;

        self.prescale = prescale;

        debug!("PWM frequency set to {} Hz (prescale {})", freq_hz, prescale);

        Ok(prescale)
    }

    /// Register the mode of a channel. Nothing is written to the chip.
    pub fn init_channel(&mut self, channel: i32, mode: PwmMode) -> Result<(), PwmError> {
        let channel = check_channel(channel)?;
        mode.validate()?;

        if let Some(old) = self.channels.insert(channel, mode) {
            debug!("Channel {} changed from {:?} to {:?}", channel, old, mode);
        }

        Ok(())
    }

    /// Drive a channel, returning the off tick that was written.
    ///
    /// The channel must have been initialised with [`PwmController::init_channel`].
    pub fn set_channel<V>(&mut self, channel: i32, value: V) -> Result<u16, PwmError>
    where
        V: Into<ChannelValue>
    {
        let channel = check_channel(channel)?;
        let mode = *self.channels
            .get(&channel)
            .ok_or(PwmError::ChannelNotInitialised(channel))?;

        let tick = mode.tick(value.into())?;

        self.set_pwm(channel, 0, tick)?;

        Ok(tick)
    }

    /// The mode a channel was initialised with, if any.
    pub fn channel_mode(&self, channel: i32) -> Option<PwmMode> {
        check_channel(channel)
            .ok()
            .and_then(|c| self.channels.get(&c).copied())
    }

    /// The prescale currently programmed into the chip.
    pub fn prescale(&self) -> u8 {
        self.prescale
    }

    /// Issue a software reset to the chip.
    pub fn reset(&mut self) -> Result<(), PwmError> {
        info!("Resetting PWM chip at 0x{:02x}", self.address);

        Ok(self.bus.write_raw(self.address, regs::SWRST)?)
    }

    /// Give back the bus.
    pub fn release(self) -> B {
        self.bus
    }

    fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), PwmError> {
        let address = self.address;
        let base = 4 * channel;

        trace!("Channel {} on = {}, off = {}", channel, on, off);

        self.bus.transaction(|bus| {
            write_reg(bus, address, regs::LED0_ON_L + base, (on & 0xFF) as u8)?;
            write_reg(bus, address, regs::LED0_ON_H + base, (on >> 8) as u8)?;
            write_reg(bus, address, regs::LED0_OFF_L + base, (off & 0xFF) as u8)?;
            write_reg(bus, address, regs::LED0_OFF_H + base, (off >> 8) as u8)
        })?;

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Compute the prescale register value giving `freq_hz`.
pub fn prescale_for(freq_hz: f64) -> Result<u8, PwmError> {
    if !(freq_hz.is_finite() && freq_hz > 0.0) {
        return Err(PwmError::InvalidFrequency(freq_hz));
    }

    let prescale = (OSC_FREQ_HZ / (CYCLE_TICKS as f64 * freq_hz) - 1.0 + 0.5).floor();

    if prescale < regs::PRESCALE_MIN as f64 || prescale > regs::PRESCALE_MAX as f64 {
        return Err(PwmError::PrescaleOutOfRange { freq_hz, prescale });
    }

    Ok(prescale as u8)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn write_reg(bus: &mut dyn BusTransport, addr: u8, reg: u8, value: u8) -> Result<(), BusError> {
    bus.write_byte(addr, reg, value)
}

/// Read a single register. A transport returning no bytes is an error, not a zero.
fn read_reg(bus: &mut dyn BusTransport, addr: u8, reg: u8) -> Result<u8, BusError> {
    bus.read_bytes(addr, reg, 1)?
        .first()
        .copied()
        .ok_or(BusError::ShortRead { addr, expected: 1, got: 0 })
}

fn check_channel(channel: i32) -> Result<u8, PwmError> {
    if channel >= 0 && channel < NUM_CHANNELS as i32 {
        Ok(channel as u8)
    }
    else {
        Err(PwmError::InvalidChannel(channel))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
