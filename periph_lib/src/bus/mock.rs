//! Recording bus used by the driver tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::{BusError, BusTransport};

/// A single transfer seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Transfer {
    Read { addr: u8, reg: u8, len: usize },
    WriteByte { addr: u8, reg: u8, byte: u8 },
    WriteRaw { addr: u8, byte: u8 },
    WriteBlock { addr: u8, reg: u8, data: Vec<u8> },
}

#[derive(Default)]
struct MockState {
    transfers: Vec<Transfer>,
    registers: HashMap<(u8, u8), Vec<u8>>,
    fail: bool,
    short_reads: bool,
    delay: Duration,
}

/// Bus which records every transfer and answers reads from a register table.
///
/// Clones share the same state, so a test can keep one handle and give the other to the driver
/// under test. Reads of a register with no programmed value return zeros.
#[derive(Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bytes returned when reading `reg` of device `addr`.
    pub fn set_register(&self, addr: u8, reg: u8, value: &[u8]) {
        self.state.lock().unwrap().registers.insert((addr, reg), value.to_vec());
    }

    /// Make every following transfer fail.
    pub fn set_fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    /// Make every following read return no bytes.
    pub fn set_short_reads(&self, short: bool) {
        self.state.lock().unwrap().short_reads = short;
    }

    /// Time each transfer takes, to widen the window for other threads.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = delay;
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.state.lock().unwrap().transfers.clone()
    }

    pub fn clear_transfers(&self) {
        self.state.lock().unwrap().transfers.clear();
    }

    /// Writes only, in order, as `(addr, reg, byte)` with block writes flattened.
    pub fn written_bytes(&self, addr: u8) -> Vec<(u8, u8)> {
        let mut out = Vec::new();

        for t in self.transfers() {
            match t {
                Transfer::WriteByte { addr: a, reg, byte } if a == addr => out.push((reg, byte)),
                Transfer::WriteBlock { addr: a, reg, data } if a == addr => {
                    out.extend(data.into_iter().map(|b| (reg, b)))
                }
                _ => ()
            }
        }

        out
    }

    fn record(&self, transfer: Transfer) -> Result<(), BusError> {
        let delay = self.state.lock().unwrap().delay;
        thread::sleep(delay);

        let mut state = self.state.lock().unwrap();

        if state.fail {
            let addr = match transfer {
                Transfer::Read { addr, .. }
                | Transfer::WriteByte { addr, .. }
                | Transfer::WriteRaw { addr, .. }
                | Transfer::WriteBlock { addr, .. } => addr,
            };
            return Err(BusError::Transfer { addr, msg: String::from("mock failure") });
        }

        state.transfers.push(transfer);

        Ok(())
    }
}

impl BusTransport for MockBus {
    fn read_bytes(&mut self, addr: u8, reg: u8, len: usize) -> Result<Vec<u8>, BusError> {
        self.record(Transfer::Read { addr, reg, len })?;

        let state = self.state.lock().unwrap();
        if state.short_reads {
            return Ok(Vec::new());
        }

        let mut value = state.registers.get(&(addr, reg)).cloned().unwrap_or_default();
        value.resize(len, 0);

        Ok(value)
    }

    fn write_byte(&mut self, addr: u8, reg: u8, byte: u8) -> Result<(), BusError> {
        self.record(Transfer::WriteByte { addr, reg, byte })?;

        // Writes are visible to later reads of the same register
        self.state.lock().unwrap().registers.insert((addr, reg), vec![byte]);

        Ok(())
    }

    fn write_raw(&mut self, addr: u8, byte: u8) -> Result<(), BusError> {
        self.record(Transfer::WriteRaw { addr, byte })
    }

    fn write_block(&mut self, addr: u8, reg: u8, data: &[u8]) -> Result<(), BusError> {
        self.record(Transfer::WriteBlock { addr, reg, data: data.to_vec() })
    }
}
