//! # Voltage monitor state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn, error};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

// Internal
use util::{maths::round_dp, time::period_for_rate_hz};
use crate::bus::{BusError, BusTransport};
use super::{
    counts_to_volts, BatteryError, ExpFilter, Params, MIN_CALIB_AVERAGE_V, REG_RESULT
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Samples the battery voltage and keeps a smoothed estimate of it.
///
/// The monitor is idle after construction, [`VoltageMonitor::start`] spawns the sampling thread
/// which runs until [`VoltageMonitor::stop`] is called or the monitor is dropped.
///
/// The bus is cloned into the sampling thread, so it must be a handle to a shared transport such
/// as a [`SharedBus`](crate::bus::SharedBus).
pub struct VoltageMonitor<B> {
    bus: B,
    params: Params,
    cells: Arc<Cells>,
    handle: Option<JoinHandle<()>>,
}

/// Cheap handle which reads the filtered voltage from any thread.
#[derive(Clone)]
pub struct FilteredReader {
    cells: Arc<Cells>,
}

/// State shared between the sampling thread and its readers.
struct Cells {
    /// Filtered voltage, written only by the sampling thread.
    filtered: AtomicF64,

    /// Divider gain, written only by calibration.
    gain: AtomicF64,

    stop: AtomicBool,
}

/// `f64` stored as its bit pattern so it can be swapped atomically.
struct AtomicF64(AtomicU64);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<B> VoltageMonitor<B>
where
    B: BusTransport + Clone + Send + 'static
{
    /// Create a new monitor over the given bus.
    pub fn new(bus: B, params: Params) -> Result<Self, BatteryError> {
        params.are_valid()?;

        let cells = Arc::new(Cells {
            filtered: AtomicF64::new(0.0),
            gain: AtomicF64::new(params.divider_gain),
            stop: AtomicBool::new(false),
        });

        Ok(Self {
            bus,
            params,
            cells,
            handle: None,
        })
    }

    /// Start the background sampling thread.
    ///
    /// If the monitor was previously stopped filtering resumes from the last filtered value.
    pub fn start(&mut self) -> Result<(), BatteryError> {
        if self.handle.is_some() {
            return Err(BatteryError::AlreadyRunning);
        }

        self.cells.stop.store(false, Ordering::SeqCst);

        let bus = self.bus.clone();
        let params = self.params.clone();
        let cells = self.cells.clone();

        let handle = thread::Builder::new()
            .name(String::from("battery_monitor"))
            .spawn(move || sample_thread(bus, params, cells))
            .map_err(BatteryError::SpawnFailed)?;

        self.handle = Some(handle);

        info!(
            "Battery monitor started at {} Hz (K = {})",
            self.params.sample_rate_hz, self.params.filter_k
        );

        Ok(())
    }

    /// Signal the sampling thread to stop and wait for it to exit.
    ///
    /// Returns within one sampling period. Does nothing if the thread isn't running.
    pub fn stop(&mut self) {
        self.cells.stop.store(true, Ordering::SeqCst);

        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(_) => info!("Battery monitor stopped"),
                Err(_) => error!("Battery monitor thread panicked"),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Read the instantaneous battery voltage, rounded to 2 decimal places.
    pub fn sample_instant(&self) -> Result<f64, BatteryError> {
        let mut bus = self.bus.clone();

        Ok(sample_instant(&mut bus, &self.params, self.cells.gain.load())?)
    }

    /// The latest filtered battery voltage, rounded to 2 decimal places.
    pub fn read_filtered(&self) -> f64 {
        self.reader().read()
    }

    /// Get a handle that other threads can use to read the filtered voltage.
    pub fn reader(&self) -> FilteredReader {
        FilteredReader {
            cells: self.cells.clone()
        }
    }

    /// The divider gain currently in use.
    pub fn gain(&self) -> f64 {
        self.cells.gain.load()
    }

    /// Calibrate the divider gain against a known battery voltage.
    ///
    /// Averages `calib_num_samples` readings of the ADC pin voltage and sets the gain so that the
    /// average maps onto `target_v`. The new gain is returned. If the average is too small to
    /// divide by (disconnected or shorted input) an error is returned and the gain is left as it
    /// was.
    pub fn calibrate(&self, target_v: f64) -> Result<f64, BatteryError> {
        if !(target_v.is_finite() && target_v > 0.0) {
            return Err(BatteryError::InvalidTarget(target_v));
        }

        let mut bus = self.bus.clone();
        let period = period_for_rate_hz(self.params.calib_rate_hz);
        let mut sum = 0.0;

        for _ in 0..self.params.calib_num_samples {
            sum += sample_converted(&mut bus, &self.params)?;
            thread::sleep(period);
        }

        let average = sum / self.params.calib_num_samples as f64;

        if !(average >= MIN_CALIB_AVERAGE_V) {
            warn!("Calibration rejected, average ADC voltage was {:.4} V", average);
            return Err(BatteryError::DegenerateCalibration(average));
        }

        let gain = target_v / average;
        self.cells.gain.store(gain);

        info!(
            "Battery calibrated to {:.2} V: average {:.4} V, gain {:.4}",
            target_v, average, gain
        );

        Ok(gain)
    }
}

impl<B> Drop for VoltageMonitor<B> {
    fn drop(&mut self) {
        self.cells.stop.store(true, Ordering::SeqCst);

        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

impl FilteredReader {
    /// The latest filtered battery voltage, rounded to 2 decimal places.
    pub fn read(&self) -> f64 {
        round_dp(self.cells.filtered.load(), 2)
    }
}

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Body of the sampling thread.
fn sample_thread<B: BusTransport>(mut bus: B, params: Params, cells: Arc<Cells>) {
    let period = period_for_rate_hz(params.sample_rate_hz);
    let mut filter = ExpFilter::with_initial(params.filter_k, cells.filtered.load());

    while !cells.stop.load(Ordering::SeqCst) {
        match sample_instant(&mut bus, &params, cells.gain.load()) {
            Ok(v) => cells.filtered.store(filter.update(v)),
            Err(e) => warn!("Battery sample failed, skipping: {}", e),
        }

        thread::sleep(period);
    }

    debug!("Battery sampling thread exiting at {:.2} V", filter.value());
}

/// Voltage at the ADC pin, before the divider gain.
fn sample_converted<T: BusTransport>(bus: &mut T, params: &Params) -> Result<f64, BusError> {
    let bytes = bus.read_bytes(params.address, REG_RESULT, 2)?;

    if bytes.len() < 2 {
        return Err(BusError::ShortRead {
            addr: params.address,
            expected: 2,
            got: bytes.len()
        });
    }

    Ok(counts_to_volts([bytes[0], bytes[1]], params.v_ref_v))
}

fn sample_instant<T: BusTransport>(bus: &mut T, params: &Params, gain: f64) -> Result<f64, BusError> {
    Ok(round_dp(sample_converted(bus, params)? * gain, 2))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::bus::mock::{MockBus, Transfer};
    use crate::bus::SharedBus;
    use crate::error::ErrorKind;
    use std::time::Duration;

    fn fast_params() -> Params {
        Params {
            sample_rate_hz: 1000.0,
            calib_rate_hz: 10_000.0,
            calib_num_samples: 10,
            ..Params::default()
        }
    }

    #[test]
    fn test_sample_instant() -> Result<(), BatteryError> {
        let mock = MockBus::new();
        // Full scale
        mock.set_register(0x4d, 0x00, &[0x0f, 0xff]);

        let monitor = VoltageMonitor::new(mock.clone(), Params::default())?;

        // 3.3 V * 7.66 = 25.278 -> 25.28
        assert_eq!(monitor.sample_instant()?, 25.28);
        assert_eq!(mock.transfers(), vec![Transfer::Read { addr: 0x4d, reg: 0x00, len: 2 }]);

        Ok(())
    }

    #[test]
    fn test_sample_instant_transport_error() -> Result<(), BatteryError> {
        let mock = MockBus::new();
        mock.set_fail(true);

        let monitor = VoltageMonitor::new(mock, Params::default())?;

        match monitor.sample_instant() {
            Err(e) => assert_eq!(e.kind(), ErrorKind::Transport),
            Ok(v) => panic!("Expected a transport error, got {}", v),
        }

        Ok(())
    }

    #[test]
    fn test_filtered_starts_at_zero() -> Result<(), BatteryError> {
        let monitor = VoltageMonitor::new(MockBus::new(), Params::default())?;

        assert_eq!(monitor.read_filtered(), 0.0);
        assert!(!monitor.is_running());

        Ok(())
    }

    #[test]
    fn test_sampling_waits_for_shared_transaction() -> Result<(), BatteryError> {
        let mock = MockBus::new();
        mock.set_register(0x4d, 0x00, &[0x0f, 0xff]);
        let mut shared = SharedBus::new(mock.clone());

        let mut monitor = VoltageMonitor::new(shared.clone(), fast_params())?;
        monitor.start()?;
        thread::sleep(Duration::from_millis(5));

        shared.transaction(|bus| {
            for byte in 0..4 {
                bus.write_byte(0x40, 0x00, byte)?;
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        })?;

        thread::sleep(Duration::from_millis(5));
        monitor.stop();

        let transfers = mock.transfers();
        let first = transfers.iter()
            .position(|t| matches!(t, Transfer::WriteByte { addr: 0x40, .. }))
            .unwrap();

        // The four writes are back to back, and sampling carries on after them
        assert!(transfers[first..first + 4]
            .iter()
            .all(|t| matches!(t, Transfer::WriteByte { addr: 0x40, .. })));
        assert!(transfers[first + 4..]
            .iter()
            .any(|t| matches!(t, Transfer::Read { addr: 0x4d, .. })));
        assert_eq!(monitor.sample_instant()?, 25.28);

        Ok(())
    }

    #[test]
    fn test_background_thread_converges() -> Result<(), BatteryError> {
        let mock = MockBus::new();
        mock.set_register(0x4d, 0x00, &[0x0f, 0xff]);

        let mut params = fast_params();
        params.filter_k = 0.5;
        let mut monitor = VoltageMonitor::new(mock, params)?;
        let reader = monitor.reader();

        monitor.start()?;
        assert!(matches!(monitor.start(), Err(BatteryError::AlreadyRunning)));

        // With K = 0.5 the error halves every tick, give it plenty of ticks to settle.
        let mut settled = false;
        for _ in 0..200 {
            thread::sleep(Duration::from_millis(5));
            if (reader.read() - 25.28).abs() < 0.011 {
                settled = true;
                break;
            }
        }

        monitor.stop();
        assert!(!monitor.is_running());
        assert!(settled, "Filtered voltage {} never settled", reader.read());

        // Stopped, so the value no longer changes
        let frozen = monitor.read_filtered();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(monitor.read_filtered(), frozen);

        Ok(())
    }

    #[test]
    fn test_failed_samples_leave_filter_untouched() -> Result<(), BatteryError> {
        let mock = MockBus::new();
        mock.set_register(0x4d, 0x00, &[0x0f, 0xff]);
        mock.set_fail(true);

        let mut monitor = VoltageMonitor::new(mock, fast_params())?;
        monitor.start()?;
        thread::sleep(Duration::from_millis(20));
        monitor.stop();

        assert_eq!(monitor.read_filtered(), 0.0);

        Ok(())
    }

    #[test]
    fn test_calibrate() -> Result<(), BatteryError> {
        let mock = MockBus::new();
        // Half scale: 2048 / 4095 * 3.3 V
        mock.set_register(0x4d, 0x00, &[0x08, 0x00]);

        let monitor = VoltageMonitor::new(mock.clone(), fast_params())?;
        let pin_v = 2048.0 / 4095.0 * 3.3;

        let gain = monitor.calibrate(12.6)?;
        assert!((gain - 12.6 / pin_v).abs() < 1e-9);
        assert_eq!(monitor.gain(), gain);
        assert_eq!(monitor.sample_instant()?, 12.6);

        // One read per calibration sample plus the sample above
        assert_eq!(mock.transfers().len(), 11);

        Ok(())
    }

    #[test]
    fn test_calibrate_rejects_zero_average() -> Result<(), BatteryError> {
        let mock = MockBus::new();
        mock.set_register(0x4d, 0x00, &[0x00, 0x00]);

        let monitor = VoltageMonitor::new(mock, fast_params())?;

        match monitor.calibrate(12.6) {
            Err(BatteryError::DegenerateCalibration(avg)) => assert_eq!(avg, 0.0),
            other => panic!("Expected a degenerate calibration error, got {:?}", other),
        }
        assert_eq!(monitor.gain(), 7.66);

        Ok(())
    }

    #[test]
    fn test_calibrate_rejects_bad_target() -> Result<(), BatteryError> {
        let monitor = VoltageMonitor::new(MockBus::new(), fast_params())?;

        assert!(matches!(monitor.calibrate(0.0), Err(BatteryError::InvalidTarget(_))));
        assert!(matches!(monitor.calibrate(std::f64::NAN), Err(BatteryError::InvalidTarget(_))));
        assert_eq!(monitor.gain(), 7.66);

        Ok(())
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        let mut params = Params::default();
        params.filter_k = 0.0;

        assert!(matches!(
            VoltageMonitor::new(MockBus::new(), params),
            Err(BatteryError::InvalidParams(_))
        ));
    }
}
