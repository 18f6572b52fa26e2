//! # Board Bring-up Executable
//!
//! Brings up every peripheral on the controller board from `periph.toml` and exercises it for a
//! short while:
//! - Starts the battery monitor and logs the filtered voltage
//! - Drives every configured PWM channel to its neutral value
//! - Draws the battery level on the display

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{Result, eyre::WrapErr};
use log::{info, warn};
use std::{thread, time::Duration};

// Internal
use periph::{
    battery::VoltageMonitor,
    bus::{BusTransport, SharedBus},
    display::{Bitmap, Display},
    params::BoardParams,
    pwm::{ChannelValue, PwmController, PwmMode},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of display updates before exiting.
const NUM_UPDATES: usize = 10;

/// Time between display updates.
const UPDATE_PERIOD: Duration = Duration::from_secs(1);

/// Battery voltage shown as a full bar (3S LiPo).
///
/// Units: volts
const FULL_BATTERY_V: f64 = 12.6;

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "board_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Controller Board Bring-up Executable\n");
    info!(
        "Running on: {:#?}", 
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: BoardParams = util::params::load("periph.toml")
        .wrap_err("Failed to load the board parameters")?;
    params.are_valid().wrap_err("Board parameters are invalid")?;

    info!("Parameters loaded");

    open_and_run(&params)
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Open the board's I2C bus and run the bring-up on it.
#[cfg(target_arch = "arm")]
fn open_and_run(params: &BoardParams) -> Result<()> {
    let bus = periph::bus::open_rpi_bus(params.bus.number)
        .wrap_err("Failed to open the I2C bus")?;

    run(bus, params)
}

#[cfg(not(target_arch = "arm"))]
fn open_and_run(_params: &BoardParams) -> Result<()> {
    Err(color_eyre::eyre::eyre!(
        "No hardware I2C bus on this platform, board_exec must run on the controller board"
    ))
}

/// Bring up and exercise every peripheral on `bus`.
#[cfg_attr(not(target_arch = "arm"), allow(dead_code))]
fn run<B>(bus: B, params: &BoardParams) -> Result<()>
where
    B: BusTransport + Send + 'static
{
    let bus = SharedBus::new(bus);

    // ---- PERIPHERAL INITIALISATION ----

    let mut battery = VoltageMonitor::new(bus.clone(), params.battery.clone())
        .wrap_err("Failed to create the battery monitor")?;
    battery.start().wrap_err("Failed to start the battery monitor")?;

    let mut pwm = PwmController::new(bus.clone(), &params.pwm)
        .wrap_err("Failed to initialise the PWM chip")?;

    let mut display = Display::from_params(bus.clone(), &params.display)
        .wrap_err("Failed to create the display")?;
    display.begin(params.display.vcc)
        .wrap_err("Failed to start the display")?;

    info!("Peripherals initialised");

    // ---- NEUTRAL OUTPUTS ----

    for cfg in params.pwm.channels.iter() {
        let value = neutral_value(cfg.mode);
        let tick = pwm.set_channel(cfg.channel as i32, value)
            .wrap_err_with(|| format!("Failed to set channel {}", cfg.channel))?;

        info!("Channel {} ({:?}) set to {:?} (tick {})", cfg.channel, cfg.mode, value, tick);
    }

    // ---- MAIN LOOP ----

    for _ in 0..NUM_UPDATES {
        thread::sleep(UPDATE_PERIOD);

        let voltage = battery.read_filtered();
        info!("Battery: {:.2} V", voltage);

        let model = *display.model();
        display.load_image(&battery_card(model.width, model.height, voltage))?;

        if let Err(e) = display.flush() {
            warn!("Couldn't update the display: {}", e);
        }
    }

    // ---- SHUTDOWN ----

    battery.stop();
    display.clear();
    display.flush().wrap_err("Failed to blank the display")?;

    info!("Bring-up complete");

    Ok(())
}

/// Value which leaves whatever is on a channel at rest.
#[cfg_attr(not(target_arch = "arm"), allow(dead_code))]
fn neutral_value(mode: PwmMode) -> ChannelValue {
    match mode {
        PwmMode::Servo { max_angle } => ChannelValue::Number(max_angle / 2.0),
        PwmMode::ForwardMotor | PwmMode::ReverseMotor => ChannelValue::Number(0.0),
        PwmMode::OnOff => ChannelValue::Switch(false),
    }
}

/// A border with a bar across the middle showing the battery level.
#[cfg_attr(not(target_arch = "arm"), allow(dead_code))]
fn battery_card(width: u32, height: u32, voltage: f64) -> Bitmap {
    let fill = (voltage / FULL_BATTERY_V).max(0.0).min(1.0);
    let bar_end = ((width - 4) as f64 * fill) as u32 + 2;

    Bitmap::from_fn(width, height, |x, y| {
        let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
        let bar = x >= 2 && x < bar_end && y >= height / 4 && y < height - height / 4;

        border || bar
    })
}
