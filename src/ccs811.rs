// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use i2cdev::core::*;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::registers::*;

/// Interval slept between polling passes. Matches the one reading per
/// second cadence of drive mode 1.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

///
///CCS811 error enum, generic over the error type of the
///underlying bus device. DeviceNotFound when the hardware
///id register does not identify a CCS811. The remaining
///variants map to the bring-up stage the device reported
///an error at, carrying the decoded fault when the error
///id register held one.
///
#[derive(Debug)]
pub enum Ccs811Error<E> {
    /// Transport failure reported by the bus device
    Bus(E),
    /// Hardware id mismatch, contains the byte the device reported
    DeviceNotFound(u8),
    /// No runnable application firmware image on the device
    NoValidApplication,
    /// Device error flag set during the initial status check
    Startup(Option<Fault>),
    /// Device error flag set after the application start command
    AppStart(Option<Fault>),
    /// Device error flag set after selecting the drive mode
    DriveMode(Option<Fault>),
}

///Implementation for bus error to Ccs811Error
impl<E> From<E> for Ccs811Error<E> {
    fn from(e: E) -> Self {
        Ccs811Error::Bus(e)
    }
}

///Implementation of display for Ccs811Error
impl<E: fmt::Display> fmt::Display for Ccs811Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ccs811Error::Bus(e) => write!(f, "Bus error: {}", e),
            Ccs811Error::DeviceNotFound(id) => write!(
                f,
                "CCS811 not found (hardware id {:#04x}). Please check wiring.",
                id
            ),
            Ccs811Error::NoValidApplication => {
                fmt::Display::fmt("No valid application firmware on device", f)
            }
            Ccs811Error::Startup(fault) => stage_error(f, "Startup", fault),
            Ccs811Error::AppStart(fault) => stage_error(f, "AppStart", fault),
            Ccs811Error::DriveMode(fault) => stage_error(f, "setDriveMode", fault),
        }
    }
}

fn stage_error(f: &mut fmt::Formatter, stage: &str, fault: &Option<Fault>) -> fmt::Result {
    match fault {
        Some(fault) => write!(f, "Error at {}: {}", stage, fault),
        None => write!(f, "Error at {}", stage),
    }
}

///Implementation for Error to Ccs811Error
impl<E: fmt::Debug + fmt::Display> Error for Ccs811Error<E> {}

/// Fault conditions the device reports through the error id register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The heater voltage is not being applied correctly
    HeaterSupply,
    /// The heater current is out of range
    HeaterFault,
    /// A sensor resistance measurement reached the maximum of its range
    MaxResistance,
    /// An unsupported measurement mode was requested
    MeasModeInvalid,
    /// A read was addressed to an invalid register
    ReadRegInvalid,
    /// A write was addressed to an invalid register
    MsgInvalid,
}

/// Fault bits of the error id register in priority order, highest first.
const FAULTS: [(u8, Fault); 6] = [
    (5, Fault::HeaterSupply),
    (4, Fault::HeaterFault),
    (3, Fault::MaxResistance),
    (2, Fault::MeasModeInvalid),
    (1, Fault::ReadRegInvalid),
    (0, Fault::MsgInvalid),
];

impl Fault {
    /// Decode an error id byte into the dominant fault.
    ///
    /// The device convention is one dominant fault per status check, so
    /// only the highest-priority set bit is reported even when several
    /// bits are set at once. A byte of zero carries no fault.
    pub fn decode(raw: u8) -> Option<Fault> {
        FAULTS
            .iter()
            .find(|(bit, _)| raw & (1 << bit) != 0)
            .map(|&(_, fault)| fault)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Fault::HeaterSupply => "HeaterSupply",
            Fault::HeaterFault => "HeaterFault",
            Fault::MaxResistance => "MaxResistance",
            Fault::MeasModeInvalid => "MeasModeInvalid",
            Fault::ReadRegInvalid => "ReadRegInvalid",
            Fault::MsgInvalid => "MsgInvalid",
        };
        f.write_str(name)
    }
}

/// Snapshot of the status register. Read fresh for every query, never
/// cached.
#[derive(Debug, Clone, Copy)]
pub struct Status(pub u8);

impl Status {
    /// An error is latched; the error id register holds its source.
    pub fn has_error(self) -> bool {
        self.0 & STATUS_ERROR != 0
    }

    /// A new result is waiting in the algorithm result register.
    pub fn data_ready(self) -> bool {
        self.0 & STATUS_DATA_READY != 0
    }

    /// A runnable application firmware image is present.
    pub fn app_valid(self) -> bool {
        self.0 & STATUS_APP_VALID != 0
    }

    /// The device is running the application rather than the boot loader.
    pub fn in_app_mode(self) -> bool {
        self.0 & STATUS_FW_MODE != 0
    }
}

/// Latest decoded measurement pair. Both fields always come from the same
/// algorithm result block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reading {
    /// Equivalent CO2 in ppm
    pub co2: u16,
    /// Total volatile organic compounds in ppb
    pub tvoc: u16,
}

/// Lifecycle of a sensor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Configuring,
    Polling,
    Faulted,
    Stopped,
}

/// Outcome of a single polling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A fresh measurement was read and stored
    Reading(Reading),
    /// The device flagged an error; `None` when the error id decoded empty
    Fault(Option<Fault>),
    /// Neither new data nor an error this pass
    Idle,
}

/// CCS811 session, wraps a bus device handle
/// and has implemented related CCS811 operations
///
pub struct Ccs811<D: I2CDevice> {
    dev: D,
    reading: Reading,
    state: SessionState,
    interval: Duration,
}

impl Ccs811<LinuxI2CDevice> {
    /// Open the sensor on the standard bus `/dev/i2c-1` at the default
    /// address 0x5B.
    /// If fails, return an LinuxI2CError from i2cdev
    ///
    pub fn open() -> Result<Ccs811<LinuxI2CDevice>, LinuxI2CError> {
        let device = LinuxI2CDevice::new("/dev/i2c-1", DEVICE_ADDRESS)?;
        Ok(Ccs811::new(device))
    }
}

/// Implementation of CCS811 related
/// operations
///
///
impl<D: I2CDevice> Ccs811<D> {
    /// Create a session over an already opened bus device. The device
    /// handle is owned by the session for the rest of its life.
    pub fn new(dev: D) -> Ccs811<D> {
        Ccs811 {
            dev,
            reading: Reading::default(),
            state: SessionState::Uninitialized,
            interval: POLL_INTERVAL,
        }
    }

    /// Tear the session apart and hand the bus device back.
    pub fn destroy(self) -> D {
        self.dev
    }

    /// Replace the interval slept between polling passes.
    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Latest measurement pair. Keeps its previous value across polling
    /// passes that produce no new data.
    pub fn reading(&self) -> Reading {
        self.reading
    }

    /// Current session lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read the status register.
    pub fn status(&mut self) -> Result<Status, Ccs811Error<D::Error>> {
        let value = self.dev.smbus_read_byte_data(Register::Status as u8)?;
        Ok(Status(value))
    }

    /// Read the error id register and decode it into the dominant fault.
    pub fn read_fault(&mut self) -> Result<Option<Fault>, Ccs811Error<D::Error>> {
        let raw = self.dev.smbus_read_byte_data(Register::ErrorId as u8)?;
        Ok(Fault::decode(raw))
    }

    /// Read the error id register, log the decoded fault and hand it back.
    fn report_fault(&mut self) -> Result<Option<Fault>, Ccs811Error<D::Error>> {
        let fault = self.read_fault()?;
        match fault {
            Some(fault) => warn!("Device fault: {}", fault),
            None => warn!("Device error flag set but the error id carries no fault"),
        }
        Ok(fault)
    }

    /// Bring the device from power-on to measuring state.
    ///
    /// Verifies the hardware id, checks that an application firmware
    /// image is valid, starts it and selects drive mode 1 (one reading
    /// per second). Every step is checked against the device error flag
    /// and the first failure aborts the whole bring-up.
    ///
    /// Re-running a configured session re-issues the application start
    /// command, which the device may reject. Call it once per session.
    pub fn configure(&mut self) -> Result<(), Ccs811Error<D::Error>> {
        let hardware_id = self.dev.smbus_read_byte_data(Register::HwId as u8)?;
        if hardware_id != HW_ID_CODE {
            return Err(Ccs811Error::DeviceNotFound(hardware_id));
        }

        if self.status()?.has_error() {
            return Err(Ccs811Error::Startup(self.report_fault()?));
        }

        if !self.status()?.app_valid() {
            return Err(Ccs811Error::NoValidApplication);
        }

        debug!("Starting application firmware");
        self.dev.smbus_write_byte(Register::AppStart as u8)?;

        if self.status()?.has_error() {
            return Err(Ccs811Error::AppStart(self.report_fault()?));
        }

        self.set_drive_mode(1)?;

        if self.status()?.has_error() {
            return Err(Ccs811Error::DriveMode(self.report_fault()?));
        }

        Ok(())
    }

    /// Select the measurement drive mode, 0 (idle) through 4 (raw data
    /// every 250 ms). Values above 4 are clamped to 4.
    ///
    /// Read-modify-write: only bits 4-6 of the measurement mode register
    /// change, interrupt configuration held in the same register is
    /// preserved.
    pub fn set_drive_mode(&mut self, mode: u8) -> Result<(), Ccs811Error<D::Error>> {
        let mode = mode.min(DRIVE_MODE_MAX);

        let mut setting = self.dev.smbus_read_byte_data(Register::MeasMode as u8)?;
        setting &= !DRIVE_MODE_MASK;
        setting |= mode << DRIVE_MODE_SHIFT;
        self.dev
            .smbus_write_byte_data(Register::MeasMode as u8, setting)?;
        Ok(())
    }

    /// Read the encoded calibration baseline.
    /// Safe to call any time after a successful bring-up.
    ///
    pub fn get_baseline(&mut self) -> Result<u16, Ccs811Error<D::Error>> {
        let bytes = self
            .dev
            .smbus_read_i2c_block_data(Register::Baseline as u8, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read the hardware version byte.
    pub fn hardware_version(&mut self) -> Result<u8, Ccs811Error<D::Error>> {
        Ok(self.dev.smbus_read_byte_data(Register::HwVersion as u8)?)
    }

    /// Read the boot and application firmware versions, in that order.
    pub fn firmware_versions(&mut self) -> Result<(u16, u16), Ccs811Error<D::Error>> {
        let boot = self
            .dev
            .smbus_read_i2c_block_data(Register::FwBootVersion as u8, 2)?;
        let app = self
            .dev
            .smbus_read_i2c_block_data(Register::FwAppVersion as u8, 2)?;
        Ok((
            u16::from_be_bytes([boot[0], boot[1]]),
            u16::from_be_bytes([app[0], app[1]]),
        ))
    }

    /// Read the raw ADC current and voltage bytes.
    pub fn raw_data(&mut self) -> Result<[u8; 2], Ccs811Error<D::Error>> {
        let bytes = self
            .dev
            .smbus_read_i2c_block_data(Register::RawData as u8, 2)?;
        Ok([bytes[0], bytes[1]])
    }

    /// Reset the device into boot mode. A session that did this needs a
    /// full bring-up again before it can measure.
    pub fn software_reset(&mut self) -> Result<(), Ccs811Error<D::Error>> {
        self.dev
            .smbus_write_i2c_block_data(Register::SwReset as u8, &SW_RESET_KEY)?;
        self.state = SessionState::Uninitialized;
        Ok(())
    }

    /// Read the 4-byte algorithm result block and store the decoded pair.
    /// The stored reading is replaced whole, never half updated.
    fn read_algorithm_results(&mut self) -> Result<Reading, Ccs811Error<D::Error>> {
        let data = self
            .dev
            .smbus_read_i2c_block_data(Register::AlgResultData as u8, 4)?;
        self.reading = Reading {
            co2: u16::from_be_bytes([data[0], data[1]]),
            tvoc: u16::from_be_bytes([data[2], data[3]]),
        };
        Ok(self.reading)
    }

    /// One pass of the measurement loop.
    ///
    /// Data ready is checked before the error flag so a just-completed
    /// measurement is never dropped behind a stale error. The device does
    /// not raise both in steady state, only one branch runs per pass.
    pub fn poll(&mut self) -> Result<Poll, Ccs811Error<D::Error>> {
        let status = self.status()?;
        if status.data_ready() {
            Ok(Poll::Reading(self.read_algorithm_results()?))
        } else if status.has_error() {
            Ok(Poll::Fault(self.read_fault()?))
        } else {
            Ok(Poll::Idle)
        }
    }

    /// Bring the device up and poll it until `stop` is raised.
    ///
    /// Readings and device faults observed while polling are reported
    /// through `log`; faults do not interrupt the loop. Bring-up failures
    /// and bus errors end the session with the state left at
    /// [`SessionState::Faulted`]. The stop flag is checked on both sides
    /// of the sleep, so cancellation takes at most one poll interval.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), Ccs811Error<D::Error>> {
        info!("Starting CCS811 session");
        self.state = SessionState::Configuring;
        if let Err(e) = self.configure() {
            self.state = SessionState::Faulted;
            return Err(e);
        }

        match self.get_baseline() {
            Ok(baseline) => info!("Baseline for this sensor: {:#06x}", baseline),
            Err(e) => {
                self.state = SessionState::Faulted;
                return Err(e);
            }
        }

        self.state = SessionState::Polling;
        while !stop.load(Ordering::Relaxed) {
            match self.poll() {
                Ok(Poll::Reading(reading)) => {
                    info!("CO2={} TVOC={}", reading.co2, reading.tvoc)
                }
                Ok(Poll::Fault(Some(fault))) => warn!("Device fault: {}", fault),
                Ok(Poll::Fault(None)) => {
                    warn!("Device error flag set but the error id carries no fault")
                }
                Ok(Poll::Idle) => {}
                Err(e) => {
                    self.state = SessionState::Faulted;
                    return Err(e);
                }
            }

            if stop.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep(self.interval);
        }

        self.state = SessionState::Stopped;
        Ok(())
    }
}
