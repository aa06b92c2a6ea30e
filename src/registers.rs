// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! CCS811 register map and bitfield constants (ams CCS811 datasheet,
//! Figure 14 and Figure 25).
//!
//! Key groups:
//! - **Status & results** - 0x00 (status), 0x02 (eCO2/eTVOC block), 0x03 (raw ADC)
//! - **Configuration** - 0x01 (measurement mode), 0x05 (environment data), 0x10 (thresholds)
//! - **Calibration** - 0x11 (baseline, 2 bytes)
//! - **Identification** - 0x20/0x21 (hardware), 0x23/0x24 (firmware, 2 bytes each)
//! - **Control** - 0xF4 (application start, no payload), 0xFF (software reset)

/// Default I2C slave address (ADDR pin high; 0x5A with ADDR low).
pub const DEVICE_ADDRESS: u16 = 0x5B;

/// Value the hardware id register reports for a CCS811.
pub const HW_ID_CODE: u8 = 0x81;

/// Register addresses. All are 8-bit mailbox ids, one byte wide except
/// where noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    Status = 0x00,
    MeasMode = 0x01,
    // eCO2 high/low then eTVOC high/low, up to 8 bytes total
    AlgResultData = 0x02,
    // Raw ADC current and voltage, 2 bytes
    RawData = 0x03,
    // Humidity and temperature compensation, write-only, 4 bytes
    EnvData = 0x05,
    Ntc = 0x06,
    // Interrupt thresholds, write-only, 5 bytes
    Thresholds = 0x10,
    // Encoded baseline, 2 bytes
    Baseline = 0x11,
    HwId = 0x20,
    HwVersion = 0x21,
    // 2 bytes
    FwBootVersion = 0x23,
    // 2 bytes
    FwAppVersion = 0x24,
    ErrorId = 0xE0,
    // Write the mailbox id alone to transition boot -> application mode
    AppStart = 0xF4,
    SwReset = 0xFF,
}

/// Status register bits.
pub const STATUS_ERROR: u8 = 1 << 0;
pub const STATUS_DATA_READY: u8 = 1 << 3;
pub const STATUS_APP_VALID: u8 = 1 << 4;
pub const STATUS_FW_MODE: u8 = 1 << 7;

/// Drive mode field of the measurement mode register, bits 4-6.
pub const DRIVE_MODE_MASK: u8 = 0b0000_0111 << 4;
pub const DRIVE_MODE_SHIFT: u8 = 4;
/// Highest defined drive mode; larger requests are clamped to this.
pub const DRIVE_MODE_MAX: u8 = 4;

/// Writing exactly these 4 bytes to [`Register::SwReset`] in a single
/// sequence resets the device into boot mode.
pub const SW_RESET_KEY: [u8; 4] = [0x11, 0xE5, 0x72, 0x8A];
