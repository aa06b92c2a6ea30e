// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! CCS811 driver implementing basic CCS811 I2C air quality sensor operations
//!
//! Register protocol taken from the [datasheet](https://ams.com/documents/20143/36005/CCS811_DS000459_7-00.pdf/3cfdaea5-b602-fe28-1a14-18776b61a35a)
//! //! **IMPORTANT**
//! Current version contains application bring-up, drive mode selection and measurement polling, some advanced operations not yet implemented
//! Pending stuff:
//!
//! - [ ] Environment data (humidity/temperature) compensation
//! - [ ] Restoring a previously saved baseline
//! - [ ] Interrupt thresholds
//! - [ ] NTC resistance read
//!
//! ## Basic Example
//!
//! Bring the sensor up and poll the eCO2 and eTVOC measurements
//!
//!
//!```no_run
//!use ccs811_i2c::ccs811::{Ccs811, Poll};
//!use std::thread;
//!use std::time::Duration;
//!
//!fn main() {
//!    env_logger::init();
//!    // Open the I2C device
//!    let mut ccs = Ccs811::open().unwrap();
//!    ccs.configure().unwrap();
//!
//!    loop {
//!        match ccs.poll() {
//!            Ok(Poll::Reading(r)) => {
//!                println!("Co2: {} ppm tVOC: {} ppb", r.co2, r.tvoc);
//!            }
//!            Ok(Poll::Fault(Some(f))) => {
//!                println!("Device fault: {}", f);
//!            }
//!            Ok(_) => {}
//!            Err(e) => {
//!                println!("Error polling device. More details: {}", e);
//!                break;
//!            }
//!        }
//!        thread::sleep(Duration::from_secs(1));
//!    }
//!}
//!```
//!
//! The cancellable session loop does the same reporting through `log`
//!
//!```no_run
//!use ccs811_i2c::ccs811::Ccs811;
//!use std::sync::atomic::AtomicBool;
//!use std::sync::Arc;
//!
//!fn main() {
//!    env_logger::init();
//!    let stop = Arc::new(AtomicBool::new(false));
//!    let mut ccs = Ccs811::open().unwrap();
//!    if let Err(e) = ccs.run(&stop) {
//!        eprintln!("CCS811 session ended: {}", e);
//!    }
//!}
//!```
//!

/// Session implementing CCS811 device related operations
pub mod ccs811;
/// Register map and bitfield constants
pub mod registers;
