#![cfg_attr(feature = "no_std", no_std)]

//! Modbus RTU protocol engine for small controllers running a cooperative
//! multitasking kernel.
//!
//! One [`Rtu`] instance drives one half-duplex serial port in either the
//! master or the slave role. The engine owns the RTU framing rules (T3.5
//! silence detection, CRC-16, exception frames) and the eight standard
//! function codes; the UART driver, the RS-485 direction line and the
//! kernel primitives are supplied by the integration through the traits in
//! [`kernel`] and [`link`].

#[macro_use]
mod fmt;

// Common features for both master device and slave device
mod common;
pub use common::*;

mod ring;
pub use ring::RingBuffer;

pub mod kernel;

pub mod link;

mod banks;
pub use banks::{BankSizes, Banks};

mod telegram;
pub use telegram::{MAX_READ_WORDS, MAX_WRITE_WORDS, Originator, Reply, Telegram};

mod validate;

/// Slave device relative features
#[cfg(feature = "slave")]
mod slave;

/// Master device relative features
#[cfg(feature = "master")]
mod master;

mod rtu;
pub use rtu::{Config, Role, Rtu};

#[cfg(test)]
mod testutil;
