#![no_std]

//! Blocking driver for the CH376 USB/SD host controller over SPI.
//!
//! The chip parses FAT itself; this crate speaks its command protocol, follows
//! its interrupt/status codes and turns its 64-byte packets into byte streams.

pub mod bus;
pub mod config;
pub mod error;
pub mod fat;
pub mod protocol;
pub mod session;
pub mod transfer;

#[cfg(feature = "embassy-clock")]
pub use bus::EmbassyClock;
pub use bus::{Ch376Transport, Clock, CommandEngine, SpiTransport, TransportError};
pub use config::{Ch376Config, DriveSource};
pub use error::{Ch376Error, ErrorCode};
pub use fat::{DirInfo, DriveInfo, FatType};
pub use protocol::{Status, StatusKind, UsbMode, UsbSpeed, CURSOR_BEGIN, CURSOR_END};
pub use session::{Ch376Msc, Ch376Result, ReadChunk, WriteChunk};
