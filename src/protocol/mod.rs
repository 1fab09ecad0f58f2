pub mod command;
pub mod status;

pub use command::{UsbMode, UsbSpeed};
pub use status::{Status, StatusKind};

/// Fixed medium I/O unit of the chip.
pub const SECTOR_SIZE: usize = 512;
/// Size of the directory-entry record exchanged with the chip.
pub const DIR_INFO_SIZE: usize = 32;
/// Longest name the path resolver accepts per segment.
pub const SEGMENT_NAME_MAX: usize = 8;
/// Cursor position meaning "end of file" for `BYTE_LOCATE`.
pub const CURSOR_END: u32 = 0xFFFF_FFFF;
pub const CURSOR_BEGIN: u32 = 0x0000_0000;
