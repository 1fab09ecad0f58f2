//! Opcode table of the CH376 command set.
//!
//! The prefix of each name encodes the frame shape used by the engine:
//! `CMDxy` takes `x` input bytes and returns `y` immediate output bytes,
//! `CMDxH` takes `x` input bytes and completes through the interrupt line.

pub const CMD01_GET_IC_VER: u8 = 0x01;
pub const CMD00_RESET_ALL: u8 = 0x05;
pub const CMD11_CHECK_EXIST: u8 = 0x06;
pub const CMD20_SET_SDO_INT: u8 = 0x0B;
pub const CMD10_SET_USB_SPEED: u8 = 0x04;
pub const CMD11_SET_USB_MODE: u8 = 0x15;
pub const CMD01_GET_STATUS: u8 = 0x22;
pub const CMD01_RD_USB_DATA0: u8 = 0x27;
pub const CMD01_WR_REQ_DATA: u8 = 0x2D;
pub const CMD20_WR_OFS_DATA: u8 = 0x2E;
pub const CMD10_SET_FILE_NAME: u8 = 0x2F;

pub const CMD0H_DISK_MOUNT: u8 = 0x31;
pub const CMD0H_FILE_OPEN: u8 = 0x32;
pub const CMD0H_FILE_ENUM_GO: u8 = 0x33;
pub const CMD0H_FILE_CREATE: u8 = 0x34;
pub const CMD0H_FILE_ERASE: u8 = 0x35;
pub const CMD1H_FILE_CLOSE: u8 = 0x36;
pub const CMD1H_DIR_INFO_READ: u8 = 0x37;
pub const CMD0H_DIR_INFO_SAVE: u8 = 0x38;
pub const CMD4H_BYTE_LOCATE: u8 = 0x39;
pub const CMD2H_BYTE_READ: u8 = 0x3A;
pub const CMD0H_BYTE_RD_GO: u8 = 0x3B;
pub const CMD2H_BYTE_WRITE: u8 = 0x3C;
pub const CMD0H_BYTE_WR_GO: u8 = 0x3D;
pub const CMD0H_DISK_QUERY: u8 = 0x3F;
pub const CMD0H_DIR_CREATE: u8 = 0x40;

/// Answer of `CHECK_EXIST` is the bitwise inverse of its input.
pub const CHECK_EXIST_PROBE: u8 = 0x01;
/// Index passed to `DIR_INFO_READ` to select the currently open entry.
pub const DIR_INFO_CURRENT: u8 = 0xFF;
/// `SET_SDO_INT` arguments routing the interrupt onto the SDO (MISO) pin.
pub const SDO_INT_ENABLE: [u8; 2] = [0x16, 0x90];

/// Working modes accepted by `SET_USB_MODE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum UsbMode {
    /// Invalid device mode, the reset default.
    Default = 0x00,
    DeviceExternalFirmware = 0x01,
    DeviceInternalFirmware = 0x02,
    /// SD host, manages an SD card.
    HostSd = 0x03,
    HostInvalid = 0x04,
    /// USB host without SOF generation (idle).
    HostIdle = 0x05,
    /// USB host generating SOF (running).
    HostRun = 0x06,
    /// USB host issuing a bus reset.
    HostBusReset = 0x07,
}

/// Bus speeds accepted by `SET_USB_SPEED`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum UsbSpeed {
    FullSpeed = 0x00,
    FullSpeedNonStandard = 0x01,
    LowSpeed = 0x02,
}
