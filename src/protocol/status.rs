use core::fmt;

/// Status byte reported by the chip after a signalled command.
///
/// Unknown values are carried verbatim so firmware revisions with extra codes
/// still round-trip through the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Status(pub u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Continuation,
    Event,
    Error,
}

impl Status {
    pub const USB_INT_SUSPEND: Self = Self(0x05);
    pub const USB_INT_WAKE_UP: Self = Self(0x06);
    pub const USB_INT_SUCCESS: Self = Self(0x14);
    pub const USB_INT_CONNECT: Self = Self(0x15);
    pub const USB_INT_DISCONNECT: Self = Self(0x16);
    pub const USB_INT_BUF_OVER: Self = Self(0x17);
    pub const USB_INT_USB_READY: Self = Self(0x18);
    pub const USB_INT_DISK_READ: Self = Self(0x1D);
    pub const USB_INT_DISK_WRITE: Self = Self(0x1E);
    pub const USB_INT_DISK_ERR: Self = Self(0x1F);

    pub const ERR_OPEN_DIR: Self = Self(0x41);
    pub const ERR_MISS_FILE: Self = Self(0x42);
    pub const ERR_FOUND_NAME: Self = Self(0x43);
    pub const ERR_LONG_BUF_OVER: Self = Self(0x48);
    pub const ERR_LONG_NAME_ERR: Self = Self(0x49);
    pub const ERR_NAME_EXIST: Self = Self(0x4A);
    pub const ERR_DISK_DISCON: Self = Self(0x82);
    pub const ERR_LARGE_SECTOR: Self = Self(0x84);
    pub const ERR_TYPE_ERROR: Self = Self(0x92);
    pub const ERR_BPB_ERROR: Self = Self(0xA1);
    pub const ERR_DISK_FULL: Self = Self(0xB1);
    pub const ERR_FDT_OVER: Self = Self(0xB2);
    pub const ERR_MISS_DIR: Self = Self(0xB3);
    pub const ERR_FILE_CLOSE: Self = Self(0xB4);

    /// Immediate answers of `SET_USB_MODE` and friends.
    pub const CMD_RET_SUCCESS: Self = Self(0x51);
    pub const CMD_RET_ABORT: Self = Self(0x5F);

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub fn kind(self) -> StatusKind {
        match self {
            Self::USB_INT_SUCCESS => StatusKind::Success,
            Self::USB_INT_DISK_READ | Self::USB_INT_DISK_WRITE => StatusKind::Continuation,
            Self::USB_INT_CONNECT
            | Self::USB_INT_DISCONNECT
            | Self::USB_INT_SUSPEND
            | Self::USB_INT_WAKE_UP
            | Self::USB_INT_USB_READY => StatusKind::Event,
            _ => StatusKind::Error,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::USB_INT_SUCCESS
    }

    pub fn is_continuation(self) -> bool {
        matches!(self.kind(), StatusKind::Continuation)
    }

    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::USB_INT_SUSPEND => "USB_INT_SUSPEND",
            Self::USB_INT_WAKE_UP => "USB_INT_WAKE_UP",
            Self::USB_INT_SUCCESS => "USB_INT_SUCCESS",
            Self::USB_INT_CONNECT => "USB_INT_CONNECT",
            Self::USB_INT_DISCONNECT => "USB_INT_DISCONNECT",
            Self::USB_INT_BUF_OVER => "USB_INT_BUF_OVER",
            Self::USB_INT_USB_READY => "USB_INT_USB_READY",
            Self::USB_INT_DISK_READ => "USB_INT_DISK_READ",
            Self::USB_INT_DISK_WRITE => "USB_INT_DISK_WRITE",
            Self::USB_INT_DISK_ERR => "USB_INT_DISK_ERR",
            Self::ERR_OPEN_DIR => "ERR_OPEN_DIR",
            Self::ERR_MISS_FILE => "ERR_MISS_FILE",
            Self::ERR_FOUND_NAME => "ERR_FOUND_NAME",
            Self::ERR_LONG_BUF_OVER => "ERR_LONG_BUF_OVER",
            Self::ERR_LONG_NAME_ERR => "ERR_LONG_NAME_ERR",
            Self::ERR_NAME_EXIST => "ERR_NAME_EXIST",
            Self::ERR_DISK_DISCON => "ERR_DISK_DISCON",
            Self::ERR_LARGE_SECTOR => "ERR_LARGE_SECTOR",
            Self::ERR_TYPE_ERROR => "ERR_TYPE_ERROR",
            Self::ERR_BPB_ERROR => "ERR_BPB_ERROR",
            Self::ERR_DISK_FULL => "ERR_DISK_FULL",
            Self::ERR_FDT_OVER => "ERR_FDT_OVER",
            Self::ERR_MISS_DIR => "ERR_MISS_DIR",
            Self::ERR_FILE_CLOSE => "ERR_FILE_CLOSE",
            Self::CMD_RET_SUCCESS => "CMD_RET_SUCCESS",
            Self::CMD_RET_ABORT => "CMD_RET_ABORT",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}(0x{:02X})", name, self.0),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
