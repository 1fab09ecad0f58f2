/// Size of the `DISK_QUERY` answer: total sectors, free sectors, FAT type.
pub const DRIVE_INFO_SIZE: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FatType {
    Fat12,
    Fat16,
    Fat32,
    Unknown(u8),
}

impl FatType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::Fat12,
            0x02 => Self::Fat16,
            0x03 => Self::Fat32,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Fat12 => 0x01,
            Self::Fat16 => 0x02,
            Self::Fat32 => 0x03,
            Self::Unknown(other) => other,
        }
    }
}

/// Capacity of the mounted medium in 512-byte sectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriveInfo {
    pub total_sectors: u32,
    pub free_sectors: u32,
    pub fat_code: u8,
}

impl DriveInfo {
    pub const EMPTY: Self = Self {
        total_sectors: 0,
        free_sectors: 0,
        fat_code: 0,
    };

    /// Decodes the query record; returns `None` when it is shorter than the
    /// full record so the info is never partially updated.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() < DRIVE_INFO_SIZE {
            return None;
        }
        Some(Self {
            total_sectors: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            free_sectors: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
            fat_code: raw[8],
        })
    }

    pub fn file_system(&self) -> FatType {
        FatType::from_code(self.fat_code)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}
