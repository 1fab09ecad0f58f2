use core::fmt::Write as _;

use heapless::String;

use crate::protocol::DIR_INFO_SIZE;

pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;

const FAT_YEAR_BASE: u16 = 1980;
const FAT_YEAR_MAX: u16 = 2099;

/// Display form of an 8.3 name, e.g. `README.TXT`.
pub type ShortName = String<12>;

/// Snapshot of the directory entry of the open file or directory, as the chip
/// reports it (the on-disk FAT layout).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirInfo {
    pub name: [u8; 11],
    pub attributes: u8,
    pub nt_reserved: u8,
    pub create_time_tenth: u8,
    pub create_time: u16,
    pub create_date: u16,
    pub access_date: u16,
    pub first_cluster_high: u16,
    pub write_time: u16,
    pub write_date: u16,
    pub first_cluster_low: u16,
    pub size: u32,
}

impl DirInfo {
    pub const EMPTY: Self = Self {
        name: [0; 11],
        attributes: 0,
        nt_reserved: 0,
        create_time_tenth: 0,
        create_time: 0,
        create_date: 0,
        access_date: 0,
        first_cluster_high: 0,
        write_time: 0,
        write_date: 0,
        first_cluster_low: 0,
        size: 0,
    };

    /// Decodes a possibly short payload; missing trailing bytes read as zero.
    pub fn from_bytes(raw: &[u8]) -> Self {
        let mut buf = [0u8; DIR_INFO_SIZE];
        let len = raw.len().min(DIR_INFO_SIZE);
        buf[..len].copy_from_slice(&raw[..len]);

        let u16_at = |off: usize| u16::from_le_bytes([buf[off], buf[off + 1]]);
        let mut name = [0u8; 11];
        name.copy_from_slice(&buf[..11]);
        Self {
            name,
            attributes: buf[11],
            nt_reserved: buf[12],
            create_time_tenth: buf[13],
            create_time: u16_at(14),
            create_date: u16_at(16),
            access_date: u16_at(18),
            first_cluster_high: u16_at(20),
            write_time: u16_at(22),
            write_date: u16_at(24),
            first_cluster_low: u16_at(26),
            size: u32::from_le_bytes([buf[28], buf[29], buf[30], buf[31]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; DIR_INFO_SIZE] {
        let mut out = [0u8; DIR_INFO_SIZE];
        out[..11].copy_from_slice(&self.name);
        out[11] = self.attributes;
        out[12] = self.nt_reserved;
        out[13] = self.create_time_tenth;
        out[14..16].copy_from_slice(&self.create_time.to_le_bytes());
        out[16..18].copy_from_slice(&self.create_date.to_le_bytes());
        out[18..20].copy_from_slice(&self.access_date.to_le_bytes());
        out[20..22].copy_from_slice(&self.first_cluster_high.to_le_bytes());
        out[22..24].copy_from_slice(&self.write_time.to_le_bytes());
        out[24..26].copy_from_slice(&self.write_date.to_le_bytes());
        out[26..28].copy_from_slice(&self.first_cluster_low.to_le_bytes());
        out[28..32].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    pub fn is_dir(&self) -> bool {
        (self.attributes & ATTR_DIRECTORY) != 0
    }

    pub fn first_cluster(&self) -> u32 {
        ((self.first_cluster_high as u32) << 16) | self.first_cluster_low as u32
    }

    /// `NAME.EXT` built from the space padded 8.3 field.
    pub fn short_name(&self) -> ShortName {
        let mut out = ShortName::new();
        let base = trim_padding(&self.name[..8]);
        let ext = trim_padding(&self.name[8..]);
        for &b in base {
            let _ = out.push(printable(b));
        }
        if !ext.is_empty() {
            let _ = out.push('.');
            for &b in ext {
                let _ = out.push(printable(b));
            }
        }
        out
    }

    pub fn year(&self) -> u16 {
        (self.write_date >> 9) + FAT_YEAR_BASE
    }

    pub fn month(&self) -> u16 {
        (self.write_date >> 5) & 0x0F
    }

    pub fn day(&self) -> u16 {
        self.write_date & 0x1F
    }

    pub fn hour(&self) -> u16 {
        self.write_time >> 11
    }

    pub fn minute(&self) -> u16 {
        (self.write_time >> 5) & 0x3F
    }

    /// Seconds in 2 s resolution.
    pub fn second(&self) -> u16 {
        (self.write_time & 0x1F) * 2
    }

    pub fn set_year(&mut self, year: u16) {
        let year = year.clamp(FAT_YEAR_BASE, FAT_YEAR_MAX) - FAT_YEAR_BASE;
        self.write_date = (self.write_date & 0x01FF) | (year << 9);
    }

    pub fn set_month(&mut self, month: u16) {
        let month = month.clamp(1, 12);
        self.write_date = (self.write_date & !0x01E0) | (month << 5);
    }

    pub fn set_day(&mut self, day: u16) {
        let day = day.clamp(1, 31);
        self.write_date = (self.write_date & !0x001F) | day;
    }

    pub fn set_hour(&mut self, hour: u16) {
        let hour = hour.min(23);
        self.write_time = (self.write_time & 0x07FF) | (hour << 11);
    }

    pub fn set_minute(&mut self, minute: u16) {
        let minute = minute.min(59);
        self.write_time = (self.write_time & !0x07E0) | (minute << 5);
    }

    pub fn set_second(&mut self, second: u16) {
        let second = second.min(59) / 2;
        self.write_time = (self.write_time & !0x001F) | second;
    }
}

fn trim_padding(field: &[u8]) -> &[u8] {
    let end = field
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |idx| idx + 1);
    &field[..end]
}

fn printable(b: u8) -> char {
    if b.is_ascii_graphic() {
        b as char
    } else {
        '?'
    }
}

/// Human readable size: `N byte`, `x.y Kb` or `x.y Mb`.
pub fn format_size(size: u32) -> String<16> {
    let mut out = String::new();
    let _ = if size >= 1_048_576 {
        write!(out, "{:.1} Mb", size as f32 / 1_048_576.0)
    } else if size >= 1024 {
        write!(out, "{:.1} Kb", size as f32 / 1024.0)
    } else {
        write!(out, "{} byte", size)
    };
    out
}
