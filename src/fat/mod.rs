pub mod dir_info;
pub mod drive;

pub use dir_info::{format_size, DirInfo, ShortName, ATTR_ARCHIVE, ATTR_DIRECTORY, ATTR_READ_ONLY};
pub use drive::{DriveInfo, FatType, DRIVE_INFO_SIZE};
