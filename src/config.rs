pub const ANSWER_TIMEOUT_MS: u32 = 1000;
pub const MOUNT_ATTEMPTS: u8 = 5;
/// Chip select to clock settle time; the datasheet minimum is 1.5 us.
pub const BYTE_SETTLE_US: u32 = 2;
/// 3 = /subdir1/subdir2/subdir3
pub const MAX_DIR_DEPTH: u8 = 3;
pub const CONTROLLER_RESET_SETTLE_MS: u32 = 100;
pub const MODE_SWITCH_SETTLE_US: u32 = 40;
pub const INT_DRAIN_INTERVAL_MS: u32 = 10;

/// Medium the controller session mounts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriveSource {
    #[default]
    Usb,
    Sd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ch376Config {
    pub answer_timeout_ms: u32,
    pub mount_attempts: u8,
    pub byte_settle_us: u32,
    pub max_dir_depth: u8,
    pub source: DriveSource,
    /// No INT line is wired; the chip signals completion on SDO instead.
    pub interrupt_on_sdo: bool,
}

impl Default for Ch376Config {
    fn default() -> Self {
        Self {
            answer_timeout_ms: ANSWER_TIMEOUT_MS,
            mount_attempts: MOUNT_ATTEMPTS,
            byte_settle_us: BYTE_SETTLE_US,
            max_dir_depth: MAX_DIR_DEPTH,
            source: DriveSource::Usb,
            interrupt_on_sdo: false,
        }
    }
}

impl Ch376Config {
    pub fn with_answer_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.answer_timeout_ms = timeout_ms;
        self
    }

    pub fn with_mount_attempts(mut self, attempts: u8) -> Self {
        self.mount_attempts = attempts.max(1);
        self
    }

    pub fn with_byte_settle_us(mut self, settle_us: u32) -> Self {
        self.byte_settle_us = settle_us;
        self
    }

    pub fn with_max_dir_depth(mut self, depth: u8) -> Self {
        self.max_dir_depth = depth;
        self
    }

    pub fn with_source(mut self, source: DriveSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_interrupt_on_sdo(mut self, enabled: bool) -> Self {
        self.interrupt_on_sdo = enabled;
        self
    }

    /// Longest path (exclusive) the resolver accepts: depth * (8 chars + separator).
    pub fn path_len_limit(&self) -> usize {
        self.max_dir_depth as usize * (crate::protocol::SEGMENT_NAME_MAX + 1)
    }
}
