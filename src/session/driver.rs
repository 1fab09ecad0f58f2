use log::warn;

use crate::{
    bus::{Ch376Transport, CommandEngine, EngineFault},
    config::{Ch376Config, DriveSource},
    error::{Ch376Error, ErrorCode},
    fat::{DirInfo, DriveInfo, FatType},
    protocol::{command::*, Status},
    transfer::MediumCounters,
};

use super::Ch376Result;

/// Name last sent with `SET_FILE_NAME`; 8.3 plus the dot.
pub type FileName = heapless::String<12>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct Cursor {
    pub(super) position: u32,
    pub(super) sector_offset: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) enum Listing {
    #[default]
    Idle,
    /// Answer of the last `FILE_ENUM_GO`, consumed by the next call.
    Pending(Status),
}

/// CH376 mass-storage session.
///
/// Owns the command engine plus every container that describes the mounted
/// medium. Any bus fault, timeout, overflow or unexpected chip status fails the
/// session closed: the error code is recorded, the medium is marked detached
/// and the drive, entry and cursor state are zeroed.
pub struct Ch376Msc<T: Ch376Transport> {
    pub(super) engine: CommandEngine<T>,
    pub(super) config: Ch376Config,
    pub(super) controller_ready: bool,
    pub(super) attached: bool,
    pub(super) error: Option<ErrorCode>,
    pub(super) answer: Option<Status>,
    pub(super) dir_depth: u8,
    pub(super) entry: DirInfo,
    pub(super) file_open: bool,
    pub(super) file_written: bool,
    pub(super) file_name: FileName,
    pub(super) drive: DriveInfo,
    pub(super) cursor: Cursor,
    pub(super) stream_len: usize,
    pub(super) listing: Listing,
}

impl<T: Ch376Transport> Ch376Msc<T> {
    pub fn new(transport: T, config: Ch376Config) -> Self {
        Self {
            engine: CommandEngine::with_timing(
                transport,
                config.answer_timeout_ms,
                config.byte_settle_us,
            ),
            config,
            controller_ready: false,
            attached: false,
            error: None,
            answer: None,
            dir_depth: 0,
            entry: DirInfo::EMPTY,
            file_open: false,
            file_written: false,
            file_name: FileName::new(),
            drive: DriveInfo::EMPTY,
            cursor: Cursor::default(),
            stream_len: 0,
            listing: Listing::Idle,
        }
    }

    pub fn release(self) -> T {
        self.engine.release()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.engine.transport_mut()
    }

    pub fn config(&self) -> &Ch376Config {
        &self.config
    }

    pub fn device_attached(&self) -> bool {
        self.attached
    }

    pub fn controller_ready(&self) -> bool {
        self.controller_ready
    }

    /// Last recorded error; `None` after a successful attach.
    ///
    /// A fail-closed error is recorded together with the detach. A rejected
    /// path (too long, a file in the way, a missing directory) is recorded
    /// too, but the medium stays attached at the root and the code stays
    /// until [`Self::clear_error`] or the next successful mount.
    pub fn error(&self) -> Option<ErrorCode> {
        self.error
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Last status answered by a file-level command.
    pub fn status(&self) -> Option<Status> {
        self.answer
    }

    pub fn source(&self) -> DriveSource {
        self.config.source
    }

    pub fn dir_depth(&self) -> u8 {
        self.dir_depth
    }

    pub fn drive_info(&self) -> DriveInfo {
        self.drive
    }

    pub fn total_sectors(&self) -> u32 {
        self.drive.total_sectors
    }

    pub fn free_sectors(&self) -> u32 {
        self.drive.free_sectors
    }

    pub fn file_system(&self) -> FatType {
        self.drive.file_system()
    }

    /// Directory entry of the open file, or of the last listed entry.
    pub fn entry(&self) -> &DirInfo {
        &self.entry
    }

    /// Mutable entry, e.g. to change timestamps before
    /// [`Self::save_file_attributes`].
    pub fn entry_mut(&mut self) -> &mut DirInfo {
        &mut self.entry
    }

    pub fn file_size(&self) -> u32 {
        self.entry.size
    }

    pub fn file_attributes(&self) -> u8 {
        self.entry.attributes
    }

    pub fn file_name(&self) -> crate::fat::ShortName {
        self.entry.short_name()
    }

    pub fn cursor_pos(&self) -> u32 {
        self.cursor.position
    }

    /// Bytes moved by the last read call.
    pub fn stream_len(&self) -> usize {
        self.stream_len
    }

    pub fn eof(&self) -> bool {
        self.cursor.position >= self.entry.size
    }

    pub(super) fn ensure_attached(&self) -> Ch376Result<(), T> {
        if self.attached {
            Ok(())
        } else {
            Err(Ch376Error::NotAttached)
        }
    }

    /// Records `err`, detaches and zeroes every transient container.
    pub(super) fn fail(&mut self, err: Ch376Error<T::Error>) -> Ch376Error<T::Error> {
        warn!("ch376: failing closed: {:?}", err);
        let _ = self.engine.end_transaction();
        self.error = err.code();
        self.attached = false;
        self.dir_depth = 0;
        self.answer = None;
        self.listing = Listing::Idle;
        self.drive = DriveInfo::EMPTY;
        self.reset_file_container();
        err
    }

    /// Records a path-level rejection; the medium stays attached.
    pub(super) fn reject(&mut self, err: Ch376Error<T::Error>) -> Ch376Error<T::Error> {
        warn!("ch376: rejected: {:?}", err);
        self.error = err.code();
        err
    }

    pub(super) fn reset_file_container(&mut self) {
        self.entry = DirInfo::EMPTY;
        self.file_open = false;
        self.file_written = false;
        self.file_name.clear();
        self.cursor = Cursor::default();
        self.stream_len = 0;
    }

    pub(super) fn medium_counters(&self) -> MediumCounters {
        MediumCounters {
            sector_offset: self.cursor.sector_offset,
            free_sectors: self.drive.free_sectors,
        }
    }

    pub(super) fn command(&mut self, opcode: u8, inputs: &[u8]) -> Ch376Result<(), T> {
        match self.engine.execute(opcode, inputs) {
            Ok(()) => Ok(()),
            Err(fault) => Err(self.fail(fault.into())),
        }
    }

    pub(super) fn immediate(&mut self, opcode: u8, inputs: &[u8]) -> Ch376Result<u8, T> {
        match self.engine.execute_immediate(opcode, inputs) {
            Ok(output) => Ok(output),
            Err(fault) => Err(self.fail(fault.into())),
        }
    }

    pub(super) fn signal(&mut self, opcode: u8, inputs: &[u8]) -> Ch376Result<Status, T> {
        match self.engine.execute_with_signal(opcode, inputs) {
            Ok(status) => Ok(status),
            Err(fault) => Err(self.fail(fault.into())),
        }
    }

    /// Fails closed unless `status` is one of `accepted`.
    pub(super) fn expect(&mut self, status: Status, accepted: &[Status]) -> Ch376Result<Status, T> {
        if accepted.contains(&status) {
            Ok(status)
        } else {
            Err(self.fail(Ch376Error::Status(status)))
        }
    }

    /// `RD_USB_DATA0`: pulls one chip-declared packet into `out`.
    pub(super) fn read_payload(&mut self, out: &mut [u8]) -> Ch376Result<usize, T> {
        let declared = match self.engine.begin_stream_with_length(CMD01_RD_USB_DATA0) {
            Ok(declared) => declared,
            Err(fault) => return Err(self.fail(fault.into())),
        };
        let len = declared as usize;
        if len > out.len() {
            return Err(self.fail(Ch376Error::Overflow {
                declared,
                capacity: out.len(),
            }));
        }
        match finish_read(&mut self.engine, &mut out[..len]) {
            Ok(()) => Ok(len),
            Err(fault) => Err(self.fail(fault.into())),
        }
    }

    /// `WR_REQ_DATA`: pushes as many bytes of `src` as the chip asks for.
    pub(super) fn write_payload(&mut self, src: &[u8]) -> Ch376Result<usize, T> {
        let declared = match self.engine.begin_stream_with_length(CMD01_WR_REQ_DATA) {
            Ok(declared) => declared,
            Err(fault) => return Err(self.fail(fault.into())),
        };
        let len = declared as usize;
        if len > src.len() {
            return Err(self.fail(Ch376Error::Overflow {
                declared,
                capacity: src.len(),
            }));
        }
        match finish_write(&mut self.engine, &src[..len]) {
            Ok(()) => Ok(len),
            Err(fault) => Err(self.fail(fault.into())),
        }
    }

    /// Streams a fixed payload after a command that holds chip select.
    pub(super) fn stream_command(
        &mut self,
        opcode: u8,
        inputs: &[u8],
        payload: &[u8],
    ) -> Ch376Result<(), T> {
        let sent = self
            .engine
            .begin_stream(opcode, inputs)
            .and_then(|()| finish_write(&mut self.engine, payload));
        match sent {
            Ok(()) => Ok(()),
            Err(fault) => Err(self.fail(fault.into())),
        }
    }
}

fn finish_read<T: Ch376Transport>(
    engine: &mut CommandEngine<T>,
    out: &mut [u8],
) -> Result<(), EngineFault<T::Error>> {
    engine.stream_read(out)?;
    engine.end_transaction()
}

fn finish_write<T: Ch376Transport>(
    engine: &mut CommandEngine<T>,
    data: &[u8],
) -> Result<(), EngineFault<T::Error>> {
    engine.stream_write(data)?;
    engine.end_transaction()
}
