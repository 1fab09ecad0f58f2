use crate::{
    bus::Ch376Transport,
    error::Ch376Error,
    protocol::{command::*, Status},
    transfer::{Direction, MediumCounters, TransferAction, TransferEngine},
};

use super::{Ch376Msc, Ch376Result};

/// Outcome of one read call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadChunk {
    /// Bytes stored at the front of the destination.
    pub len: usize,
    /// `false` once the chip reported the end of the file.
    pub more: bool,
}

impl ReadChunk {
    pub const END: Self = Self {
        len: 0,
        more: false,
    };
}

const READ_ANSWERS: [Status; 2] = [Status::USB_INT_DISK_READ, Status::USB_INT_SUCCESS];

impl<T: Ch376Transport> Ch376Msc<T> {
    /// Fills `dst` from the cursor of the open file.
    ///
    /// Stops early at the end of the file. The whole call is bounded by the
    /// answer timeout; on timeout the session fails closed and
    /// [`Self::stream_len`] still reports how many bytes landed in `dst`.
    pub fn read_bytes(&mut self, dst: &mut [u8]) -> Ch376Result<ReadChunk, T> {
        self.ensure_attached()?;
        self.file_written = false;
        if matches!(
            self.answer,
            Some(Status::ERR_FILE_CLOSE | Status::ERR_MISS_FILE)
        ) {
            self.stream_len = 0;
            return Ok(ReadChunk::END);
        }
        if !self.file_open {
            return Err(Ch376Error::NoOpenFile);
        }
        if dst.is_empty() {
            self.stream_len = 0;
            return Ok(ReadChunk {
                len: 0,
                more: !self.eof(),
            });
        }

        let mut transfer = TransferEngine::new(Direction::Read, dst.len());
        let mut counters = self.medium_counters();
        let result = self.run_read(&mut transfer, &mut counters, dst);
        let progress = transfer.progress();
        match result {
            Ok(()) => {
                self.cursor.sector_offset = counters.sector_offset;
                self.cursor.position = self.cursor.position.saturating_add(progress.done as u32);
                self.stream_len = progress.done;
                Ok(ReadChunk {
                    len: progress.done,
                    more: progress.more,
                })
            }
            Err(err) => {
                self.stream_len = progress.done;
                Err(err)
            }
        }
    }

    fn run_read(
        &mut self,
        transfer: &mut TransferEngine,
        counters: &mut MediumCounters,
        dst: &mut [u8],
    ) -> Ch376Result<(), T> {
        let started = self.engine.now_ms();
        loop {
            if self.engine.now_ms().wrapping_sub(started) >= self.config.answer_timeout_ms {
                return Err(self.fail(Ch376Error::Timeout));
            }
            self.ensure_attached()?;
            if transfer.progress().finished {
                return Ok(());
            }

            let Some(action) = transfer.poll(counters) else {
                continue;
            };
            match action {
                TransferAction::Request(count) => {
                    let status = self.signal(CMD2H_BYTE_READ, &count.to_le_bytes())?;
                    let status = self.expect(status, &READ_ANSWERS)?;
                    self.answer = Some(status);
                    transfer.answered(status, counters);
                }
                TransferAction::Move(capacity) => {
                    let done = transfer.progress().done;
                    let moved = self.read_payload(&mut dst[done..done + capacity])?;
                    transfer.moved(moved, counters);
                }
                TransferAction::Continue => {
                    let status = self.signal(CMD0H_BYTE_RD_GO, &[])?;
                    let status = self.expect(status, &READ_ANSWERS)?;
                    transfer.answered(status, counters);
                }
                TransferAction::Flush => transfer.answered(Status::USB_INT_SUCCESS, counters),
            }
        }
    }
}
