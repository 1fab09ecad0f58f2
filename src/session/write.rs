use log::debug;

use crate::{
    bus::Ch376Transport,
    error::Ch376Error,
    protocol::{command::*, Status},
    transfer::{Direction, MediumCounters, TransferAction, TransferEngine},
};

use super::{Ch376Msc, Ch376Result};

/// Outcome of one write call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteChunk {
    /// Bytes taken from the front of the source.
    pub len: usize,
    /// `false` when the drive ran out of free sectors.
    pub space_left: bool,
}

const WRITE_ANSWERS: [Status; 2] = [Status::USB_INT_DISK_WRITE, Status::USB_INT_SUCCESS];

impl<T: Ch376Transport> Ch376Msc<T> {
    /// Writes `src` at the cursor of the open file.
    ///
    /// A missing file (last open answered `ERR_MISS_FILE`) is created first.
    /// Without a free sector the call returns at once without bus traffic.
    pub fn write_bytes(&mut self, src: &[u8]) -> Ch376Result<WriteChunk, T> {
        self.ensure_attached()?;
        if self.drive.free_sectors == 0 {
            debug!("ch376: write refused, no free sector");
            return Ok(WriteChunk {
                len: 0,
                space_left: false,
            });
        }
        self.prepare_write_target()?;
        if src.is_empty() {
            return Ok(WriteChunk {
                len: 0,
                space_left: true,
            });
        }
        self.file_written = true;

        let mut transfer = TransferEngine::new(Direction::Write, src.len());
        let mut counters = self.medium_counters();
        self.run_write(&mut transfer, &mut counters, src)?;

        let progress = transfer.progress();
        self.drive.free_sectors = counters.free_sectors;
        self.cursor.position = self.cursor.position.saturating_add(progress.done as u32);
        self.entry.size = self.entry.size.max(self.cursor.position);
        Ok(WriteChunk {
            len: progress.done,
            space_left: !progress.disk_full,
        })
    }

    fn prepare_write_target(&mut self) -> Ch376Result<(), T> {
        match self.answer {
            Some(Status::ERR_MISS_FILE) => {
                self.create_file()?;
            }
            Some(Status::ERR_FILE_CLOSE) if !self.file_name.is_empty() => {
                let name = self.file_name.clone();
                self.set_file_name(&name)?;
                self.open_file()?;
            }
            _ => {}
        }
        if self.file_open {
            Ok(())
        } else {
            Err(Ch376Error::NoOpenFile)
        }
    }

    fn run_write(
        &mut self,
        transfer: &mut TransferEngine,
        counters: &mut MediumCounters,
        src: &[u8],
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
                    let status = self.signal(CMD2H_BYTE_WRITE, &count.to_le_bytes())?;
                    let status = self.expect(status, &WRITE_ANSWERS)?;
                    self.answer = Some(status);
                    transfer.answered(status, counters);
                }
                TransferAction::Move(capacity) => {
                    let done = transfer.progress().done;
                    let moved = self.write_payload(&src[done..done + capacity])?;
                    transfer.moved(moved, counters);
                }
                TransferAction::Continue | TransferAction::Flush => {
                    let status = self.signal(CMD0H_BYTE_WR_GO, &[])?;
                    let status = self.expect(status, &WRITE_ANSWERS)?;
                    self.answer = Some(status);
                    transfer.answered(status, counters);
                }
            }
        }
    }
}
