//! Byte-stream transfer state machine shared by file reads and writes.
//!
//! The machine is pure: it decides which chip operation comes next and the
//! session performs it, feeding the outcome back as an event.

mod engine;
mod hsm;

#[cfg(test)]
mod tests;

pub use engine::{TransferEngine, TransferProgress};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferPhase {
    Request,
    ReadWrite,
    Advance,
    Done,
}

/// Next chip operation the session must perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferAction {
    /// `BYTE_READ` / `BYTE_WRITE` for this many bytes.
    Request(u16),
    /// Move one chip-declared chunk of at most this many bytes.
    Move(usize),
    /// `BYTE_RD_GO` / `BYTE_WR_GO` inside the transfer.
    Continue,
    /// Closing `BYTE_WR_GO` that commits the written bytes.
    Flush,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferEvent {
    Poll,
    Answered(crate::protocol::Status),
    Moved(usize),
}

/// Medium bookkeeping that outlives a single transfer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MediumCounters {
    /// Bytes consumed from the current 512-byte sector (reads).
    pub sector_offset: u16,
    /// Free sectors left on the drive (writes).
    pub free_sectors: u32,
}
