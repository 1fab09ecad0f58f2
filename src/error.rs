use crate::{bus::EngineFault, protocol::Status};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ch376Error<E> {
    /// The transport failed to move a byte or drive a pin.
    Bus(E),
    /// The interrupt line or a transfer loop exceeded the answer timeout.
    Timeout,
    /// The chip declared more payload than the destination can hold.
    Overflow { declared: u8, capacity: usize },
    /// The chip answered with a status the operation does not accept.
    Status(Status),
    LongFilename,
    NotAttached,
    NoOpenFile,
    ControllerNotFound,
}

impl<E> From<EngineFault<E>> for Ch376Error<E> {
    fn from(value: EngineFault<E>) -> Self {
        match value {
            EngineFault::Bus(err) => Self::Bus(err),
            EngineFault::Timeout => Self::Timeout,
        }
    }
}

impl<E> Ch376Error<E> {
    /// Numeric code recorded in the session for this error, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Bus(_) | Self::ControllerNotFound => Some(ErrorCode::NoResponse),
            Self::Timeout => Some(ErrorCode::Timeout),
            Self::Overflow { .. } => Some(ErrorCode::Overflow),
            Self::LongFilename => Some(ErrorCode::LongFilename),
            Self::Status(status) => Some(ErrorCode::Chip(*status)),
            Self::NotAttached | Self::NoOpenFile => None,
        }
    }
}

/// Last error of the session, numerically compatible with the chip firmware codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    NoResponse,
    Timeout,
    Overflow,
    LongFilename,
    Chip(Status),
}

impl ErrorCode {
    pub const fn code(self) -> u8 {
        match self {
            Self::NoResponse => 0x01,
            Self::Timeout => 0x02,
            Self::Overflow => 0x03,
            Self::LongFilename => 0x04,
            Self::Chip(status) => status.0,
        }
    }
}
