use crate::{
    config::{ANSWER_TIMEOUT_MS, BYTE_SETTLE_US},
    protocol::{command::*, Status},
};

use super::transport::Ch376Transport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineFault<E> {
    Bus(E),
    /// The interrupt line did not assert within the answer timeout.
    Timeout,
}

/// Command/response engine: frames opcodes and fixed payloads onto the bus and
/// turns interrupt-line completions into status bytes.
///
/// The engine never classifies statuses and never retries; both belong to the
/// session.
pub struct CommandEngine<T> {
    transport: T,
    answer_timeout_ms: u32,
    settle_us: u32,
}

impl<T: Ch376Transport> CommandEngine<T> {
    pub fn new(transport: T) -> Self {
        Self::with_timing(transport, ANSWER_TIMEOUT_MS, BYTE_SETTLE_US)
    }

    pub fn with_timing(transport: T, answer_timeout_ms: u32, settle_us: u32) -> Self {
        Self {
            transport,
            answer_timeout_ms,
            settle_us,
        }
    }

    pub fn release(self) -> T {
        self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn now_ms(&mut self) -> u32 {
        self.transport.now_ms()
    }

    pub fn delay_ms(&mut self, ms: u32) {
        self.transport.delay_us(ms.saturating_mul(1000));
    }

    pub fn delay_us(&mut self, us: u32) {
        self.transport.delay_us(us);
    }

    /// Command with inputs only; chip select is released afterwards.
    pub fn execute(&mut self, opcode: u8, inputs: &[u8]) -> Result<(), EngineFault<T::Error>> {
        self.begin_frame(opcode, inputs)?;
        self.end_transaction()?;
        log::trace!("ch376: cmd 0x{:02X} in={:02X?}", opcode, inputs);
        Ok(())
    }

    /// Command answering with one immediate output byte; chip select is released.
    pub fn execute_immediate(
        &mut self,
        opcode: u8,
        inputs: &[u8],
    ) -> Result<u8, EngineFault<T::Error>> {
        self.begin_frame(opcode, inputs)?;
        let output = self.read_byte()?;
        self.end_transaction()?;
        log::trace!(
            "ch376: cmd 0x{:02X} in={:02X?} out=0x{:02X}",
            opcode,
            inputs,
            output
        );
        Ok(output)
    }

    /// Data-streaming command: chip select stays asserted so the caller can
    /// move payload bytes, then calls [`Self::end_transaction`].
    pub fn begin_stream(&mut self, opcode: u8, inputs: &[u8]) -> Result<(), EngineFault<T::Error>> {
        self.begin_frame(opcode, inputs)
    }

    /// Streaming command whose first output byte is a payload length
    /// (`RD_USB_DATA0`, `WR_REQ_DATA`); chip select stays asserted.
    pub fn begin_stream_with_length(&mut self, opcode: u8) -> Result<u8, EngineFault<T::Error>> {
        self.begin_frame(opcode, &[])?;
        let declared = self.read_byte()?;
        log::trace!("ch376: stream 0x{:02X} len={}", opcode, declared);
        Ok(declared)
    }

    pub fn stream_write(&mut self, data: &[u8]) -> Result<(), EngineFault<T::Error>> {
        for &byte in data {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    pub fn stream_read(&mut self, out: &mut [u8]) -> Result<(), EngineFault<T::Error>> {
        for slot in out {
            *slot = self.read_byte()?;
        }
        Ok(())
    }

    pub fn end_transaction(&mut self) -> Result<(), EngineFault<T::Error>> {
        self.transport.select(false).map_err(EngineFault::Bus)
    }

    /// Command completing through the interrupt line; returns the chip status.
    pub fn execute_with_signal(
        &mut self,
        opcode: u8,
        inputs: &[u8],
    ) -> Result<Status, EngineFault<T::Error>> {
        self.begin_frame(opcode, inputs)?;
        self.end_transaction()?;
        let status = self.wait_interrupt();
        match status {
            Ok(status) => log::trace!("ch376: cmd 0x{:02X} -> {}", opcode, status),
            Err(EngineFault::Timeout) => log::trace!("ch376: cmd 0x{:02X} -> timeout", opcode),
            Err(EngineFault::Bus(_)) => {}
        }
        status
    }

    /// Polls the interrupt line and fetches the pending status with `GET_STATUS`.
    pub fn wait_interrupt(&mut self) -> Result<Status, EngineFault<T::Error>> {
        let started = self.transport.now_ms();
        loop {
            if self
                .transport
                .interrupt_asserted()
                .map_err(EngineFault::Bus)?
            {
                break;
            }
            if self.transport.now_ms().wrapping_sub(started) > self.answer_timeout_ms {
                return Err(EngineFault::Timeout);
            }
        }
        self.get_status()
    }

    pub fn interrupt_pending(&mut self) -> Result<bool, EngineFault<T::Error>> {
        self.transport.interrupt_asserted().map_err(EngineFault::Bus)
    }

    /// Reads and acknowledges the pending interrupt status.
    pub fn get_status(&mut self) -> Result<Status, EngineFault<T::Error>> {
        self.execute_immediate(CMD01_GET_STATUS, &[]).map(Status)
    }

    fn begin_frame(&mut self, opcode: u8, inputs: &[u8]) -> Result<(), EngineFault<T::Error>> {
        self.transport.delay_us(self.settle_us);
        self.transport.select(true).map_err(EngineFault::Bus)?;
        self.write_byte(opcode)?;
        for &byte in inputs {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), EngineFault<T::Error>> {
        self.transport.delay_us(self.settle_us);
        self.transport.exchange(byte).map_err(EngineFault::Bus)?;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, EngineFault<T::Error>> {
        self.transport.delay_us(self.settle_us);
        self.transport.exchange(0x00).map_err(EngineFault::Bus)
    }
}
