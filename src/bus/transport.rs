use embedded_hal::{
    delay::DelayNs,
    digital::{self, InputPin, OutputPin},
    spi::{self, SpiBus},
};

/// Everything the driver needs from the board: a byte-exchange bus with chip
/// select, the active-low interrupt line, a millisecond clock and a delay.
pub trait Ch376Transport {
    type Error: core::fmt::Debug;

    /// Asserts (`true`) or releases (`false`) chip select.
    fn select(&mut self, active: bool) -> Result<(), Self::Error>;

    /// Full-duplex exchange of one byte.
    fn exchange(&mut self, byte: u8) -> Result<u8, Self::Error>;

    /// `true` while the chip holds its interrupt line asserted (low).
    fn interrupt_asserted(&mut self) -> Result<bool, Self::Error>;

    fn now_ms(&mut self) -> u32;

    fn delay_us(&mut self, us: u32);
}

/// Monotonic millisecond source, wrapping at `u32::MAX`.
pub trait Clock {
    fn now_ms(&mut self) -> u32;
}

#[cfg(feature = "embassy-clock")]
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy-clock")]
impl Clock for EmbassyClock {
    fn now_ms(&mut self) -> u32 {
        embassy_time::Instant::now().as_millis() as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportError {
    Spi(spi::ErrorKind),
    Pin(digital::ErrorKind),
}

/// [`Ch376Transport`] over `embedded-hal` peripherals.
///
/// Chip select is a plain output pin because streaming commands keep the
/// chip selected across several driver calls, which a `SpiDevice`
/// transaction cannot express.
pub struct SpiTransport<SPI, CS, INT, D, C> {
    spi: SPI,
    cs: CS,
    int: INT,
    delay: D,
    clock: C,
}

impl<SPI, CS, INT, D, C> SpiTransport<SPI, CS, INT, D, C>
where
    SPI: SpiBus,
    CS: OutputPin,
    INT: InputPin,
    D: DelayNs,
    C: Clock,
{
    pub fn new(spi: SPI, mut cs: CS, int: INT, delay: D, clock: C) -> Self {
        let _ = cs.set_high();
        Self {
            spi,
            cs,
            int,
            delay,
            clock,
        }
    }

    pub fn release(self) -> (SPI, CS, INT, D, C) {
        (self.spi, self.cs, self.int, self.delay, self.clock)
    }
}

impl<SPI, CS, INT, D, C> Ch376Transport for SpiTransport<SPI, CS, INT, D, C>
where
    SPI: SpiBus,
    CS: OutputPin,
    INT: InputPin,
    D: DelayNs,
    C: Clock,
{
    type Error = TransportError;

    fn select(&mut self, active: bool) -> Result<(), Self::Error> {
        use digital::Error as _;
        use spi::Error as _;

        if active {
            self.cs
                .set_low()
                .map_err(|err| TransportError::Pin(err.kind()))
        } else {
            self.spi
                .flush()
                .map_err(|err| TransportError::Spi(err.kind()))?;
            self.cs
                .set_high()
                .map_err(|err| TransportError::Pin(err.kind()))
        }
    }

    fn exchange(&mut self, byte: u8) -> Result<u8, Self::Error> {
        use spi::Error as _;

        let mut frame = [byte];
        self.spi
            .transfer_in_place(&mut frame)
            .map_err(|err| TransportError::Spi(err.kind()))?;
        Ok(frame[0])
    }

    fn interrupt_asserted(&mut self) -> Result<bool, Self::Error> {
        use digital::Error as _;

        self.int
            .is_low()
            .map_err(|err| TransportError::Pin(err.kind()))
    }

    fn now_ms(&mut self) -> u32 {
        self.clock.now_ms()
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}
