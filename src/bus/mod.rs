pub mod engine;
pub mod transport;

pub use engine::{CommandEngine, EngineFault};
#[cfg(feature = "embassy-clock")]
pub use transport::EmbassyClock;
pub use transport::{Ch376Transport, Clock, SpiTransport, TransportError};
