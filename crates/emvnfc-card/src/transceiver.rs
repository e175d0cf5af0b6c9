//! Byte-level card transport contract
//!
//! The protocol driver only ever sees this trait: a half-duplex peer that
//! takes a command APDU and returns the full response including the
//! trailing status word. PC/SC, NFC or an in-memory script all fit behind
//! it.

use thiserror::Error;

/// Transport failure while exchanging with the card. This is the only
/// error that aborts a read session; every protocol-level problem is
/// handled locally by the driver.
#[derive(Debug, Error)]
pub enum CommunicationError {
    #[error("card transport failure: {0}")]
    Transport(String),

    #[error("card removed during the exchange")]
    CardRemoved,
}

/// A byte-in / byte-out exchange with the card.
pub trait Transceiver {
    /// Send a command APDU and return the complete response, ending in
    /// the 2-byte SW1/SW2 trailer.
    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, CommunicationError>;

    /// Whether the card is still reachable.
    fn is_connected(&self) -> bool;
}
