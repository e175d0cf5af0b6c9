//! EMV NFC Card - EMV protocol driver
//!
//! This crate drives one EMV read session over any byte-level transport:
//! it discovers the card's payment applications, selects one, obtains its
//! public data (PAN, expiry, cardholder name, scheme, counters) and
//! extracts the transaction history log.
//!
//! No authentication is attempted: the driver reads what the card
//! volunteers and nothing more.

pub mod apdu;
pub mod model;
pub mod parser;
pub mod reader;
pub mod records;
pub mod scheme;
pub mod terminal;
pub mod track;
pub mod transceiver;

pub use model::{Afl, Application, Card, CardState, ReadingStep, TransactionRecord, UNKNOWN};
pub use parser::{EmvReader, ReaderConfig};
pub use reader::{CardReader, PcscTransceiver};
pub use scheme::{CardScheme, KnownSchemes, SchemeResolver};
pub use terminal::{DefaultTerminal, Terminal};
pub use transceiver::{CommunicationError, Transceiver};
