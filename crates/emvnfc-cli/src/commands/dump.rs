//! Raw APDU exchange dump
//!
//! Runs a normal read session through a recording transport, then prints
//! every command/response pair with the response decoded as a TLV tree.

use emvnfc_card::apdu::ApduResponse;
use emvnfc_card::{
    CommunicationError, DefaultTerminal, EmvReader, KnownSchemes, PcscTransceiver, ReaderConfig,
    Transceiver,
};
use emvnfc_common::tlv;

/// Transport wrapper that keeps a copy of every exchange.
struct Recording<T> {
    inner: T,
    exchanges: Vec<(Vec<u8>, Vec<u8>)>,
}

impl<T> Recording<T> {
    fn new(inner: T) -> Self {
        Self {
            inner,
            exchanges: Vec::new(),
        }
    }
}

impl<T: Transceiver> Transceiver for Recording<T> {
    fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, CommunicationError> {
        let response = self.inner.transceive(command)?;
        self.exchanges.push((command.to_vec(), response.clone()));
        Ok(response)
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }
}

pub fn run(pcsc_card: &pcsc::Card, config: ReaderConfig) {
    let transport = Recording::new(PcscTransceiver::new(pcsc_card));
    let mut reader = EmvReader::with_config(transport, DefaultTerminal, KnownSchemes, config);

    if let Err(err) = reader.read_card() {
        eprintln!("Session aborted: {}", err);
        // Whatever was exchanged before the failure is still worth dumping.
    }

    for (i, (command, response)) in reader.transceiver_ref().exchanges.iter().enumerate() {
        println!("--- Exchange {} ---", i + 1);
        println!("> {}", hex::encode_upper(command));
        println!("< {}", hex::encode_upper(response));

        if let Some(parsed) = ApduResponse::from_bytes(response) {
            if parsed.is_success() && !parsed.data.is_empty() {
                print!("{}", indent(&tlv::dump(&parsed.data)));
            }
        }
        println!();
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}\n", line))
        .collect()
}
