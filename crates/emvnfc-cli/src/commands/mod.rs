pub mod dump;
pub mod info;
pub mod transactions;

use emvnfc_card::{DefaultTerminal, EmvReader, KnownSchemes, PcscTransceiver, ReaderConfig};

/// Build a read-session driver over a connected PC/SC card.
pub(crate) fn session(
    card: &pcsc::Card,
    config: ReaderConfig,
) -> EmvReader<PcscTransceiver<'_>, DefaultTerminal, KnownSchemes> {
    EmvReader::with_config(
        PcscTransceiver::new(card),
        DefaultTerminal,
        KnownSchemes,
        config,
    )
}
