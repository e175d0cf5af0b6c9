//! Card scheme identification
//!
//! Maps AIDs and PAN prefixes to payment schemes. The driver consumes the
//! [`SchemeResolver`] trait, so the tables can be swapped out; the
//! [`KnownSchemes`] implementation covers the schemes seen in the wild.

use crate::model::Card;

/// Payment card scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardScheme {
    Visa,
    Mastercard,
    Amex,
    /// Cartes Bancaires, the French interbank scheme. CB cards are
    /// co-badged, so the real scheme is re-resolved from the PAN.
    Cb,
    Link,
    Jcb,
    Dankort,
    Discover,
    Interac,
    UnionPay,
    #[default]
    Unknown,
}

impl CardScheme {
    pub fn name(&self) -> &'static str {
        match self {
            CardScheme::Visa => "VISA",
            CardScheme::Mastercard => "MasterCard",
            CardScheme::Amex => "American Express",
            CardScheme::Cb => "CB",
            CardScheme::Link => "LINK",
            CardScheme::Jcb => "JCB",
            CardScheme::Dankort => "Dankort",
            CardScheme::Discover => "Discover",
            CardScheme::Interac => "Interac",
            CardScheme::UnionPay => "UnionPay",
            CardScheme::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for CardScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Scheme lookup tables, injected into the driver at construction.
pub trait SchemeResolver {
    /// Resolve a scheme from a full AID, upper-case hex.
    fn scheme_by_aid(&self, aid_hex: &str) -> Option<CardScheme>;

    /// Resolve a scheme from a PAN prefix (BIN).
    fn scheme_by_pan(&self, pan: &str) -> Option<CardScheme>;

    /// AIDs to probe when the card exposes no payment environment
    /// directory, in probing order.
    fn known_aids(&self) -> Vec<(CardScheme, Vec<u8>)>;
}

/// Registered application provider identifiers (RID + usual extensions).
const AID_PREFIXES: &[(&str, CardScheme)] = &[
    ("A000000003", CardScheme::Visa),
    ("A000000004", CardScheme::Mastercard),
    ("A000000005", CardScheme::Mastercard), // Maestro UK
    ("A000000025", CardScheme::Amex),
    ("A000000029", CardScheme::Link),
    ("A000000042", CardScheme::Cb),
    ("A000000065", CardScheme::Jcb),
    ("A000000121", CardScheme::Dankort),
    ("A000000152", CardScheme::Discover),
    ("A000000277", CardScheme::Interac),
    ("A000000333", CardScheme::UnionPay),
];

/// Full AIDs probed during the fallback when no (P)PSE is present.
const FALLBACK_AIDS: &[(CardScheme, &[u8])] = &[
    (CardScheme::Visa, &[0xA0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10]),
    (CardScheme::Visa, &[0xA0, 0x00, 0x00, 0x00, 0x03, 0x20, 0x10]), // Electron
    (CardScheme::Mastercard, &[0xA0, 0x00, 0x00, 0x00, 0x04, 0x10, 0x10]),
    (CardScheme::Mastercard, &[0xA0, 0x00, 0x00, 0x00, 0x04, 0x30, 0x60]), // Maestro
    (CardScheme::Amex, &[0xA0, 0x00, 0x00, 0x00, 0x25, 0x01]),
    (CardScheme::Cb, &[0xA0, 0x00, 0x00, 0x00, 0x42, 0x10, 0x10]),
    (CardScheme::Jcb, &[0xA0, 0x00, 0x00, 0x00, 0x65, 0x10, 0x10]),
    (CardScheme::Discover, &[0xA0, 0x00, 0x00, 0x01, 0x52, 0x30, 0x10]),
    (CardScheme::UnionPay, &[0xA0, 0x00, 0x00, 0x03, 0x33, 0x01, 0x01, 0x01]),
];

/// Built-in scheme tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownSchemes;

impl SchemeResolver for KnownSchemes {
    fn scheme_by_aid(&self, aid_hex: &str) -> Option<CardScheme> {
        let aid = aid_hex.to_ascii_uppercase();
        AID_PREFIXES
            .iter()
            .find(|(prefix, _)| aid.starts_with(prefix))
            .map(|&(_, scheme)| scheme)
    }

    fn scheme_by_pan(&self, pan: &str) -> Option<CardScheme> {
        let pan = pan.trim();
        if pan.is_empty() || !pan.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let leading = |n: usize| pan.get(..n).and_then(|s| s.parse::<u32>().ok());

        if pan.starts_with('4') {
            return Some(CardScheme::Visa);
        }
        if pan.starts_with("5019") {
            return Some(CardScheme::Dankort);
        }
        if matches!(leading(2), Some(51..=55)) || matches!(leading(4), Some(2221..=2720)) {
            return Some(CardScheme::Mastercard);
        }
        if pan.starts_with("34") || pan.starts_with("37") {
            return Some(CardScheme::Amex);
        }
        if pan.starts_with("35") {
            return Some(CardScheme::Jcb);
        }
        if pan.starts_with("6011")
            || pan.starts_with("65")
            || matches!(leading(3), Some(644..=649))
        {
            return Some(CardScheme::Discover);
        }
        if pan.starts_with("62") {
            return Some(CardScheme::UnionPay);
        }
        None
    }

    fn known_aids(&self) -> Vec<(CardScheme, Vec<u8>)> {
        FALLBACK_AIDS
            .iter()
            .map(|&(scheme, aid)| (scheme, aid.to_vec()))
            .collect()
    }
}

/// Resolve the scheme for a card: AID table first, then the PAN BIN when
/// the AID only says "CB" (French cards are co-badged).
pub fn resolve(resolver: &impl SchemeResolver, aid_hex: &str, card: &Card) -> CardScheme {
    let mut scheme = resolver.scheme_by_aid(aid_hex);
    if scheme == Some(CardScheme::Cb) {
        if let Some(by_pan) = card.pan.as_deref().and_then(|pan| resolver.scheme_by_pan(pan)) {
            scheme = Some(by_pan);
        }
    }
    scheme.unwrap_or_default()
}
