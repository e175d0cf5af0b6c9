//! Terminal-side data objects
//!
//! Cards hand the terminal a PDOL describing the values they expect with
//! GET PROCESSING OPTIONS. The [`Terminal`] trait supplies those values;
//! [`DefaultTerminal`] answers with conservative defaults that make any
//! card disclose its public data without starting a real transaction.

use chrono::Local;
use emvnfc_common::{tags, tlv, TagAndLength};
use rand::RngCore;

/// Source of terminal values for DOL construction.
pub trait Terminal {
    /// Produce the value for one DOL entry, already fitted to the
    /// requested length.
    fn construct_value(&self, request: &TagAndLength) -> Vec<u8>;
}

/// Default terminal profile: zero amount, qualifiers announcing plain EMV
/// mode support, current date, random unpredictable number.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTerminal;

impl Terminal for DefaultTerminal {
    fn construct_value(&self, request: &TagAndLength) -> Vec<u8> {
        let value = match request.tag {
            tags::TERMINAL_TRANSACTION_QUALIFIERS => vec![0xF0, 0x00, 0x00, 0x00],
            tags::AMOUNT_AUTHORISED | tags::AMOUNT_OTHER => vec![0x00; 6],
            tags::TERMINAL_COUNTRY_CODE => vec![0x08, 0x40],
            tags::TRANSACTION_CURRENCY_CODE => vec![0x08, 0x40],
            tags::TVR => vec![0x00; 5],
            tags::TRANSACTION_DATE => transaction_date(),
            tags::TRANSACTION_TYPE => vec![0x00],
            tags::TERMINAL_TYPE => vec![0x22],
            tags::UNPREDICTABLE_NUMBER => {
                let mut bytes = vec![0u8; 4];
                rand::thread_rng().fill_bytes(&mut bytes);
                bytes
            }
            // Tags this terminal knows nothing about are filled with
            // zeroes of the requested length.
            _ => Vec::new(),
        };
        fit(value, request.length, is_numeric(request.tag))
    }
}

/// Today as packed BCD YYMMDD.
fn transaction_date() -> Vec<u8> {
    hex::decode(Local::now().format("%y%m%d").to_string()).unwrap_or_default()
}

fn is_numeric(tag: u32) -> bool {
    matches!(
        tag,
        tags::AMOUNT_AUTHORISED
            | tags::AMOUNT_OTHER
            | tags::TERMINAL_COUNTRY_CODE
            | tags::TRANSACTION_CURRENCY_CODE
            | tags::TRANSACTION_TYPE
    )
}

/// Fit a value to the length the card declared: numeric values keep their
/// least significant end, byte strings keep their start.
fn fit(mut value: Vec<u8>, length: usize, numeric: bool) -> Vec<u8> {
    use std::cmp::Ordering;

    match value.len().cmp(&length) {
        Ordering::Equal => value,
        Ordering::Less => {
            if numeric {
                let mut padded = vec![0u8; length - value.len()];
                padded.append(&mut value);
                padded
            } else {
                value.resize(length, 0x00);
                value
            }
        }
        Ordering::Greater => {
            if numeric {
                value.split_off(value.len() - length)
            } else {
                value.truncate(length);
                value
            }
        }
    }
}

/// Build the GPO command field from a PDOL: the `83` command template
/// wrapping the concatenated terminal values. An absent or empty PDOL
/// yields `83 00`.
pub fn build_gpo_field(pdol: Option<&[u8]>, terminal: &dyn Terminal) -> Vec<u8> {
    let requests = pdol.map(tlv::parse_tag_and_length).unwrap_or_default();
    let total: usize = requests.iter().map(|r| r.length).sum();

    let mut field = tlv::encode_tag(tags::COMMAND_TEMPLATE);
    field.extend(tlv::encode_length(total));
    for request in &requests {
        field.extend(terminal.construct_value(request));
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(tag: u32, length: usize) -> TagAndLength {
        TagAndLength { tag, length }
    }

    #[test]
    fn test_ttq_default() {
        let value = DefaultTerminal.construct_value(&request(0x9F66, 4));
        assert_eq!(value, vec![0xF0, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_amount_default_is_zero() {
        let value = DefaultTerminal.construct_value(&request(0x9F02, 6));
        assert_eq!(value, vec![0x00; 6]);
    }

    #[test]
    fn test_numeric_left_padding() {
        // Country code requested wider than its default
        let value = DefaultTerminal.construct_value(&request(0x9F1A, 3));
        assert_eq!(value, vec![0x00, 0x08, 0x40]);
    }

    #[test]
    fn test_numeric_left_truncation() {
        let value = DefaultTerminal.construct_value(&request(0x9F1A, 1));
        assert_eq!(value, vec![0x40]);
    }

    #[test]
    fn test_byte_string_right_padding() {
        let value = DefaultTerminal.construct_value(&request(0x9F66, 6));
        assert_eq!(value, vec![0xF0, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_byte_string_right_truncation() {
        let value = DefaultTerminal.construct_value(&request(0x9F66, 2));
        assert_eq!(value, vec![0xF0, 0x00]);
    }

    #[test]
    fn test_unknown_tag_yields_zeroes() {
        let value = DefaultTerminal.construct_value(&request(0x9F7A, 3));
        assert_eq!(value, vec![0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_unpredictable_number_length() {
        let value = DefaultTerminal.construct_value(&request(0x9F37, 4));
        assert_eq!(value.len(), 4);
        let wide = DefaultTerminal.construct_value(&request(0x9F37, 8));
        assert_eq!(wide.len(), 8);
    }

    #[test]
    fn test_transaction_date_is_bcd() {
        let value = DefaultTerminal.construct_value(&request(0x9A, 3));
        assert_eq!(value.len(), 3);
        for byte in value {
            assert!(byte >> 4 <= 9 && byte & 0x0F <= 9);
        }
    }

    #[test]
    fn test_gpo_field_empty_pdol() {
        assert_eq!(build_gpo_field(None, &DefaultTerminal), vec![0x83, 0x00]);
        assert_eq!(build_gpo_field(Some(&[]), &DefaultTerminal), vec![0x83, 0x00]);
    }

    #[test]
    fn test_gpo_field_single_entry() {
        // PDOL asking for TTQ, 4 bytes
        let pdol = [0x9F, 0x66, 0x04];
        assert_eq!(
            build_gpo_field(Some(&pdol), &DefaultTerminal),
            vec![0x83, 0x04, 0xF0, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_gpo_field_concatenates_in_pdol_order() {
        // TTQ then country then currency
        let pdol = [0x9F, 0x66, 0x04, 0x9F, 0x1A, 0x02, 0x5F, 0x2A, 0x02];
        assert_eq!(
            build_gpo_field(Some(&pdol), &DefaultTerminal),
            vec![0x83, 0x08, 0xF0, 0x00, 0x00, 0x00, 0x08, 0x40, 0x08, 0x40]
        );
    }
}
