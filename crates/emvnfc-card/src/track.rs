//! Track data extraction
//!
//! Record payloads carry the PAN and expiry either as Track 2 equivalent
//! data (tag 57 / 9F6B), as magnetic Track 1 (tag 56), or as the discrete
//! PAN (5A) and expiration date (5F24) objects. All three shapes end up
//! in the same card fields.

use emvnfc_common::{tags, tlv};
use tracing::trace;

use crate::model::Card;

/// Separator between last and first name in tag 5F20 and Track 1.
const NAME_SEPARATOR: char = '/';

/// Try to pull PAN, expiry and service code out of `data`. Returns true
/// once the card has a PAN.
pub fn extract_track_data(card: &mut Card, data: &[u8]) -> bool {
    if let Some(track2) = tlv::find(data, &[tags::TRACK2_EQUIVALENT_DATA, tags::TRACK2_DATA]) {
        if parse_track2(card, track2) {
            return true;
        }
    }
    if let Some(track1) = tlv::find(data, &[tags::TRACK1_DATA]) {
        if parse_track1(card, track1) {
            return true;
        }
    }
    parse_discrete_objects(card, data)
}

/// Track 2 equivalent data: PAN, `D`, YYMM expiry, service code,
/// discretionary data, F-padded to whole bytes.
fn parse_track2(card: &mut Card, value: &[u8]) -> bool {
    let digits = hex::encode_upper(value);
    let digits = digits.trim_end_matches('F');

    let Some((pan, rest)) = digits.split_once('D') else {
        return false;
    };
    if pan.is_empty() || pan.len() > 19 || !pan.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if rest.len() < 7 || !rest.as_bytes()[..7].iter().all(u8::is_ascii_digit) {
        return false;
    }

    trace!(pan_len = pan.len(), "track 2 equivalent data parsed");
    card.pan = Some(pan.to_string());
    card.expiry = Some(rest[..4].to_string());
    card.service_code = Some(rest[4..7].to_string());
    true
}

/// Track 1: `%B<pan>^LAST/FIRST^YYMM<service>...` in ASCII.
fn parse_track1(card: &mut Card, value: &[u8]) -> bool {
    let text = String::from_utf8_lossy(value);
    let Some(rest) = text.strip_prefix("%B").or_else(|| text.strip_prefix('B')) else {
        return false;
    };

    let mut fields = rest.split('^');
    let Some(pan) = fields.next() else {
        return false;
    };
    let pan = pan.trim();
    if pan.is_empty() || pan.len() > 19 || !pan.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    trace!(pan_len = pan.len(), "track 1 data parsed");
    card.pan = Some(pan.to_string());

    if let Some(name) = fields.next() {
        set_holder_name(card, name);
    }
    if let Some(tail) = fields.next() {
        let tail = tail.trim();
        if tail.len() >= 4 && tail.as_bytes()[..4].iter().all(u8::is_ascii_digit) {
            card.expiry = Some(tail[..4].to_string());
        }
        if tail.len() >= 7 && tail.as_bytes()[4..7].iter().all(u8::is_ascii_digit) {
            card.service_code = Some(tail[4..7].to_string());
        }
    }
    true
}

/// Cards without track data still expose the PAN (5A) and expiration
/// date (5F24) as plain objects.
fn parse_discrete_objects(card: &mut Card, data: &[u8]) -> bool {
    let Some(pan_bytes) = tlv::find(data, &[tags::PAN]) else {
        return false;
    };
    let digits = hex::encode_upper(pan_bytes);
    let digits = digits.trim_end_matches('F');
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    card.pan = Some(digits.to_string());

    if let Some(date) = tlv::find(data, &[tags::EXPIRATION_DATE]) {
        // 5F24 is BCD YYMMDD; keep the YYMM part, like track data.
        let date_digits = hex::encode_upper(date);
        if date_digits.len() >= 4 && date_digits.as_bytes()[..4].iter().all(u8::is_ascii_digit) {
            card.expiry = Some(date_digits[..4].to_string());
        }
    }
    true
}

/// Extract the cardholder name (tag 5F20) if present.
pub fn extract_cardholder_name(card: &mut Card, data: &[u8]) {
    if let Some(value) = tlv::find(data, &[tags::CARDHOLDER_NAME]) {
        let name = String::from_utf8_lossy(value);
        set_holder_name(card, &name);
    }
}

/// Split `LAST/FIRST` and store the trimmed parts; empty parts stay
/// unset.
fn set_holder_name(card: &mut Card, raw: &str) {
    let mut parts = raw.trim().splitn(2, NAME_SEPARATOR);
    if let Some(last) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
        card.holder_lastname = Some(last.to_string());
    }
    if let Some(first) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
        card.holder_firstname = Some(first.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track2_equivalent() {
        // 4111111111111111 D 2512 201 ... F padding
        let mut data = vec![0x57, 0x13];
        data.extend(hex::decode("4111111111111111D25122010000000000000F").unwrap());
        let mut card = Card::default();
        assert!(extract_track_data(&mut card, &data));
        assert_eq!(card.pan.as_deref(), Some("4111111111111111"));
        assert_eq!(card.expiry.as_deref(), Some("2512"));
        assert_eq!(card.service_code.as_deref(), Some("201"));
    }

    #[test]
    fn test_track2_inside_record_template() {
        let mut inner = vec![0x57, 0x13];
        inner.extend(hex::decode("4111111111111111D25122010000000000000F").unwrap());
        let mut data = vec![0x70, inner.len() as u8];
        data.extend(inner);
        let mut card = Card::default();
        assert!(extract_track_data(&mut card, &data));
        assert_eq!(card.pan.as_deref(), Some("4111111111111111"));
    }

    #[test]
    fn test_track2_without_separator_rejected() {
        let mut data = vec![0x57, 0x08];
        data.extend(hex::decode("4111111111111111").unwrap());
        let mut card = Card::default();
        assert!(!extract_track_data(&mut card, &data));
        assert!(card.pan.is_none());
    }

    #[test]
    fn test_track1() {
        let text = b"%B5500000000000004^DOE/JOHN^2707101000000000";
        let mut data = vec![0x56, text.len() as u8];
        data.extend_from_slice(text);
        let mut card = Card::default();
        assert!(extract_track_data(&mut card, &data));
        assert_eq!(card.pan.as_deref(), Some("5500000000000004"));
        assert_eq!(card.holder_lastname.as_deref(), Some("DOE"));
        assert_eq!(card.holder_firstname.as_deref(), Some("JOHN"));
        assert_eq!(card.expiry.as_deref(), Some("2707"));
        assert_eq!(card.service_code.as_deref(), Some("101"));
    }

    #[test]
    fn test_discrete_pan_and_expiry() {
        // 5A PAN padded with F, 5F24 expiration date
        let data = hex::decode("5A0845000000000000625F2403270731").unwrap();
        let mut card = Card::default();
        assert!(extract_track_data(&mut card, &data));
        assert_eq!(card.pan.as_deref(), Some("4500000000000062"));
        assert_eq!(card.expiry.as_deref(), Some("2707"));
    }

    #[test]
    fn test_no_card_data_present() {
        let data = [0x50, 0x04, 0x56, 0x49, 0x53, 0x41];
        let mut card = Card::default();
        assert!(!extract_track_data(&mut card, &data));
    }

    #[test]
    fn test_cardholder_name_split() {
        let data = [0x5F, 0x20, 0x08, b'D', b'O', b'E', b'/', b'J', b'O', b'H', b'N'];
        let mut card = Card::default();
        extract_cardholder_name(&mut card, &data);
        assert_eq!(card.holder_lastname.as_deref(), Some("DOE"));
        assert_eq!(card.holder_firstname.as_deref(), Some("JOHN"));
    }

    #[test]
    fn test_cardholder_name_without_separator() {
        let data = [0x5F, 0x20, 0x09, b'V', b'I', b'S', b'A', b' ', b'T', b'E', b'S', b'T'];
        let mut card = Card::default();
        extract_cardholder_name(&mut card, &data);
        assert_eq!(card.holder_lastname.as_deref(), Some("VISA TEST"));
        assert!(card.holder_firstname.is_none());
    }

    #[test]
    fn test_cardholder_name_blank_is_ignored() {
        let data = [0x5F, 0x20, 0x03, b' ', b' ', b'/'];
        let mut card = Card::default();
        extract_cardholder_name(&mut card, &data);
        assert!(card.holder_lastname.is_none());
        assert!(card.holder_firstname.is_none());
    }
}
