//! Record walking
//!
//! The two READ RECORD iteration patterns of an EMV session: the linear
//! directory scan over a PSE SFI, and the range scan driven by the
//! Application File Locator. Both honor the `6Cxx` wrong-length protocol
//! with a single re-issue.

use tracing::trace;

use crate::apdu::{commands, ApduResponse, Sw};
use crate::model::Afl;
use crate::transceiver::{CommunicationError, Transceiver};

/// Highest record probed when scanning a directory SFI.
pub const MAX_SFI_RECORDS: u8 = 16;

/// Read one record. On `6Cxx` the command is re-issued once with the Le
/// the card asked for. Returns the payload on success (`9000`/`6285`),
/// `None` on any other status.
pub fn read_record<T: Transceiver + ?Sized>(
    transceiver: &mut T,
    record: u8,
    sfi: u8,
) -> Result<Option<Vec<u8>>, CommunicationError> {
    let raw = transceiver.transceive(&commands::read_record(record, sfi).build())?;
    let Some(mut response) = ApduResponse::from_bytes(&raw) else {
        return Ok(None);
    };

    if let Sw::WrongLength(le) = response.sw() {
        trace!(record, sfi, le, "re-issuing READ RECORD with corrected Le");
        let raw = transceiver.transceive(&commands::read_record(record, sfi).le(le).build())?;
        response = match ApduResponse::from_bytes(&raw) {
            Some(r) => r,
            None => return Ok(None),
        };
    }

    if response.is_success() {
        Ok(Some(response.data))
    } else {
        trace!(record, sfi, status = %response.status_string(), "READ RECORD refused");
        Ok(None)
    }
}

/// Directory scan: read records 1..=16 of `sfi` until the card reports
/// there are no more.
pub fn read_sfi_records<T: Transceiver + ?Sized>(
    transceiver: &mut T,
    sfi: u8,
) -> Result<Vec<Vec<u8>>, CommunicationError> {
    let mut payloads = Vec::new();
    for record in 1..=MAX_SFI_RECORDS {
        match read_record(transceiver, record, sfi)? {
            Some(payload) => payloads.push(payload),
            // First refusal ends the directory.
            None => break,
        }
    }
    Ok(payloads)
}

/// AFL range scan. Each readable record is handed to `visit`; a `true`
/// return stops the walk and is reported to the caller. Unreadable
/// records are skipped, not fatal.
pub fn walk_afl<T, F>(
    transceiver: &mut T,
    entries: &[Afl],
    mut visit: F,
) -> Result<bool, CommunicationError>
where
    T: Transceiver + ?Sized,
    F: FnMut(&[u8]) -> bool,
{
    for entry in entries {
        for record in entry.first_record..=entry.last_record {
            match read_record(transceiver, record, entry.sfi)? {
                Some(payload) => {
                    if visit(&payload) {
                        return Ok(true);
                    }
                }
                None => continue,
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned responses and keeps the commands it saw.
    struct Canned {
        responses: VecDeque<Vec<u8>>,
        sent: Vec<Vec<u8>>,
    }

    impl Canned {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|r| hex::decode(r).unwrap())
                    .collect(),
                sent: Vec::new(),
            }
        }
    }

    impl Transceiver for Canned {
        fn transceive(&mut self, command: &[u8]) -> Result<Vec<u8>, CommunicationError> {
            self.sent.push(command.to_vec());
            self.responses
                .pop_front()
                .ok_or_else(|| CommunicationError::Transport("script exhausted".into()))
        }

        fn is_connected(&self) -> bool {
            !self.responses.is_empty()
        }
    }

    #[test]
    fn test_read_record_success() {
        let mut card = Canned::new(&["700457130102339000"]);
        let payload = read_record(&mut card, 1, 1).unwrap().unwrap();
        assert_eq!(payload, hex::decode("70045713010233").unwrap());
        assert_eq!(card.sent, vec![hex::decode("00B2010C00").unwrap()]);
    }

    #[test]
    fn test_read_record_wrong_length_retry() {
        let mut card = Canned::new(&["6C04", "DEADBEEF9000"]);
        let payload = read_record(&mut card, 2, 1).unwrap().unwrap();
        assert_eq!(payload, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        // Exactly one follow-up, carrying the Le the card requested.
        assert_eq!(
            card.sent,
            vec![
                hex::decode("00B2020C00").unwrap(),
                hex::decode("00B2020C04").unwrap(),
            ]
        );
    }

    #[test]
    fn test_read_record_failure_is_none() {
        let mut card = Canned::new(&["6A83"]);
        assert!(read_record(&mut card, 1, 1).unwrap().is_none());
    }

    #[test]
    fn test_read_sfi_records_stops_at_first_refusal() {
        let mut card = Canned::new(&["01019000", "02019000", "6A83"]);
        let payloads = read_sfi_records(&mut card, 1).unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(card.sent.len(), 3);
    }

    #[test]
    fn test_read_sfi_records_caps_at_sixteen() {
        let responses: Vec<String> = (0..16).map(|_| "019000".to_string()).collect();
        let refs: Vec<&str> = responses.iter().map(String::as_str).collect();
        let mut card = Canned::new(&refs);
        let payloads = read_sfi_records(&mut card, 1).unwrap();
        assert_eq!(payloads.len(), 16);
    }

    #[test]
    fn test_walk_afl_skips_unreadable_records() {
        let entries = [Afl {
            sfi: 1,
            first_record: 1,
            last_record: 3,
            offline_auth_records: 0,
        }];
        let mut card = Canned::new(&["6A83", "AA9000", "BB9000"]);
        let mut seen = Vec::new();
        let found = walk_afl(&mut card, &entries, |payload| {
            seen.push(payload.to_vec());
            false
        })
        .unwrap();
        assert!(!found);
        assert_eq!(seen, vec![vec![0xAA], vec![0xBB]]);
    }

    #[test]
    fn test_walk_afl_stops_when_visitor_is_satisfied() {
        let entries = [Afl {
            sfi: 1,
            first_record: 1,
            last_record: 3,
            offline_auth_records: 0,
        }];
        let mut card = Canned::new(&["AA9000", "BB9000", "CC9000"]);
        let found = walk_afl(&mut card, &entries, |payload| payload == [0xBB]).unwrap();
        assert!(found);
        // The third record is never requested.
        assert_eq!(card.sent.len(), 2);
    }

    #[test]
    fn test_walk_afl_transport_error_propagates() {
        let entries = [Afl {
            sfi: 1,
            first_record: 1,
            last_record: 2,
            offline_auth_records: 0,
        }];
        let mut card = Canned::new(&[]);
        assert!(walk_afl(&mut card, &entries, |_| false).is_err());
    }
}
