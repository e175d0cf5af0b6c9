//! APDU (Application Protocol Data Unit) command handling

/// Classified status word from a response trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sw {
    /// `9000`
    Success,
    /// `6285` - selected file is deactivated. Interac cards answer SELECT
    /// this way, so the driver treats it as success.
    SelectWarning,
    /// `6Cxx` - wrong Le; re-issue the command with `Le = xx`.
    WrongLength(u8),
    /// `61xx` - more data available through GET RESPONSE.
    MoreData(u8),
    /// Anything else.
    Other(u16),
}

/// APDU response containing data and status word
#[derive(Debug, Clone)]
pub struct ApduResponse {
    /// Response data (without status word)
    pub data: Vec<u8>,
    /// Status word SW1
    pub sw1: u8,
    /// Status word SW2
    pub sw2: u8,
}

impl ApduResponse {
    /// Split a raw response into payload and status word. Responses
    /// shorter than the 2-byte trailer are not valid APDUs.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() < 2 {
            return None;
        }
        Some(Self {
            data: raw[..raw.len() - 2].to_vec(),
            sw1: raw[raw.len() - 2],
            sw2: raw[raw.len() - 1],
        })
    }

    /// Classify the status word.
    pub fn sw(&self) -> Sw {
        match (self.sw1, self.sw2) {
            (0x90, 0x00) => Sw::Success,
            (0x62, 0x85) => Sw::SelectWarning,
            (0x6C, le) => Sw::WrongLength(le),
            (0x61, le) => Sw::MoreData(le),
            _ => Sw::Other(self.status_word()),
        }
    }

    /// Check if the response indicates success (`9000` or the tolerated
    /// `6285` warning).
    pub fn is_success(&self) -> bool {
        matches!(self.sw(), Sw::Success | Sw::SelectWarning)
    }

    /// Get the full status word as a 16-bit value
    pub fn status_word(&self) -> u16 {
        (u16::from(self.sw1) << 8) | u16::from(self.sw2)
    }

    /// Get status word as hex string (e.g., "9000")
    pub fn status_string(&self) -> String {
        format!("{:02X}{:02X}", self.sw1, self.sw2)
    }
}

/// APDU command builder
pub struct ApduCommand {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
    le: Option<u8>,
}

impl ApduCommand {
    /// Create a new APDU command
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// Set command data
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Set expected response length. `Le = 0` means "up to 256 bytes".
    pub fn le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Build the APDU command bytes
    pub fn build(&self) -> Vec<u8> {
        let mut apdu = vec![self.cla, self.ins, self.p1, self.p2];

        if !self.data.is_empty() {
            apdu.push(self.data.len() as u8);
            apdu.extend_from_slice(&self.data);
        }

        if let Some(le) = self.le {
            apdu.push(le);
        }

        apdu
    }
}

/// Command APDUs used by the EMV read session
pub mod commands {
    use super::ApduCommand;

    /// SELECT by DF name or AID
    pub fn select(name: &[u8]) -> ApduCommand {
        ApduCommand::new(0x00, 0xA4, 0x04, 0x00)
            .data(name.to_vec())
            .le(0x00)
    }

    /// READ RECORD within an SFI
    pub fn read_record(record: u8, sfi: u8) -> ApduCommand {
        let p2 = (sfi << 3) | 0x04;
        ApduCommand::new(0x00, 0xB2, record, p2).le(0x00)
    }

    /// GET PROCESSING OPTIONS; `field` is the `83 Lc ...` command template
    pub fn get_processing_options(field: Vec<u8>) -> ApduCommand {
        ApduCommand::new(0x80, 0xA8, 0x00, 0x00).data(field).le(0x00)
    }

    /// GET DATA for a 1 or 2 byte tag carried in P1/P2
    pub fn get_data(tag: u32) -> ApduCommand {
        ApduCommand::new(0x80, 0xCA, (tag >> 8) as u8, tag as u8).le(0x00)
    }

    /// GET RESPONSE after a `61xx` status. Contactless transports deliver
    /// full responses in one exchange, but contact readers may not.
    pub fn get_response(le: u8) -> ApduCommand {
        ApduCommand::new(0x00, 0xC0, 0x00, 0x00).le(le)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_from_bytes() {
        let resp = ApduResponse::from_bytes(&[0x01, 0x02, 0x90, 0x00]).unwrap();
        assert_eq!(resp.data, vec![0x01, 0x02]);
        assert_eq!(resp.sw1, 0x90);
        assert_eq!(resp.sw2, 0x00);
    }

    #[test]
    fn test_response_from_bytes_too_short() {
        assert!(ApduResponse::from_bytes(&[0x90]).is_none());
        assert!(ApduResponse::from_bytes(&[]).is_none());
    }

    #[test]
    fn test_sw_classification() {
        let sw = |sw1, sw2| {
            ApduResponse {
                data: vec![],
                sw1,
                sw2,
            }
            .sw()
        };
        assert_eq!(sw(0x90, 0x00), Sw::Success);
        assert_eq!(sw(0x62, 0x85), Sw::SelectWarning);
        assert_eq!(sw(0x6C, 0x1E), Sw::WrongLength(0x1E));
        assert_eq!(sw(0x61, 0x10), Sw::MoreData(0x10));
        assert_eq!(sw(0x6A, 0x82), Sw::Other(0x6A82));
    }

    #[test]
    fn test_is_success_accepts_select_warning() {
        let warn = ApduResponse {
            data: vec![],
            sw1: 0x62,
            sw2: 0x85,
        };
        assert!(warn.is_success());

        let failure = ApduResponse {
            data: vec![],
            sw1: 0x6A,
            sw2: 0x82,
        };
        assert!(!failure.is_success());
    }

    #[test]
    fn test_response_status_string() {
        let response = ApduResponse {
            data: vec![0x01, 0x02],
            sw1: 0x90,
            sw2: 0x00,
        };
        assert_eq!(response.status_string(), "9000");
        assert_eq!(response.status_word(), 0x9000);
    }

    #[test]
    fn test_command_header_only() {
        let cmd = ApduCommand::new(0x00, 0xA4, 0x04, 0x00);
        assert_eq!(cmd.build(), vec![0x00, 0xA4, 0x04, 0x00]);
    }

    #[test]
    fn test_command_with_data() {
        let cmd = ApduCommand::new(0x00, 0xA4, 0x04, 0x00).data(vec![0xA0, 0x00, 0x00, 0x00, 0x04]);
        assert_eq!(
            cmd.build(),
            vec![
                0x00, 0xA4, 0x04, 0x00, // Header
                0x05, // Lc = 5 bytes
                0xA0, 0x00, 0x00, 0x00, 0x04, // Data
            ]
        );
    }

    #[test]
    fn test_command_with_le_only() {
        let cmd = ApduCommand::new(0x00, 0xB2, 0x01, 0x0C).le(0x00);
        assert_eq!(cmd.build(), vec![0x00, 0xB2, 0x01, 0x0C, 0x00]);
    }

    #[test]
    fn test_command_with_data_and_le() {
        let cmd = ApduCommand::new(0x00, 0xA4, 0x04, 0x00)
            .data(vec![0xA0, 0x00, 0x00, 0x00, 0x04])
            .le(0x00);
        assert_eq!(
            cmd.build(),
            vec![
                0x00, 0xA4, 0x04, 0x00, // Header
                0x05, // Lc
                0xA0, 0x00, 0x00, 0x00, 0x04, // Data
                0x00, // Le
            ]
        );
    }

    #[test]
    fn test_commands_select() {
        let aid = [0xA0, 0x00, 0x00, 0x00, 0x04, 0x10, 0x10];
        assert_eq!(
            commands::select(&aid).build(),
            vec![
                0x00, 0xA4, 0x04, 0x00, // SELECT
                0x07, // Lc
                0xA0, 0x00, 0x00, 0x00, 0x04, 0x10, 0x10, // AID
                0x00, // Le
            ]
        );
    }

    #[test]
    fn test_commands_read_record() {
        // Record 1 of SFI 2: P2 = (2 << 3) | 0x04 = 0x14
        assert_eq!(
            commands::read_record(1, 2).build(),
            vec![0x00, 0xB2, 0x01, 0x14, 0x00]
        );
        // Record 3 of SFI 5: P2 = 0x2C
        assert_eq!(
            commands::read_record(3, 5).build(),
            vec![0x00, 0xB2, 0x03, 0x2C, 0x00]
        );
    }

    #[test]
    fn test_commands_read_record_le_override() {
        // The 6Cxx retry re-issues with the exact Le the card requested.
        assert_eq!(
            commands::read_record(1, 1).le(0x1E).build(),
            vec![0x00, 0xB2, 0x01, 0x0C, 0x1E]
        );
    }

    #[test]
    fn test_commands_get_processing_options() {
        assert_eq!(
            commands::get_processing_options(vec![0x83, 0x00]).build(),
            vec![0x80, 0xA8, 0x00, 0x00, 0x02, 0x83, 0x00, 0x00]
        );
    }

    #[test]
    fn test_commands_get_data() {
        assert_eq!(
            commands::get_data(0x9F36).build(),
            vec![0x80, 0xCA, 0x9F, 0x36, 0x00]
        );
        assert_eq!(
            commands::get_data(0x9F17).build(),
            vec![0x80, 0xCA, 0x9F, 0x17, 0x00]
        );
    }

    #[test]
    fn test_commands_get_response() {
        assert_eq!(
            commands::get_response(0x10).build(),
            vec![0x00, 0xC0, 0x00, 0x00, 0x10]
        );
    }
}
