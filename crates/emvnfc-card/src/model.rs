//! Card data model
//!
//! The aggregate populated during one read session. All mutation happens
//! inside the driver's call stack; the caller receives the finished
//! [`Card`] by value.

use chrono::{NaiveDate, NaiveTime};
use emvnfc_common::{bcd_to_u64, be_to_u32, tags, TagAndLength};

use crate::scheme::CardScheme;

/// Sentinel for counters the card refused to disclose.
pub const UNKNOWN: i32 = -1;

/// Outcome of a read session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardState {
    #[default]
    Unknown,
    /// At least one application yielded a PAN.
    Active,
    /// No application could be read.
    Locked,
}

/// How far an application got during the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingStep {
    #[default]
    NotSelected,
    Selected,
    GpoPerformed,
}

/// Public data read from an EMV card.
#[derive(Debug, Clone, Default)]
pub struct Card {
    pub state: CardState,
    pub scheme: CardScheme,
    pub pan: Option<String>,
    /// Expiry as the four YYMM digits carried on track data.
    pub expiry: Option<String>,
    pub holder_lastname: Option<String>,
    pub holder_firstname: Option<String>,
    pub service_code: Option<String>,
    pub bic: Option<String>,
    pub iban: Option<String>,
    pub applications: Vec<Application>,
}

/// One payment application discovered on the card.
#[derive(Debug, Clone)]
pub struct Application {
    /// 5-16 bytes once populated.
    pub aid: Vec<u8>,
    pub label: Option<String>,
    pub priority: Option<u8>,
    pub step: ReadingStep,
    pub left_pin_try: i32,
    pub transaction_counter: i32,
    pub transactions: Vec<TransactionRecord>,
}

impl Default for Application {
    fn default() -> Self {
        Self {
            aid: Vec::new(),
            label: None,
            priority: None,
            step: ReadingStep::NotSelected,
            left_pin_try: UNKNOWN,
            transaction_counter: UNKNOWN,
            transactions: Vec::new(),
        }
    }
}

/// Sort applications by ascending priority. Applications without a
/// priority indicator come last; insertion order breaks ties.
pub fn sort_by_priority(applications: &mut [Application]) {
    applications.sort_by_key(|app| app.priority.map_or(u16::MAX, u16::from));
}

/// One Application File Locator entry, decoded from a 4-byte group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Afl {
    pub sfi: u8,
    pub first_record: u8,
    pub last_record: u8,
    pub offline_auth_records: u8,
}

impl Afl {
    /// Decode an AFL byte string; trailing bytes that do not fill a
    /// 4-byte group are ignored.
    pub fn extract(data: &[u8]) -> Vec<Afl> {
        data.chunks_exact(4)
            .map(|group| Afl {
                sfi: group[0] >> 3,
                first_record: group[1],
                last_record: group[2],
                offline_auth_records: group[3],
            })
            .collect()
    }
}

/// One entry of the card's transaction log.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Amount in minor units; absent when the log format does not carry
    /// an amount field.
    pub amount: Option<i64>,
    /// ISO 4217 alpha code, `XXX` when the card gave none we recognize.
    pub currency: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub transaction_type: Option<u8>,
    pub terminal_country: Option<u16>,
    /// Application Transaction Counter captured in the log entry.
    pub counter: Option<u32>,
}

impl TransactionRecord {
    /// Slice a log record according to the card's Log Format DOL.
    ///
    /// Returns `None` when the record is shorter than the format declares
    /// or a declared field does not decode; the caller drops such records
    /// and keeps iterating.
    pub fn parse(payload: &[u8], format: &[TagAndLength]) -> Option<Self> {
        let mut record = TransactionRecord {
            amount: None,
            currency: "XXX".to_string(),
            date: None,
            time: None,
            transaction_type: None,
            terminal_country: None,
            counter: None,
        };

        let mut pos = 0usize;
        for entry in format {
            let field = payload.get(pos..pos + entry.length)?;
            pos += entry.length;

            match entry.tag {
                tags::AMOUNT_AUTHORISED => {
                    record.amount = Some(i64::try_from(bcd_to_u64(field)?).ok()?);
                }
                tags::TRANSACTION_CURRENCY_CODE => {
                    let code = be_to_u32(field) as u16;
                    record.currency = currency_alpha(code).unwrap_or("XXX").to_string();
                }
                tags::TRANSACTION_DATE => {
                    record.date = Some(parse_bcd_date(field)?);
                }
                tags::TRANSACTION_TIME => {
                    record.time = Some(parse_bcd_time(field)?);
                }
                tags::TRANSACTION_TYPE => {
                    record.transaction_type = field.first().copied();
                }
                tags::TERMINAL_COUNTRY_CODE => {
                    record.terminal_country = Some(be_to_u32(field) as u16);
                }
                tags::APP_TRANSACTION_COUNTER => {
                    record.counter = Some(be_to_u32(field));
                }
                // Cryptograms and issuer data carried in the log are not
                // surfaced; their bytes are consumed above.
                _ => {}
            }
        }
        Some(record)
    }
}

fn parse_bcd_date(field: &[u8]) -> Option<NaiveDate> {
    let digits = bcd_digits(field, 6)?;
    let year = 2000 + digits[..2].parse::<i32>().ok()?;
    let month = digits[2..4].parse::<u32>().ok()?;
    let day = digits[4..6].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_bcd_time(field: &[u8]) -> Option<NaiveTime> {
    let digits = bcd_digits(field, 6)?;
    let hour = digits[..2].parse::<u32>().ok()?;
    let minute = digits[2..4].parse::<u32>().ok()?;
    let second = digits[4..6].parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn bcd_digits(field: &[u8], expected: usize) -> Option<String> {
    let digits = hex::encode(field);
    if digits.len() != expected || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

/// ISO 4217 numeric to alpha code, for the currencies cards actually
/// report.
pub fn currency_alpha(code: u16) -> Option<&'static str> {
    match code {
        36 => Some("AUD"),
        124 => Some("CAD"),
        156 => Some("CNY"),
        208 => Some("DKK"),
        344 => Some("HKD"),
        356 => Some("INR"),
        392 => Some("JPY"),
        398 => Some("KZT"),
        410 => Some("KRW"),
        484 => Some("MXN"),
        554 => Some("NZD"),
        578 => Some("NOK"),
        643 => Some("RUB"),
        682 => Some("SAR"),
        702 => Some("SGD"),
        710 => Some("ZAR"),
        752 => Some("SEK"),
        756 => Some("CHF"),
        764 => Some("THB"),
        784 => Some("AED"),
        826 => Some("GBP"),
        840 => Some("USD"),
        901 => Some("TWD"),
        949 => Some("TRY"),
        978 => Some("EUR"),
        985 => Some("PLN"),
        986 => Some("BRL"),
        _ => None,
    }
}
