//! EMV tag registry
//!
//! Tag values referenced by the protocol driver, plus a name table for
//! diagnostics. Tags are plain integers so the decoder and match tables
//! stay dense.

// File control information
pub const FCI_TEMPLATE: u32 = 0x6F;
pub const DF_NAME: u32 = 0x84;
pub const FCI_PROPRIETARY_TEMPLATE: u32 = 0xA5;
pub const FCI_ISSUER_DISCRETIONARY_DATA: u32 = 0xBF0C;
pub const SFI: u32 = 0x88;

// Application directory
pub const APPLICATION_TEMPLATE: u32 = 0x61;
pub const AID: u32 = 0x4F;
pub const APPLICATION_LABEL: u32 = 0x50;
pub const APPLICATION_PREFERRED_NAME: u32 = 0x9F12;
pub const APPLICATION_PRIORITY: u32 = 0x87;

// Processing options
pub const PDOL: u32 = 0x9F38;
pub const COMMAND_TEMPLATE: u32 = 0x83;
pub const RESPONSE_MESSAGE_TEMPLATE_1: u32 = 0x80;
pub const RESPONSE_MESSAGE_TEMPLATE_2: u32 = 0x77;
pub const AIP: u32 = 0x82;
pub const AFL: u32 = 0x94;
pub const RECORD_TEMPLATE: u32 = 0x70;

// Cardholder data
pub const PAN: u32 = 0x5A;
pub const CARDHOLDER_NAME: u32 = 0x5F20;
pub const EXPIRATION_DATE: u32 = 0x5F24;
pub const ISSUER_COUNTRY_CODE: u32 = 0x5F28;
pub const LANGUAGE_PREFERENCE: u32 = 0x5F2D;
pub const TRACK1_DATA: u32 = 0x56;
pub const TRACK2_EQUIVALENT_DATA: u32 = 0x57;
pub const TRACK2_DATA: u32 = 0x9F6B;
pub const BANK_IDENTIFIER_CODE: u32 = 0x5F54;
pub const IBAN: u32 = 0x5F53;

// Counters
pub const PIN_TRY_COUNTER: u32 = 0x9F17;
pub const APP_TRANSACTION_COUNTER: u32 = 0x9F36;

// Transaction log
pub const LOG_ENTRY: u32 = 0x9F4D;
pub const VISA_LOG_ENTRY: u32 = 0xDF60;
pub const LOG_FORMAT: u32 = 0x9F4F;

// Issuer data
pub const ISSUER_APPLICATION_DATA: u32 = 0x9F10;
pub const APPLICATION_CRYPTOGRAM: u32 = 0x9F26;
pub const CRYPTOGRAM_INFORMATION_DATA: u32 = 0x9F27;

// Terminal data objects requested through DOLs
pub const AMOUNT_AUTHORISED: u32 = 0x9F02;
pub const AMOUNT_OTHER: u32 = 0x9F03;
pub const TERMINAL_COUNTRY_CODE: u32 = 0x9F1A;
pub const TVR: u32 = 0x95;
pub const TRANSACTION_CURRENCY_CODE: u32 = 0x5F2A;
pub const TRANSACTION_DATE: u32 = 0x9A;
pub const TRANSACTION_TIME: u32 = 0x9F21;
pub const TRANSACTION_TYPE: u32 = 0x9C;
pub const UNPREDICTABLE_NUMBER: u32 = 0x9F37;
pub const TERMINAL_TRANSACTION_QUALIFIERS: u32 = 0x9F66;
pub const TERMINAL_TYPE: u32 = 0x9F35;

/// Human-readable name for a tag, for logs and the dump output.
pub fn tag_name(tag: u32) -> &'static str {
    match tag {
        FCI_TEMPLATE => "FCI Template",
        DF_NAME => "Dedicated File Name",
        FCI_PROPRIETARY_TEMPLATE => "FCI Proprietary Template",
        FCI_ISSUER_DISCRETIONARY_DATA => "FCI Issuer Discretionary Data",
        SFI => "Short File Identifier",
        APPLICATION_TEMPLATE => "Application Template",
        AID => "Application Identifier (AID)",
        APPLICATION_LABEL => "Application Label",
        APPLICATION_PREFERRED_NAME => "Application Preferred Name",
        APPLICATION_PRIORITY => "Application Priority Indicator",
        PDOL => "Processing Options Data Object List (PDOL)",
        COMMAND_TEMPLATE => "Command Template",
        RESPONSE_MESSAGE_TEMPLATE_1 => "Response Message Template Format 1",
        RESPONSE_MESSAGE_TEMPLATE_2 => "Response Message Template Format 2",
        AIP => "Application Interchange Profile",
        AFL => "Application File Locator (AFL)",
        RECORD_TEMPLATE => "Record Template",
        PAN => "Application PAN",
        CARDHOLDER_NAME => "Cardholder Name",
        EXPIRATION_DATE => "Application Expiration Date",
        ISSUER_COUNTRY_CODE => "Issuer Country Code",
        LANGUAGE_PREFERENCE => "Language Preference",
        TRACK1_DATA => "Track 1 Data",
        TRACK2_EQUIVALENT_DATA => "Track 2 Equivalent Data",
        TRACK2_DATA => "Track 2 Data",
        BANK_IDENTIFIER_CODE => "Bank Identifier Code (BIC)",
        IBAN => "International Bank Account Number (IBAN)",
        PIN_TRY_COUNTER => "PIN Try Counter",
        APP_TRANSACTION_COUNTER => "Application Transaction Counter (ATC)",
        LOG_ENTRY => "Log Entry",
        VISA_LOG_ENTRY => "Log Entry (Visa)",
        LOG_FORMAT => "Log Format",
        ISSUER_APPLICATION_DATA => "Issuer Application Data",
        APPLICATION_CRYPTOGRAM => "Application Cryptogram",
        CRYPTOGRAM_INFORMATION_DATA => "Cryptogram Information Data",
        AMOUNT_AUTHORISED => "Amount, Authorised",
        AMOUNT_OTHER => "Amount, Other",
        TERMINAL_COUNTRY_CODE => "Terminal Country Code",
        TVR => "Terminal Verification Results",
        TRANSACTION_CURRENCY_CODE => "Transaction Currency Code",
        TRANSACTION_DATE => "Transaction Date",
        TRANSACTION_TIME => "Transaction Time",
        TRANSACTION_TYPE => "Transaction Type",
        UNPREDICTABLE_NUMBER => "Unpredictable Number",
        TERMINAL_TRANSACTION_QUALIFIERS => "Terminal Transaction Qualifiers",
        TERMINAL_TYPE => "Terminal Type",
        _ => "Unknown Tag",
    }
}
