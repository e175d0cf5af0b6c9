//! EMV read session driver
//!
//! Orchestrates one read session: select the payment environment, walk
//! the application directory, and for each application run SELECT / GET
//! PROCESSING OPTIONS / READ RECORD until the card's public data and
//! transaction log are extracted.
//!
//! The driver is deliberately tolerant: every protocol refusal is "try
//! the next thing", and only a transport failure aborts the session. The
//! returned [`Card`] always describes whatever could be read.

use emvnfc_common::{be_to_u32, tags, tlv};
use tracing::{debug, trace, warn};

use crate::apdu::{commands, ApduResponse};
use crate::model::{
    sort_by_priority, Afl, Application, Card, CardState, ReadingStep, TransactionRecord, UNKNOWN,
};
use crate::records;
use crate::scheme::{self, SchemeResolver};
use crate::terminal::{build_gpo_field, Terminal};
use crate::track;
use crate::transceiver::{CommunicationError, Transceiver};

/// Payment System Environment, contact interface.
const PSE: &[u8] = b"1PAY.SYS.DDF01";

/// Proximity Payment System Environment, contactless interface.
const PPSE: &[u8] = b"2PAY.SYS.DDF01";

/// Empirical offset found on amounts in VISA transaction logs.
const VISA_AMOUNT_OFFSET: i64 = 1_500_000_000;

/// Session configuration. Everything defaults to on.
#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    /// Select the PPSE rather than the PSE.
    pub contactless: bool,
    /// Extract the transaction history log.
    pub read_transactions: bool,
    /// Keep reading applications after the first one succeeds.
    pub read_all_aids: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            contactless: true,
            read_transactions: true,
            read_all_aids: true,
        }
    }
}

impl ReaderConfig {
    pub fn contactless(mut self, contactless: bool) -> Self {
        self.contactless = contactless;
        self
    }

    pub fn read_transactions(mut self, read_transactions: bool) -> Self {
        self.read_transactions = read_transactions;
        self
    }

    pub fn read_all_aids(mut self, read_all_aids: bool) -> Self {
        self.read_all_aids = read_all_aids;
        self
    }
}

/// EMV read session driver.
pub struct EmvReader<T, M, S> {
    transceiver: T,
    terminal: M,
    schemes: S,
    config: ReaderConfig,
    card: Card,
}

impl<T, M, S> EmvReader<T, M, S>
where
    T: Transceiver,
    M: Terminal,
    S: SchemeResolver,
{
    /// Create a driver with the default configuration.
    pub fn new(transceiver: T, terminal: M, schemes: S) -> Self {
        Self::with_config(transceiver, terminal, schemes, ReaderConfig::default())
    }

    pub fn with_config(transceiver: T, terminal: M, schemes: S, config: ReaderConfig) -> Self {
        Self {
            transceiver,
            terminal,
            schemes,
            config,
            card: Card::default(),
        }
    }

    /// Borrow the underlying transport, e.g. to check connectivity.
    pub fn transceiver_ref(&self) -> &T {
        &self.transceiver
    }

    /// Run one read session and return the populated card.
    ///
    /// Only transport failures surface as errors; a card nothing could be
    /// read from comes back with `state = Locked`.
    pub fn read_card(&mut self) -> Result<Card, CommunicationError> {
        self.card = Card::default();

        let raw = self.select_payment_environment()?;
        let succeeded = match ApduResponse::from_bytes(&raw) {
            Some(response) if response.is_success() => self.read_with_pse(&response.data)?,
            _ => {
                debug!(
                    "{} not found, probing known AIDs",
                    if self.config.contactless { "PPSE" } else { "PSE" }
                );
                self.read_with_aid()?
            }
        };

        if !succeeded {
            self.card.state = CardState::Locked;
        }
        Ok(std::mem::take(&mut self.card))
    }

    /// Select the PPSE or PSE directory.
    fn select_payment_environment(&mut self) -> Result<Vec<u8>, CommunicationError> {
        let name = if self.config.contactless { PPSE } else { PSE };
        debug!(
            environment = %String::from_utf8_lossy(name),
            "selecting payment environment"
        );
        self.transceiver.transceive(&commands::select(name).build())
    }

    /// Walk the applications advertised by the payment environment, in
    /// priority order. Returns true once any application yields a PAN.
    fn read_with_pse(&mut self, fci: &[u8]) -> Result<bool, CommunicationError> {
        let mut applications = self.parse_fci(fci)?;
        sort_by_priority(&mut applications);
        debug!(count = applications.len(), "applications found in directory");

        let mut succeeded = false;
        // Index of the application whose processing options are current.
        let mut current: Option<usize> = None;
        for index in 0..applications.len() {
            let extracted = self.extract_public_data(&mut applications[index])?;
            if extracted {
                // The card processes one application at a time: a later
                // GPO supersedes the earlier one.
                if let Some(previous) = current {
                    applications[previous].step = ReadingStep::Selected;
                }
                current = Some(index);
                if !succeeded {
                    succeeded = true;
                    if !self.config.read_all_aids {
                        break;
                    }
                }
            }
        }
        self.card.applications = applications;
        Ok(succeeded)
    }

    /// Decode the environment FCI into the application list: either walk
    /// the directory SFI it names, or take the `61` templates inline.
    fn parse_fci(&mut self, fci: &[u8]) -> Result<Vec<Application>, CommunicationError> {
        let mut applications = Vec::new();
        if let Some(sfi_value) = tlv::find(fci, &[tags::SFI]) {
            let sfi = be_to_u32(sfi_value) as u8;
            debug!(sfi, "directory SFI found in FCI");
            for payload in records::read_sfi_records(&mut self.transceiver, sfi)? {
                applications.extend(application_templates(&payload));
            }
        } else {
            debug!("FCI carries its application templates inline");
            applications.extend(application_templates(fci));
        }
        Ok(applications)
    }

    /// No payment environment: probe the known AIDs one by one. The first
    /// application that yields data becomes the card's only application.
    fn read_with_aid(&mut self) -> Result<bool, CommunicationError> {
        for (candidate, aid) in self.schemes.known_aids() {
            let mut application = Application {
                aid,
                label: Some(candidate.name().to_string()),
                ..Application::default()
            };
            if self.extract_public_data(&mut application)? {
                self.card.applications.clear();
                self.card.applications.push(application);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Read one application end to end: SELECT, GPO, records, counters.
    fn extract_public_data(
        &mut self,
        application: &mut Application,
    ) -> Result<bool, CommunicationError> {
        debug!(aid = %hex::encode_upper(&application.aid), "selecting application");
        let raw = self
            .transceiver
            .transceive(&commands::select(&application.aid).build())?;
        let Some(response) = ApduResponse::from_bytes(&raw) else {
            return Ok(false);
        };
        if !response.is_success() {
            trace!(status = %response.status_string(), "application refused selection");
            return Ok(false);
        }
        application.step = ReadingStep::Selected;

        if !self.parse_selected_application(&response.data, application)? {
            // Nothing extracted; the application stays merely selected.
            application.step = ReadingStep::Selected;
            return Ok(false);
        }

        // The FCI is authoritative for the AID and label.
        if let Some(df_name) = tlv::find(&response.data, &[tags::DF_NAME]) {
            application.aid = df_name.to_vec();
        }
        if let Some(label) = extract_application_label(&response.data) {
            application.label = Some(label);
        }

        let aid_hex = hex::encode_upper(&application.aid);
        let resolved = scheme::resolve(&self.schemes, &aid_hex, &self.card);
        self.card.scheme = resolved;
        debug!(
            aid = %aid_hex,
            scheme = %self.card.scheme,
            label = application.label.as_deref().unwrap_or("-"),
            "application read"
        );

        application.left_pin_try = self.get_data_counter(tags::PIN_TRY_COUNTER)?;
        application.transaction_counter = self.get_data_counter(tags::APP_TRANSACTION_COUNTER)?;
        self.card.state = CardState::Active;
        Ok(true)
    }

    /// Drive GPO and record reading for a selected application. Returns
    /// true once a PAN is on the card.
    fn parse_selected_application(
        &mut self,
        select_response: &[u8],
        application: &mut Application,
    ) -> Result<bool, CommunicationError> {
        let log_entry =
            tlv::find(select_response, &[tags::LOG_ENTRY, tags::VISA_LOG_ENTRY]).map(<[u8]>::to_vec);
        let pdol = tlv::find(select_response, &[tags::PDOL]).map(<[u8]>::to_vec);
        extract_bank_data(&mut self.card, select_response);

        let mut gpo = self.get_processing_options(pdol.as_deref())?;
        if gpo.is_none() && pdol.is_some() {
            debug!("GPO refused, retrying with an empty PDOL");
            gpo = self.get_processing_options(None)?;
        }
        let gpo = match gpo {
            Some(payload) => payload,
            // Last resort: some cards expose their data in EF 1, record 1.
            None => match records::read_record(&mut self.transceiver, 1, 1)? {
                Some(payload) => payload,
                None => return Ok(false),
            },
        };
        application.step = ReadingStep::GpoPerformed;

        if self.extract_commons_card_data(&gpo)? {
            application.transactions = self.extract_transactions(log_entry.as_deref())?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Issue GET PROCESSING OPTIONS; `None` when the card refuses.
    fn get_processing_options(
        &mut self,
        pdol: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>, CommunicationError> {
        let field = build_gpo_field(pdol, &self.terminal);
        trace!(field = %hex::encode_upper(&field), "GET PROCESSING OPTIONS");
        let raw = self
            .transceiver
            .transceive(&commands::get_processing_options(field).build())?;
        Ok(ApduResponse::from_bytes(&raw)
            .filter(ApduResponse::is_success)
            .map(|response| response.data))
    }

    /// Pull PAN, expiry and cardholder name out of the GPO response or
    /// the records its AFL points at. Returns true as soon as a record
    /// yields a PAN.
    fn extract_commons_card_data(&mut self, gpo: &[u8]) -> Result<bool, CommunicationError> {
        let afl_data;
        if let Some(template) = tlv::find(gpo, &[tags::RESPONSE_MESSAGE_TEMPLATE_1]) {
            // Format 1 is flat: the 2-byte AIP, then the AFL.
            afl_data = Some(template.get(2..).unwrap_or_default().to_vec());
        } else if track::extract_track_data(&mut self.card, gpo) {
            // Some cards already answer GPO with track data.
            track::extract_cardholder_name(&mut self.card, gpo);
            return Ok(true);
        } else {
            afl_data = tlv::find(gpo, &[tags::AFL]).map(<[u8]>::to_vec);
        }

        let Some(afl_data) = afl_data else {
            return Ok(false);
        };
        let entries = Afl::extract(&afl_data);
        trace!(?entries, "walking application file locator");

        let card = &mut self.card;
        records::walk_afl(&mut self.transceiver, &entries, |payload| {
            track::extract_cardholder_name(card, payload);
            track::extract_track_data(card, payload)
        })
    }

    /// Read the transaction history the Log Entry points at.
    fn extract_transactions(
        &mut self,
        log_entry: Option<&[u8]>,
    ) -> Result<Vec<TransactionRecord>, CommunicationError> {
        let mut transactions = Vec::new();
        let Some(pointer) = log_entry else {
            return Ok(transactions);
        };
        if !self.config.read_transactions || pointer.len() < 2 {
            return Ok(transactions);
        }

        let format = self.get_log_format()?;
        if format.is_empty() {
            return Ok(transactions);
        }

        let (sfi, count) = (pointer[0], pointer[1]);
        debug!(sfi, count, "reading transaction log");
        for record in 1..=count {
            let Some(payload) = records::read_record(&mut self.transceiver, record, sfi)? else {
                // No more log entries.
                break;
            };
            match TransactionRecord::parse(&payload, &format) {
                Some(mut transaction) => {
                    if let Some(amount) = transaction.amount {
                        let amount = if amount >= VISA_AMOUNT_OFFSET {
                            amount - VISA_AMOUNT_OFFSET
                        } else {
                            amount
                        };
                        // Null and one-cent entries are padding, not
                        // transactions.
                        if amount <= 1 {
                            continue;
                        }
                        transaction.amount = Some(amount);
                    }
                    transactions.push(transaction);
                }
                None => warn!(record, "log record does not match the log format, dropped"),
            }
        }
        Ok(transactions)
    }

    /// Fetch and parse the Log Format DOL (tag 9F4F).
    fn get_log_format(&mut self) -> Result<Vec<tlv::TagAndLength>, CommunicationError> {
        let raw = self
            .transceiver
            .transceive(&commands::get_data(tags::LOG_FORMAT).build())?;
        match ApduResponse::from_bytes(&raw) {
            Some(response) if response.is_success() => Ok(tlv::find(
                &response.data,
                &[tags::LOG_FORMAT],
            )
            .map(tlv::parse_tag_and_length)
            .unwrap_or_default()),
            _ => {
                warn!("card exposes no log format");
                Ok(Vec::new())
            }
        }
    }

    /// GET DATA for a counter tag (PIN tries, ATC); [`UNKNOWN`] when the
    /// card does not answer.
    fn get_data_counter(&mut self, tag: u32) -> Result<i32, CommunicationError> {
        let raw = self.transceiver.transceive(&commands::get_data(tag).build())?;
        if let Some(response) = ApduResponse::from_bytes(&raw) {
            if response.is_success() {
                if let Some(value) = tlv::find(&response.data, &[tag]) {
                    return Ok(be_to_u32(value) as i32);
                }
            }
        }
        Ok(UNKNOWN)
    }
}

/// Build applications from the `61` templates found anywhere in `data`.
/// Templates without an AID are ignored.
fn application_templates(data: &[u8]) -> Vec<Application> {
    tlv::find_all(data, tags::APPLICATION_TEMPLATE)
        .into_iter()
        .filter_map(|template| {
            let aid = tlv::find(template, &[tags::AID])?;
            Some(Application {
                aid: aid.to_vec(),
                label: tlv::find(template, &[tags::APPLICATION_LABEL])
                    .map(|value| String::from_utf8_lossy(value).into_owned()),
                priority: tlv::find(template, &[tags::APPLICATION_PRIORITY])
                    .and_then(|value| value.first().copied()),
                ..Application::default()
            })
        })
        .collect()
}

/// Preferred name (9F12) beats the plain label (50).
fn extract_application_label(data: &[u8]) -> Option<String> {
    tlv::find(data, &[tags::APPLICATION_PREFERRED_NAME])
        .or_else(|| tlv::find(data, &[tags::APPLICATION_LABEL]))
        .map(|value| String::from_utf8_lossy(value).into_owned())
}

/// BIC and IBAN, when the issuer put them in the FCI.
fn extract_bank_data(card: &mut Card, data: &[u8]) {
    if let Some(bic) = tlv::find(data, &[tags::BANK_IDENTIFIER_CODE]) {
        card.bic = Some(String::from_utf8_lossy(bic).into_owned());
    }
    if let Some(iban) = tlv::find(data, &[tags::IBAN]) {
        card.iban = Some(String::from_utf8_lossy(iban).into_owned());
    }
}
