//! Card summary output

use emvnfc_card::{Card, CardState, ReaderConfig, ReadingStep};

use crate::formatters;

pub fn run(pcsc_card: &pcsc::Card, config: ReaderConfig) {
    let mut reader = super::session(pcsc_card, config);
    match reader.read_card() {
        Ok(card) => print_card(&card),
        Err(err) => eprintln!("Failed to read card: {}", err),
    }
}

fn print_card(card: &Card) {
    println!("=== Card ===\n");
    println!("State:  {}", state_label(card.state));
    println!("Scheme: {}", card.scheme);

    if let Some(ref pan) = card.pan {
        println!("PAN:    {}", formatters::format_pan(pan));
    }
    if let Some(ref expiry) = card.expiry {
        println!("Expiry: {}", formatters::format_expiry(expiry));
    }
    match (&card.holder_lastname, &card.holder_firstname) {
        (Some(last), Some(first)) => println!("Holder: {} {}", first, last),
        (Some(last), None) => println!("Holder: {}", last),
        _ => {}
    }
    if let Some(ref bic) = card.bic {
        println!("BIC:    {}", bic);
    }
    if let Some(ref iban) = card.iban {
        println!("IBAN:   {}", iban);
    }

    println!("\n=== Applications ===\n");
    if card.applications.is_empty() {
        println!("No applications discovered");
        return;
    }
    for (i, app) in card.applications.iter().enumerate() {
        println!("Application {}:", i + 1);
        println!("  AID: {}", hex::encode_upper(&app.aid));
        if let Some(ref label) = app.label {
            println!("  Label: {}", label);
        }
        if let Some(priority) = app.priority {
            println!("  Priority: {} (lower = higher priority)", priority);
        }
        println!("  Read step: {}", step_label(app.step));
        if app.step == ReadingStep::GpoPerformed {
            println!("  PIN tries left: {}", formatters::format_counter(app.left_pin_try));
            println!(
                "  Transaction counter: {}",
                formatters::format_counter(app.transaction_counter)
            );
            println!("  Logged transactions: {}", app.transactions.len());
        }
        println!();
    }
}

fn state_label(state: CardState) -> &'static str {
    match state {
        CardState::Active => "active",
        CardState::Locked => "locked",
        CardState::Unknown => "unknown",
    }
}

fn step_label(step: ReadingStep) -> &'static str {
    match step {
        ReadingStep::NotSelected => "not selected",
        ReadingStep::Selected => "selected",
        ReadingStep::GpoPerformed => "processing options performed",
    }
}
