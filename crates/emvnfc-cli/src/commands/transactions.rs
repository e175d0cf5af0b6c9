//! Transaction history output

use emvnfc_card::ReaderConfig;

use crate::formatters;

pub fn run(pcsc_card: &pcsc::Card, config: ReaderConfig) {
    let mut reader = super::session(pcsc_card, config.read_transactions(true));
    let card = match reader.read_card() {
        Ok(card) => card,
        Err(err) => {
            eprintln!("Failed to read card: {}", err);
            return;
        }
    };

    let mut any = false;
    for app in &card.applications {
        if app.transactions.is_empty() {
            continue;
        }
        any = true;
        println!(
            "Application {} ({} transaction(s)):\n",
            hex::encode_upper(&app.aid),
            app.transactions.len()
        );
        for tx in &app.transactions {
            let date = tx
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "????-??-??".to_string());
            let time = tx
                .time
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default();
            let amount = tx
                .amount
                .map(|a| formatters::format_amount(a, &tx.currency))
                .unwrap_or_else(|| format!("? {}", tx.currency));
            println!("  {} {}  {}", date, time, amount);
        }
        println!();
    }

    if !any {
        println!("No transaction log could be read from this card");
    }
}
