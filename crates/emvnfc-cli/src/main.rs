use clap::{Parser, Subcommand};
use emvnfc_card::{CardReader, ReaderConfig};
use tracing_subscriber::EnvFilter;

mod commands;
mod formatters;

#[derive(Parser)]
#[command(name = "emvnfc")]
#[command(about = "EMV card reader - read public payment card data over PC/SC")]
#[command(version)]
struct Args {
    /// Use the contact PSE instead of the contactless PPSE
    #[arg(long)]
    contact: bool,

    /// Skip the transaction history log
    #[arg(long)]
    no_transactions: bool,

    /// Stop at the first application that yields card data
    #[arg(long)]
    first_aid_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the card and print a summary of its public data
    Info,
    /// Print the card's transaction history
    Transactions,
    /// Dump every APDU exchange and its decoded TLV content
    Dump,
}

fn main() {
    // Initialize tracing subscriber with environment-based filtering
    // Set RUST_LOG=debug for detailed logs, RUST_LOG=trace for very verbose
    // Default: info level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = ReaderConfig::default()
        .contactless(!args.contact)
        .read_transactions(!args.no_transactions)
        .read_all_aids(!args.first_aid_only);

    let reader = match CardReader::new() {
        Ok(reader) => reader,
        Err(err) => {
            eprintln!("Failed to establish PC/SC context: {}", err);
            return;
        }
    };

    let (card, reader_name) = match reader.connect_first() {
        Ok((card, name)) => (card, name),
        Err(err) => {
            eprintln!("Failed to connect to card: {}", err);
            eprintln!("Please ensure a card is present on the reader");
            return;
        }
    };
    println!("Reader: {}\n", reader_name);

    match args.command {
        Command::Info => commands::info::run(&card, config),
        Command::Transactions => commands::transactions::run(&card, config),
        Command::Dump => commands::dump::run(&card, config),
    }
}
