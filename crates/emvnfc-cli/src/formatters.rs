//! Field formatters for human-readable output

use emvnfc_card::model::UNKNOWN;

/// Group a PAN into blocks of four digits.
pub fn format_pan(pan: &str) -> String {
    pan.as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn the YYMM digits carried on track data into `MM/YY`.
pub fn format_expiry(expiry: &str) -> String {
    if expiry.len() == 4 {
        format!("{}/{}", &expiry[2..4], &expiry[..2])
    } else {
        expiry.to_string()
    }
}

/// Render a minor-unit amount with its currency code.
pub fn format_amount(minor_units: i64, currency: &str) -> String {
    format!("{}.{:02} {}", minor_units / 100, (minor_units % 100).abs(), currency)
}

/// Render a counter, `unknown` for the -1 sentinel.
pub fn format_counter(counter: i32) -> String {
    if counter == UNKNOWN {
        "unknown".to_string()
    } else {
        counter.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pan() {
        assert_eq!(format_pan("4111111111111111"), "4111 1111 1111 1111");
        assert_eq!(format_pan("340000000000009"), "3400 0000 0000 009");
    }

    #[test]
    fn test_format_expiry() {
        assert_eq!(format_expiry("2512"), "12/25");
        assert_eq!(format_expiry("271"), "271");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234, "EUR"), "12.34 EUR");
        assert_eq!(format_amount(100, "USD"), "1.00 USD");
        assert_eq!(format_amount(5, "XXX"), "0.05 XXX");
    }

    #[test]
    fn test_format_counter() {
        assert_eq!(format_counter(3), "3");
        assert_eq!(format_counter(-1), "unknown");
    }
}
