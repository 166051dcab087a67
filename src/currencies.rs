//! Static currency lookup table: code → display name, plus the priority subset
//! shown on the dashboard quick-view.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Quick-view codes, in display order.
pub const PRIORITY_CODES: [&str; 8] = ["USD", "EUR", "GBP", "JPY", "CNY", "GHS", "NGN", "AUD"];

/// Converter dropdown entries, in display order.
pub const CURRENCIES: &[(&str, &str)] = &[
    ("USD", "US Dollar"),
    ("EUR", "Euro"),
    ("GBP", "British Pound"),
    ("JPY", "Japanese Yen"),
    ("CNY", "Chinese Yuan"),
    ("AUD", "Australian Dollar"),
    ("CAD", "Canadian Dollar"),
    ("CHF", "Swiss Franc"),
    ("INR", "Indian Rupee"),
    ("GHS", "Ghanaian Cedi"),
    ("NGN", "Nigerian Naira"),
    ("ZAR", "South African Rand"),
    ("EGP", "Egyptian Pound"),
    ("KES", "Kenyan Shilling"),
    ("UGX", "Ugandan Shilling"),
    ("TZS", "Tanzanian Shilling"),
    ("RUB", "Russian Ruble"),
    ("BRL", "Brazilian Real"),
    ("MXN", "Mexican Peso"),
    ("SAR", "Saudi Riyal"),
    ("AED", "UAE Dirham"),
    ("SGD", "Singapore Dollar"),
    ("MYR", "Malaysian Ringgit"),
    ("THB", "Thai Baht"),
    ("KRW", "South Korean Won"),
    ("IDR", "Indonesian Rupiah"),
    ("PHP", "Philippine Peso"),
    ("VND", "Vietnamese Dong"),
    ("ARS", "Argentine Peso"),
    ("CLP", "Chilean Peso"),
    ("COP", "Colombian Peso"),
    ("PEN", "Peruvian Sol"),
    ("PLN", "Polish Zloty"),
    ("CZK", "Czech Koruna"),
    ("HUF", "Hungarian Forint"),
    ("DKK", "Danish Krone"),
    ("NOK", "Norwegian Krone"),
    ("SEK", "Swedish Krona"),
    ("TRY", "Turkish Lira"),
    ("ILS", "Israeli Shekel"),
    ("QAR", "Qatari Riyal"),
    ("OMR", "Omani Rial"),
    ("KWD", "Kuwaiti Dinar"),
    ("BHD", "Bahraini Dinar"),
    ("JOD", "Jordanian Dinar"),
    ("LBP", "Lebanese Pound"),
    ("MAD", "Moroccan Dirham"),
    ("DZD", "Algerian Dinar"),
    ("TND", "Tunisian Dinar"),
    ("RSD", "Serbian Dinar"),
    ("HRK", "Croatian Kuna"),
];

static BY_CODE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| CURRENCIES.iter().copied().collect());

/// Display name for a code, if it is in the table.
pub fn display_name(code: &str) -> Option<&'static str> {
    BY_CODE.get(code).copied()
}

pub fn priority_codes() -> Vec<String> {
    PRIORITY_CODES.iter().map(|c| c.to_string()).collect()
}
