//! Country dial codes and input masks for phone numbers.
//!
//! A mask spells out a full international number with `9` marking each
//! national digit slot, e.g. `+1 (999) 999-9999`. Every mask starts with its
//! country's dial code.

use crate::validation::{count_digits, MAX_PHONE_DIGITS, MIN_PHONE_DIGITS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    /// ISO 3166-1 alpha-2.
    pub code: &'static str,
    pub name: &'static str,
    pub mask: &'static str,
    pub dial_code: &'static str,
    pub flag: &'static str,
}

impl Country {
    /// Number of national digits the mask expects.
    pub fn national_digits(&self) -> usize {
        self.national_mask().chars().filter(|&c| c == '9').count()
    }

    fn national_mask(&self) -> &'static str {
        self.mask.strip_prefix(self.dial_code).unwrap_or(self.mask)
    }
}

const fn entry(
    code: &'static str,
    name: &'static str,
    mask: &'static str,
    dial_code: &'static str,
    flag: &'static str,
) -> Country {
    Country {
        code,
        name,
        mask,
        dial_code,
        flag,
    }
}

pub const DEFAULT_COUNTRY: &str = "US";

/// Supported countries, grouped by region. Order breaks dial-code ties.
pub static COUNTRIES: [Country; 47] = [
    entry("US", "United States", "+1 (999) 999-9999", "+1", "🇺🇸"),
    entry("CA", "Canada", "+1 (999) 999-9999", "+1", "🇨🇦"),
    entry("MX", "Mexico", "+52 999 999 9999", "+52", "🇲🇽"),
    entry("BR", "Brazil", "+55 (99) 99999-9999", "+55", "🇧🇷"),
    entry("AR", "Argentina", "+54 9 9999 9999", "+54", "🇦🇷"),
    entry("CL", "Chile", "+56 9 9999 9999", "+56", "🇨🇱"),
    entry("CO", "Colombia", "+57 999 999 9999", "+57", "🇨🇴"),
    entry("PE", "Peru", "+51 999 999 999", "+51", "🇵🇪"),
    entry("UY", "Uruguay", "+598 99 999 999", "+598", "🇺🇾"),
    entry("VE", "Venezuela", "+58 999 999 9999", "+58", "🇻🇪"),
    entry("EC", "Ecuador", "+593 99 999 9999", "+593", "🇪🇨"),
    entry("GB", "United Kingdom", "+44 9999 999999", "+44", "🇬🇧"),
    entry("FR", "France", "+33 9 99 99 99 99", "+33", "🇫🇷"),
    entry("DE", "Germany", "+49 999 99999999", "+49", "🇩🇪"),
    entry("ES", "Spain", "+34 999 999 999", "+34", "🇪🇸"),
    entry("IT", "Italy", "+39 999 999 9999", "+39", "🇮🇹"),
    entry("PT", "Portugal", "+351 999 999 999", "+351", "🇵🇹"),
    entry("NL", "Netherlands", "+31 9 9999 9999", "+31", "🇳🇱"),
    entry("BE", "Belgium", "+32 999 99 99 99", "+32", "🇧🇪"),
    entry("CH", "Switzerland", "+41 99 999 99 99", "+41", "🇨🇭"),
    entry("AT", "Austria", "+43 999 999 9999", "+43", "🇦🇹"),
    entry("SE", "Sweden", "+46 99 999 99 99", "+46", "🇸🇪"),
    entry("NO", "Norway", "+47 999 99 999", "+47", "🇳🇴"),
    entry("DK", "Denmark", "+45 99 99 99 99", "+45", "🇩🇰"),
    entry("FI", "Finland", "+358 99 999 9999", "+358", "🇫🇮"),
    entry("PL", "Poland", "+48 999 999 999", "+48", "🇵🇱"),
    entry("CZ", "Czech Republic", "+420 999 999 999", "+420", "🇨🇿"),
    entry("RU", "Russia", "+7 999 999 99 99", "+7", "🇷🇺"),
    entry("CN", "China", "+86 999 9999 9999", "+86", "🇨🇳"),
    entry("IN", "India", "+91 99999 99999", "+91", "🇮🇳"),
    entry("JP", "Japan", "+81 99 9999 9999", "+81", "🇯🇵"),
    entry("KR", "South Korea", "+82 99 9999 9999", "+82", "🇰🇷"),
    entry("SG", "Singapore", "+65 9999 9999", "+65", "🇸🇬"),
    entry("MY", "Malaysia", "+60 99 999 9999", "+60", "🇲🇾"),
    entry("TH", "Thailand", "+66 99 999 9999", "+66", "🇹🇭"),
    entry("VN", "Vietnam", "+84 999 999 999", "+84", "🇻🇳"),
    entry("PH", "Philippines", "+63 999 999 9999", "+63", "🇵🇭"),
    entry("ID", "Indonesia", "+62 999 9999 9999", "+62", "🇮🇩"),
    entry("AU", "Australia", "+61 9 9999 9999", "+61", "🇦🇺"),
    entry("NZ", "New Zealand", "+64 99 999 9999", "+64", "🇳🇿"),
    entry("ZA", "South Africa", "+27 99 999 9999", "+27", "🇿🇦"),
    entry("NG", "Nigeria", "+234 999 999 9999", "+234", "🇳🇬"),
    entry("EG", "Egypt", "+20 999 999 9999", "+20", "🇪🇬"),
    entry("AE", "United Arab Emirates", "+971 99 999 9999", "+971", "🇦🇪"),
    entry("SA", "Saudi Arabia", "+966 99 999 9999", "+966", "🇸🇦"),
    entry("IL", "Israel", "+972 99 999 9999", "+972", "🇮🇱"),
    entry("TR", "Turkey", "+90 999 999 99 99", "+90", "🇹🇷"),
];

pub fn country(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code == code)
}

pub fn default_country() -> &'static Country {
    &COUNTRIES[0]
}

/// Guess the country of an international number from its dial code.
///
/// The longest matching dial code wins; on equal
/// length the earlier table entry wins. Numbers without a leading `+` or
/// with an unknown prefix fall back to the default country.
pub fn detect_country(phone: &str) -> &'static Country {
    if !phone.starts_with('+') {
        return default_country();
    }
    COUNTRIES
        .iter()
        .filter(|c| phone.starts_with(c.dial_code))
        .min_by_key(|c| std::cmp::Reverse(c.dial_code.len()))
        .unwrap_or_else(default_country)
}

/// Check `phone` against a country's dial code and mask.
///
/// With no country, or one not in the table, only the generic 10 to 15
/// digit rule applies.
pub fn validate_phone_number(phone: &str, country_code: Option<&str>) -> bool {
    if phone.is_empty() {
        return false;
    }
    let Some(country) = country_code.and_then(country) else {
        let digits = count_digits(phone);
        return (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits);
    };
    let Some(national) = phone.strip_prefix(country.dial_code) else {
        return false;
    };
    count_digits(national) == country.national_digits()
}

/// Prefix the country's dial code when `phone` lacks it.
///
/// Unknown countries and numbers that already carry the dial code are
/// returned unchanged.
pub fn format_phone_number(phone: &str, country_code: Option<&str>) -> String {
    if phone.is_empty() {
        return String::new();
    }
    let Some(country) = country_code.and_then(country) else {
        return phone.to_string();
    };
    if phone.starts_with(country.dial_code) {
        return phone.to_string();
    }
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return phone.to_string();
    }
    format!("{} {digits}", country.dial_code)
}

/// Lay the digits of `input` into the country's mask.
///
/// A leading dial code in `input` is not repeated. Literal separators are
/// emitted only while digits remain, so partial input yields a partial mask;
/// digits beyond the mask are dropped.
pub fn apply_mask(input: &str, country: &Country) -> String {
    let skip = if input.trim_start().starts_with(country.dial_code) {
        count_digits(country.dial_code)
    } else {
        0
    };
    let mut digits = input.chars().filter(char::is_ascii_digit).skip(skip).peekable();

    let mut out = String::from(country.dial_code);
    for slot in country.national_mask().chars() {
        if digits.peek().is_none() {
            break;
        }
        match slot {
            '9' => out.extend(digits.next()),
            literal => out.push(literal),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_consistent() {
        for c in &COUNTRIES {
            assert!(c.mask.starts_with(c.dial_code), "{}", c.code);
            assert_eq!(country(c.code), Some(c));
        }
        assert_eq!(default_country().code, DEFAULT_COUNTRY);
    }

    #[test]
    fn detect_prefers_longest_dial_code() {
        assert_eq!(detect_country("+351 912 345 678").code, "PT");
        assert_eq!(detect_country("+33 6 12 34 56 78").code, "FR");
        assert_eq!(detect_country("+598 99 123 456").code, "UY");
    }

    #[test]
    fn detect_breaks_ties_by_table_order() {
        assert_eq!(detect_country("+1 416 555 0199").code, "US");
    }

    #[test]
    fn detect_falls_back_to_default() {
        assert_eq!(detect_country("").code, "US");
        assert_eq!(detect_country("0044 20 7946 0958").code, "US");
        assert_eq!(detect_country("+999 123").code, "US");
    }

    #[test]
    fn validate_against_country_mask() {
        assert!(validate_phone_number("+1 (555) 123-4567", Some("US")));
        assert!(!validate_phone_number("+1 (555) 123-456", Some("US")));
        assert!(!validate_phone_number("+44 7700 900123", Some("US")));
        assert!(validate_phone_number("+44 7700 900123", Some("GB")));
        assert!(validate_phone_number("+55 (11) 91234-5678", Some("BR")));
    }

    #[test]
    fn validate_without_country_uses_digit_range() {
        assert!(!validate_phone_number("", None));
        assert!(validate_phone_number("555 123 4567", None));
        assert!(validate_phone_number("555 123 4567", Some("XX")));
        assert!(!validate_phone_number("555 1234", None));
    }

    #[test]
    fn format_adds_missing_dial_code() {
        assert_eq!(format_phone_number("", Some("US")), "");
        assert_eq!(format_phone_number("(555) 123-4567", Some("US")), "+1 5551234567");
        assert_eq!(format_phone_number("+1 555 123 4567", Some("US")), "+1 555 123 4567");
        assert_eq!(format_phone_number("555", Some("XX")), "555");
        assert_eq!(format_phone_number("call me", Some("DE")), "call me");
    }

    #[test]
    fn mask_fills_slots() {
        let us = country("US").unwrap();
        assert_eq!(apply_mask("5551234567", us), "+1 (555) 123-4567");
        assert_eq!(apply_mask("+1 555 123 4567", us), "+1 (555) 123-4567");
        assert_eq!(apply_mask("5551", us), "+1 (555) 1");
        assert_eq!(apply_mask("555123456789", us), "+1 (555) 123-4567");
        assert_eq!(apply_mask("", us), "+1");

        let fr = country("FR").unwrap();
        assert_eq!(apply_mask("612345678", fr), "+33 6 12 34 56 78");
    }
}
