//! Phone number normalization for the WhatsApp gateway.

/// Country code used when none is configured (Indonesia).
pub const DEFAULT_COUNTRY_CODE: &str = "62";

/// Normalize a phone number into the gateway's `<country><subscriber>` form.
///
/// All non-digit characters are removed, a leading national `0` is replaced
/// by the country code, numbers already starting with the country code pass
/// through, and anything else gets the country code prepended.
///
/// Returns `None` when the input contains no digits at all. The output
/// always starts with `country_code`, so applying the function twice yields
/// the same value.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let normalized = if let Some(rest) = digits.strip_prefix('0') {
        format!("{country_code}{rest}")
    } else if digits.starts_with(country_code) {
        digits
    } else {
        format!("{country_code}{digits}")
    };

    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_short_and_international_forms_agree() {
        for raw in ["081234567890", "81234567890", "6281234567890"] {
            assert_eq!(
                normalize_phone(raw, DEFAULT_COUNTRY_CODE).as_deref(),
                Some("6281234567890"),
                "input {raw}"
            );
        }
    }

    #[test]
    fn strips_formatting_characters() {
        assert_eq!(
            normalize_phone("+62 812-3456-7890", DEFAULT_COUNTRY_CODE).as_deref(),
            Some("6281234567890")
        );
        assert_eq!(
            normalize_phone("(0812) 3456 7890", DEFAULT_COUNTRY_CODE).as_deref(),
            Some("6281234567890")
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["081234567890", "81234567890", "+62 812 3456", "0", "620", "999"] {
            let once = normalize_phone(raw, DEFAULT_COUNTRY_CODE).unwrap();
            let twice = normalize_phone(&once, DEFAULT_COUNTRY_CODE).unwrap();
            assert_eq!(once, twice, "input {raw}");
        }
    }

    #[test]
    fn empty_or_digitless_input_has_no_number() {
        assert_eq!(normalize_phone("", DEFAULT_COUNTRY_CODE), None);
        assert_eq!(normalize_phone("n/a", DEFAULT_COUNTRY_CODE), None);
    }

    #[test]
    fn honours_configured_country_code() {
        assert_eq!(normalize_phone("0412 345 678", "61").as_deref(), Some("61412345678"));
    }
}
