//! Input validation mirroring the server's rules
//!
//! The server rejects bad call signs, locators and frequencies with the
//! same messages used here. Validating before sending turns a round trip
//! into an immediate [`ClientError::Validation`], but the server remains
//! the authority; anything that slips through still fails there.

use regex::Regex;
use std::sync::OnceLock;

use crate::bands::Band;
use crate::error::{ClientError, Result};
use crate::models::NewContact;

fn call_sign_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Z0-9]{3,10}$").unwrap())
}

fn locator_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z]{2}$").unwrap())
}

/// Uppercase and validate a call sign
///
/// # Examples
///
/// ```
/// use qsoplan_client::validate::normalize_call_sign;
///
/// assert_eq!(normalize_call_sign("m0abc").unwrap(), "M0ABC");
/// assert!(normalize_call_sign("no").is_err());
/// ```
pub fn normalize_call_sign(raw: &str) -> Result<String> {
    let call_sign = raw.trim().to_uppercase();
    if call_sign_regex().is_match(&call_sign) {
        Ok(call_sign)
    } else {
        Err(ClientError::Validation(
            "Call sign must be 3-10 alphanumeric characters".to_string(),
        ))
    }
}

/// Uppercase and validate a 6-character Maidenhead locator
pub fn normalize_locator(raw: &str) -> Result<String> {
    let locator = raw.trim().to_uppercase();
    if locator_regex().is_match(&locator) {
        Ok(locator)
    } else {
        Err(ClientError::Validation(
            "Grid square must be in format AA00AA (e.g., IO91WM)".to_string(),
        ))
    }
}

/// Check a frequency against the server's accepted range
pub fn validate_frequency(frequency: f64) -> Result<()> {
    if (26.0..=900.0).contains(&frequency) {
        Ok(())
    } else {
        Err(ClientError::Validation(
            "Frequency must be between 26.0 and 900.0 MHz".to_string(),
        ))
    }
}

/// Normalize and validate a contact before submission
///
/// Uppercases the recipient call sign and both locators, rejects
/// self-contacts against the logged-in call sign, checks the frequency
/// range, and rejects modes not legal on the matched band. Frequencies
/// outside any known band plan pass with the mode unchecked.
pub fn validated_contact(contact: NewContact, own_call_sign: &str) -> Result<NewContact> {
    let recipient = normalize_call_sign(&contact.recipient)?;
    if recipient == own_call_sign.trim().to_uppercase() {
        return Err(ClientError::Validation(
            "Cannot log a QSO with yourself".to_string(),
        ));
    }

    validate_frequency(contact.frequency)?;
    if let Some(band) = Band::from_frequency(contact.frequency) {
        if !band.supports(contact.mode) {
            return Err(ClientError::Validation(format!(
                "Mode {} is not valid on the {} band",
                contact.mode, band
            )));
        }
    }

    Ok(NewContact {
        recipient,
        initiator_location: normalize_locator(&contact.initiator_location)?,
        recipient_location: normalize_locator(&contact.recipient_location)?,
        ..contact
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mode;
    use chrono::{TimeZone, Utc};

    fn sample_contact(recipient: &str, frequency: f64, mode: Mode) -> NewContact {
        NewContact::new(
            recipient,
            frequency,
            mode,
            Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 0).unwrap(),
            "io91wm",
            "jo62qm",
        )
    }

    #[test]
    fn test_call_sign_normalization() {
        assert_eq!(normalize_call_sign(" m0abc ").unwrap(), "M0ABC");
        assert_eq!(normalize_call_sign("2E0XYZ").unwrap(), "2E0XYZ");

        for bad in ["", "AB", "WAYTOOLONGCALL", "M0-ABC", "M0 ABC"] {
            let err = normalize_call_sign(bad).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Validation error: Call sign must be 3-10 alphanumeric characters"
            );
        }
    }

    #[test]
    fn test_locator_normalization() {
        assert_eq!(normalize_locator("io91wm").unwrap(), "IO91WM");

        for bad in ["", "IO91", "IO91W", "IO91W1", "1O91WM", "IO91WMX"] {
            assert!(normalize_locator(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_frequency_range() {
        assert!(validate_frequency(26.0).is_ok());
        assert!(validate_frequency(446.094).is_ok());
        assert!(validate_frequency(900.0).is_ok());

        assert!(validate_frequency(25.999).is_err());
        assert!(validate_frequency(900.001).is_err());
        assert!(validate_frequency(0.0).is_err());
    }

    #[test]
    fn test_validated_contact_normalizes_fields() {
        let contact = validated_contact(sample_contact("dl1xyz", 27.085, Mode::Ssb), "M0ABC")
            .unwrap();
        assert_eq!(contact.recipient, "DL1XYZ");
        assert_eq!(contact.initiator_location, "IO91WM");
        assert_eq!(contact.recipient_location, "JO62QM");
    }

    #[test]
    fn test_rejects_contact_with_self() {
        let err = validated_contact(sample_contact("m0abc", 27.085, Mode::Fm), "M0ABC")
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Cannot log a QSO with yourself");
    }

    #[test]
    fn test_rejects_mode_not_legal_on_band() {
        let err = validated_contact(sample_contact("DL1XYZ", 446.031, Mode::Ssb), "M0ABC")
            .unwrap_err();
        assert!(err.to_string().contains("not valid on the PMR band"));

        // Frequencies outside any band plan skip the mode check.
        assert!(validated_contact(sample_contact("DL1XYZ", 145.500, Mode::Ssb), "M0ABC").is_ok());
    }
}
