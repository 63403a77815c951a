//! Wire models for the QSO Plan API
//!
//! Serde types for everything the client sends to or receives from the
//! server, plus small derivation helpers (datetime parsing, ranking rates).
//!
//! Two wire quirks are absorbed here rather than left to callers:
//!
//! - `frequency` may arrive as a JSON number or as a decimal string,
//!   depending on how the server renders decimals; both deserialize.
//! - `datetime` stays a raw string on [`ContactRecord`] so that one
//!   malformed record cannot abort deserialization of a whole list.
//!   [`ContactRecord::datetime_utc`] parses it on demand.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::bands::round_to_khz;
use crate::error::ClientError;

/// Transmission mode of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Am,
    Ssb,
    Fm,
}

impl Mode {
    /// Wire representation of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Am => "AM",
            Mode::Ssb => "SSB",
            Mode::Fm => "FM",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AM" => Ok(Mode::Am),
            "SSB" => Ok(Mode::Ssb),
            "FM" => Ok(Mode::Fm),
            other => Err(ClientError::Validation(format!(
                "Unknown mode '{}' (expected AM, SSB or FM)",
                other
            ))),
        }
    }
}

/// One-directional contact record as received from the server
///
/// Records one party's perspective of a contact. Immutable from the
/// client's perspective except for deletion. `initiator_callsign` and
/// `confirmed` are server-populated, read-only fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: i64,
    /// Server-side user id of the initiator
    pub initiator: i64,
    /// Call sign of the initiating station
    pub initiator_callsign: String,
    /// Call sign of the worked station
    pub recipient: String,
    /// Frequency in MHz, kHz resolution
    #[serde(deserialize_with = "deserialize_frequency")]
    pub frequency: f64,
    pub mode: Mode,
    /// ISO-8601 timestamp, kept raw; see [`ContactRecord::datetime_utc`]
    pub datetime: String,
    /// Initiator's 6-character grid locator
    pub initiator_location: String,
    /// Recipient's 6-character grid locator
    pub recipient_location: String,
    /// Whether the server has matched a counter-record
    #[serde(default)]
    pub confirmed: bool,
}

impl ContactRecord {
    /// Parse the raw `datetime` field into a UTC instant
    ///
    /// Returns `None` for malformed timestamps instead of failing, so one
    /// bad record never poisons list handling.
    pub fn datetime_utc(&self) -> Option<DateTime<Utc>> {
        parse_datetime(&self.datetime)
    }
}

/// Contact record to be created, client → server
///
/// The contact-record shape minus the server-assigned fields (`id`,
/// `initiator`, `initiator_callsign`, `confirmed`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContact {
    pub recipient: String,
    pub frequency: f64,
    pub mode: Mode,
    pub datetime: String,
    pub initiator_location: String,
    pub recipient_location: String,
}

impl NewContact {
    /// Build a new contact for the given instant
    ///
    /// The frequency is rounded to kHz resolution to match the server's
    /// 3-decimal storage. Call signs and locators are normalized later by
    /// [`crate::validate::validated_contact`].
    pub fn new(
        recipient: impl Into<String>,
        frequency: f64,
        mode: Mode,
        at: DateTime<Utc>,
        initiator_location: impl Into<String>,
        recipient_location: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            frequency: round_to_khz(frequency),
            mode,
            datetime: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            initiator_location: initiator_location.into(),
            recipient_location: recipient_location.into(),
        }
    }
}

/// Authenticated user's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub call_sign: String,
    #[serde(default)]
    pub default_grid_square: String,
}

/// Profile fields the server allows updating
///
/// `call_sign` is read-only server-side and deliberately absent here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_grid_square: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.default_grid_square.is_none()
    }
}

/// Account registration request
///
/// New accounts start inactive and wait for admin approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub call_sign: String,
    pub default_grid_square: String,
    pub password: String,
}

/// Server acknowledgement of a registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub email: String,
    pub call_sign: String,
}

/// One row of the public rankings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub call_sign: String,
    pub confirmed_contacts: u32,
    pub total_contacts: u32,
}

impl RankingEntry {
    /// Confirmed contacts as a percentage of total contacts
    pub fn confirmation_rate(&self) -> f64 {
        if self.total_contacts == 0 {
            0.0
        } else {
            f64::from(self.confirmed_contacts) / f64::from(self.total_contacts) * 100.0
        }
    }

    /// Rate formatted for display, one decimal, `0%` for empty logs
    pub fn confirmation_rate_display(&self) -> String {
        if self.total_contacts == 0 {
            "0%".to_string()
        } else {
            format!("{:.1}%", self.confirmation_rate())
        }
    }
}

/// Order rankings by confirmed contacts, best first
///
/// Stable, so the server's ordering breaks ties.
pub fn sort_by_confirmed(entries: &mut [RankingEntry]) {
    entries.sort_by(|a, b| b.confirmed_contacts.cmp(&a.confirmed_contacts));
}

/// Call-sign search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallsignMatch {
    pub call_sign: String,
    #[serde(default)]
    pub default_grid_square: String,
}

/// Access/refresh token pair issued at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Parse an ISO-8601 timestamp leniently into UTC
///
/// Accepts RFC 3339 (the server's format) plus a few naive fallbacks that
/// browsers historically produced; naive timestamps are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

fn deserialize_frequency<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mode_wire_format() {
        assert_eq!(serde_json::to_string(&Mode::Ssb).unwrap(), "\"SSB\"");
        let mode: Mode = serde_json::from_str("\"FM\"").unwrap();
        assert_eq!(mode, Mode::Fm);

        assert_eq!("am".parse::<Mode>().unwrap(), Mode::Am);
        assert!("CW".parse::<Mode>().is_err());
    }

    #[test]
    fn test_contact_record_deserialization() {
        let json = r#"{
            "id": 7,
            "initiator": 3,
            "initiator_callsign": "M0ABC",
            "recipient": "DL1XYZ",
            "frequency": 27.085,
            "mode": "SSB",
            "datetime": "2024-06-01T18:30:00Z",
            "initiator_location": "IO91WM",
            "recipient_location": "JO62QM",
            "confirmed": true
        }"#;

        let record: ContactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.initiator_callsign, "M0ABC");
        assert_eq!(record.frequency, 27.085);
        assert_eq!(record.mode, Mode::Ssb);
        assert!(record.confirmed);
        assert_eq!(
            record.datetime_utc(),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_frequency_accepts_decimal_string() {
        let json = r#"{
            "id": 1,
            "initiator": 1,
            "initiator_callsign": "M0ABC",
            "recipient": "DL1XYZ",
            "frequency": "446.006",
            "mode": "FM",
            "datetime": "2024-06-01T18:30:00Z",
            "initiator_location": "IO91WM",
            "recipient_location": "JO62QM"
        }"#;

        let record: ContactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.frequency, 446.006);
        // `confirmed` defaults when absent.
        assert!(!record.confirmed);
    }

    #[test]
    fn test_malformed_datetime_is_none_not_error() {
        let json = r#"{
            "id": 2,
            "initiator": 1,
            "initiator_callsign": "M0ABC",
            "recipient": "DL1XYZ",
            "frequency": 27.085,
            "mode": "AM",
            "datetime": "not-a-date",
            "initiator_location": "IO91WM",
            "recipient_location": "JO62QM"
        }"#;

        let record: ContactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.datetime_utc(), None);
    }

    #[test]
    fn test_parse_datetime_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 0).unwrap();
        assert_eq!(parse_datetime("2024-06-01T18:30:00Z"), Some(expected));
        assert_eq!(parse_datetime("2024-06-01T19:30:00+01:00"), Some(expected));
        assert_eq!(parse_datetime("2024-06-01T18:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-06-01 18:30:00"), Some(expected));
        assert_eq!(parse_datetime(""), None);
    }

    #[test]
    fn test_new_contact_rounds_and_formats() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 0).unwrap();
        let contact = NewContact::new("DL1XYZ", 27.08499999, Mode::Ssb, at, "IO91WM", "JO62QM");
        assert_eq!(contact.frequency, 27.085);
        assert_eq!(contact.datetime, "2024-06-01T18:30:00Z");

        let body = serde_json::to_value(&contact).unwrap();
        assert_eq!(body["recipient"], "DL1XYZ");
        assert_eq!(body["mode"], "SSB");
        assert!(body.get("id").is_none());
        assert!(body.get("confirmed").is_none());
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            email: None,
            default_grid_square: Some("IO91WM".to_string()),
        };
        let body = serde_json::to_value(&update).unwrap();
        assert!(body.get("email").is_none());
        assert_eq!(body["default_grid_square"], "IO91WM");
    }

    #[test]
    fn test_ranking_rates() {
        let entry = RankingEntry {
            call_sign: "M0ABC".to_string(),
            confirmed_contacts: 7,
            total_contacts: 13,
        };
        assert!((entry.confirmation_rate() - 53.846).abs() < 0.001);
        assert_eq!(entry.confirmation_rate_display(), "53.8%");

        let empty = RankingEntry {
            call_sign: "2E0XYZ".to_string(),
            confirmed_contacts: 0,
            total_contacts: 0,
        };
        assert_eq!(empty.confirmation_rate_display(), "0%");
    }

    #[test]
    fn test_ranking_sort_is_stable_descending() {
        let mut entries = vec![
            RankingEntry { call_sign: "A1AAA".to_string(), confirmed_contacts: 2, total_contacts: 5 },
            RankingEntry { call_sign: "B1BBB".to_string(), confirmed_contacts: 9, total_contacts: 9 },
            RankingEntry { call_sign: "C1CCC".to_string(), confirmed_contacts: 2, total_contacts: 2 },
        ];
        sort_by_confirmed(&mut entries);
        assert_eq!(entries[0].call_sign, "B1BBB");
        // Ties keep the incoming order.
        assert_eq!(entries[1].call_sign, "A1AAA");
        assert_eq!(entries[2].call_sign, "C1CCC");
    }
}
