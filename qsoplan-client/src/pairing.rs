//! Pairing view over one-directional contact records
//!
//! The server stores each party's log entry separately. This module folds
//! matching entries into one [`PairedContact`] per contact: records match
//! when they name the same two call signs (in either direction) and the
//! same UTC instant. A contact is confirmed exactly when both parties
//! logged it.
//!
//! The fold is a pure function of the input set. Station labels are
//! ordered lexicographically and the representative record is the one
//! with the smallest id, so the output is identical no matter how the
//! server happened to order the list.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{parse_datetime, ContactRecord, Mode};

/// Two-sided view of a contact derived from one or two records
///
/// `station1` is always the lexicographically smaller call sign and
/// `location1` its locator; `station2`/`location2` the other party.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedContact {
    /// Id of the representative record (smallest id in the group)
    pub id: i64,
    pub station1: String,
    pub station2: String,
    pub location1: String,
    pub location2: String,
    pub frequency: f64,
    pub mode: Mode,
    /// Raw timestamp of the representative record
    pub datetime: String,
    /// Both parties logged this contact
    pub confirmed: bool,
}

impl PairedContact {
    /// Parsed UTC instant, `None` when the representative record's
    /// timestamp is malformed
    pub fn datetime_utc(&self) -> Option<DateTime<Utc>> {
        parse_datetime(&self.datetime)
    }
}

/// Grouping key: unordered call-sign pair plus the UTC instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PairKey {
    first: String,
    second: String,
    at: DateTime<Utc>,
}

impl PairKey {
    /// `None` when the record's timestamp does not parse; such records
    /// can never match a counterpart.
    fn of(record: &ContactRecord) -> Option<PairKey> {
        let at = record.datetime_utc()?;
        let mut pair = [
            record.initiator_callsign.to_uppercase(),
            record.recipient.to_uppercase(),
        ];
        pair.sort();
        let [first, second] = pair;
        Some(PairKey { first, second, at })
    }
}

/// Fold one-directional records into paired contact views
///
/// Records whose timestamp fails to parse become unconfirmed singleton
/// views rather than being dropped. Views are ordered newest first with
/// ties broken by id; views without a parsable timestamp come last.
pub fn pair_contacts(records: &[ContactRecord]) -> Vec<PairedContact> {
    let mut groups: HashMap<PairKey, Vec<&ContactRecord>> = HashMap::new();
    let mut unpairable: Vec<&ContactRecord> = Vec::new();

    for record in records {
        match PairKey::of(record) {
            Some(key) => groups.entry(key).or_default().push(record),
            None => unpairable.push(record),
        }
    }

    let mut views: Vec<(Option<DateTime<Utc>>, PairedContact)> = groups
        .values()
        .filter_map(|group| {
            let representative = group.iter().copied().min_by_key(|record| record.id)?;
            let view = view_from(representative, group.len() >= 2);
            Some((representative.datetime_utc(), view))
        })
        .collect();
    views.extend(
        unpairable
            .into_iter()
            .map(|record| (None, view_from(record, false))),
    );

    views.sort_by(|(at_a, a), (at_b, b)| match (at_a, at_b) {
        (Some(time_a), Some(time_b)) => time_b.cmp(time_a).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });

    views.into_iter().map(|(_, view)| view).collect()
}

fn view_from(record: &ContactRecord, confirmed: bool) -> PairedContact {
    let initiator = record.initiator_callsign.to_uppercase();
    let recipient = record.recipient.to_uppercase();

    let (station1, location1, station2, location2) = if initiator <= recipient {
        (
            initiator,
            record.initiator_location.clone(),
            recipient,
            record.recipient_location.clone(),
        )
    } else {
        (
            recipient,
            record.recipient_location.clone(),
            initiator,
            record.initiator_location.clone(),
        )
    };

    PairedContact {
        id: record.id,
        station1,
        station2,
        location1,
        location2,
        frequency: record.frequency,
        mode: record.mode,
        datetime: record.datetime.clone(),
        confirmed,
    }
}
