//! Donor normalization.
//!
//! Turns loosely-typed [`RawDonor`] payloads into canonical [`DonorRecord`]s.
//! Missing data is replaced with sentinels rather than left absent, so the
//! rest of the engine never branches on presence. Nothing in here fails: a
//! bad field degrades to its sentinel and the record is still produced.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::donor::{BloodGroup, Coordinates, DonationDate, DonorFields, DonorRecord, RawDonor};

/// Sentinel for missing textual fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel city for addresses without a comma.
pub const UNKNOWN_CITY: &str = "Unknown";

/// Derive the city facet from a free-text address.
///
/// The address is split on commas; with two or more segments the trimmed
/// last segment is the city, otherwise the city is [`UNKNOWN_CITY`].
#[must_use]
pub fn city_from_address(address: &str) -> String {
    match address.rsplit_once(',') {
        Some((_, city)) => city.trim().to_string(),
        None => UNKNOWN_CITY.to_string(),
    }
}

/// Normalize a batch of payloads from one load.
///
/// Identifiers are unique within the returned collection.
#[must_use]
pub fn normalize(payloads: &[RawDonor]) -> Vec<DonorRecord> {
    let mut used_ids = HashSet::with_capacity(payloads.len());
    let records: Vec<DonorRecord> = payloads
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize_one(index, raw, &mut used_ids))
        .collect();

    debug!(
        records = records.len(),
        located = records.iter().filter(|r| r.coordinates().is_some()).count(),
        unknown_groups = records
            .iter()
            .filter(|r| !r.blood_group().is_known())
            .count(),
        "Normalized donor payloads"
    );
    records
}

fn normalize_one(index: usize, raw: &RawDonor, used_ids: &mut HashSet<String>) -> DonorRecord {
    let name = text_or_sentinel(raw.name.as_ref());
    let raw_address = raw.address.as_ref().and_then(text_value);
    let contact = text_or_sentinel(raw.contact_number.as_ref());

    let city = city_from_address(raw_address.as_deref().unwrap_or_default());
    let address = raw_address.unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let blood_group = raw
        .blood_group
        .as_ref()
        .and_then(text_value)
        .map_or(BloodGroup::Unknown, |text| BloodGroup::parse_lenient(&text));

    let last_donation = raw
        .last_donation_date
        .as_ref()
        .and_then(text_value)
        .map_or(DonationDate::Unknown, |text| DonationDate::parse(&text));

    let coordinates = coordinates_from(raw.latitude.as_ref(), raw.longitude.as_ref());
    if coordinates.is_none() && (raw.latitude.is_some() || raw.longitude.is_some()) {
        debug!(index, "Dropping malformed coordinate pair");
    }

    let base_id = raw
        .id
        .as_ref()
        .and_then(text_value)
        .unwrap_or_else(|| derived_id(index, &name, &address, &contact));
    let id = unique_id(base_id, used_ids);

    DonorRecord::from_fields(DonorFields {
        id,
        name,
        blood_group,
        address,
        city,
        contact,
        last_donation,
        coordinates,
    })
}

/// Textual content of a JSON value; numbers are accepted as text.
fn text_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

fn text_or_sentinel(value: Option<&Value>) -> String {
    value
        .and_then(text_value)
        .map_or_else(|| NOT_AVAILABLE.to_string(), |s| s.trim().to_string())
}

/// Numeric content of a JSON value; numeric strings are accepted.
fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coordinates_from(latitude: Option<&Value>, longitude: Option<&Value>) -> Option<Coordinates> {
    let latitude = number_value(latitude?)?;
    let longitude = number_value(longitude?)?;
    Coordinates::new(latitude, longitude)
}

/// Content-derived identifier for payloads without one.
fn derived_id(index: usize, name: &str, address: &str, contact: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(index as u64).to_le_bytes());
    for part in [name, address, contact] {
        hasher.update(part.as_bytes());
        hasher.update(&[0]);
    }
    let hex = hasher.finalize().to_hex();
    format!("donor-{}", &hex[..16])
}

fn unique_id(base: String, used_ids: &mut HashSet<String>) -> String {
    if used_ids.insert(base.clone()) {
        return base;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{base}-{suffix}");
        if used_ids.insert(candidate.clone()) {
            warn!(id = %base, assigned = %candidate, "Duplicate donor id in payload");
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawDonor {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_city_from_address_last_segment() {
        assert_eq!(city_from_address("12 Galle Road, Colombo"), "Colombo");
        assert_eq!(city_from_address("Lane 4, Temple Rd ,  Kandy  "), "Kandy");
        assert_eq!(city_from_address("No comma here"), UNKNOWN_CITY);
        assert_eq!(city_from_address(""), UNKNOWN_CITY);
    }

    #[test]
    fn test_city_from_trailing_comma_is_empty() {
        assert_eq!(city_from_address("14 Main Street,"), "");
    }

    #[test]
    fn test_city_matches_trimmed_text_after_last_comma() {
        for address in ["a,b", "a, b ,c", " x , y ", ",", "1,2,3,4"] {
            let expected = address.split(',').last().unwrap().trim();
            assert_eq!(city_from_address(address), expected, "address {address:?}");
        }
    }

    #[test]
    fn test_normalize_full_record() {
        let records = normalize(&[raw(json!({
            "_id": "665f",
            "name": " Nimal Perera ",
            "address": "12 Galle Road, Colombo",
            "blood_group": "O+",
            "contact_number": "0771234567",
            "last_donation_date": "2024-01-15T00:00:00.000Z",
            "latitude": 6.9271,
            "longitude": 79.8612
        }))]);

        let donor = &records[0];
        assert_eq!(donor.id(), "665f");
        assert_eq!(donor.name(), "Nimal Perera");
        assert_eq!(donor.city(), "Colombo");
        assert_eq!(donor.blood_group(), BloodGroup::OPositive);
        assert_eq!(donor.contact(), "0771234567");
        assert_eq!(donor.last_donation().to_string(), "2024-01-15");
        let coords = donor.coordinates().unwrap();
        assert!((coords.latitude() - 6.9271).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_fields_become_sentinels() {
        let records = normalize(&[raw(json!({}))]);
        let donor = &records[0];
        assert_eq!(donor.name(), NOT_AVAILABLE);
        assert_eq!(donor.address(), NOT_AVAILABLE);
        assert_eq!(donor.contact(), NOT_AVAILABLE);
        assert_eq!(donor.city(), UNKNOWN_CITY);
        assert_eq!(donor.blood_group(), BloodGroup::Unknown);
        assert_eq!(donor.last_donation(), DonationDate::Unknown);
        assert!(donor.coordinates().is_none());
        assert!(donor.id().starts_with("donor-"));
    }

    #[test]
    fn test_empty_strings_become_sentinels() {
        let records = normalize(&[raw(json!({"name": "   ", "blood_group": ""}))]);
        assert_eq!(records[0].name(), NOT_AVAILABLE);
        assert_eq!(records[0].blood_group(), BloodGroup::Unknown);
    }

    #[test]
    fn test_numeric_contact_is_text() {
        let records = normalize(&[raw(json!({"contact_number": 771_234_567}))]);
        assert_eq!(records[0].contact(), "771234567");
    }

    #[test]
    fn test_half_coordinate_pair_is_absent() {
        let records = normalize(&[
            raw(json!({"latitude": 6.9})),
            raw(json!({"latitude": "north", "longitude": 79.8})),
            raw(json!({"latitude": "7.29", "longitude": "80.63"})),
        ]);
        assert!(records[0].coordinates().is_none());
        assert!(records[1].coordinates().is_none());
        assert!(records[2].coordinates().is_some());
    }

    #[test]
    fn test_derived_ids_are_stable() {
        let payloads = vec![raw(json!({"name": "A", "address": "x, Galle"}))];
        assert_eq!(normalize(&payloads)[0].id(), normalize(&payloads)[0].id());
    }

    #[test]
    fn test_identical_payloads_get_distinct_ids() {
        let payload = raw(json!({"name": "Twin", "address": "1 Road, Galle"}));
        let records = normalize(&[payload.clone(), payload]);
        assert_ne!(records[0].id(), records[1].id());
    }

    #[test]
    fn test_duplicate_source_ids_are_suffixed() {
        crate::logging::init_test_logging();
        let records = normalize(&[
            raw(json!({"_id": "dup"})),
            raw(json!({"_id": "dup"})),
            raw(json!({"_id": "dup"})),
        ]);
        let ids: Vec<&str> = records.iter().map(DonorRecord::id).collect();
        assert_eq!(ids, vec!["dup", "dup-2", "dup-3"]);
    }

    #[test]
    fn test_normalize_preserves_order() {
        let records = normalize(&[
            raw(json!({"_id": "1", "address": "a, Kandy"})),
            raw(json!({"_id": "2", "address": "b, Colombo"})),
        ]);
        assert_eq!(records[0].id(), "1");
        assert_eq!(records[1].id(), "2");
    }
}
