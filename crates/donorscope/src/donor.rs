//! Core donor types for donorscope.
//!
//! This module defines the raw payload accepted from a donor source and the
//! canonical [`DonorRecord`] produced from it by the normalizer.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Lenient blood group syntax: `A+`, `ab -`, `O positive`, `B neg`.
static BLOOD_GROUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(AB|A|B|O)\s*(\+|-|pos(?:itive)?|neg(?:ative)?)\s*$")
        .expect("blood group pattern is valid")
});

/// ABO/Rh blood group of a donor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodGroup {
    /// A positive.
    #[serde(rename = "A+")]
    APositive,
    /// A negative.
    #[serde(rename = "A-")]
    ANegative,
    /// B positive.
    #[serde(rename = "B+")]
    BPositive,
    /// B negative.
    #[serde(rename = "B-")]
    BNegative,
    /// O positive.
    #[serde(rename = "O+")]
    OPositive,
    /// O negative.
    #[serde(rename = "O-")]
    ONegative,
    /// AB positive.
    #[serde(rename = "AB+")]
    AbPositive,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNegative,
    /// Missing or unrecognised in the source payload.
    #[serde(rename = "unknown")]
    Unknown,
}

impl BloodGroup {
    /// Every known blood group, in selector order.
    pub const KNOWN: [BloodGroup; 8] = [
        Self::APositive,
        Self::ANegative,
        Self::BPositive,
        Self::BNegative,
        Self::OPositive,
        Self::ONegative,
        Self::AbPositive,
        Self::AbNegative,
    ];

    /// Canonical label, e.g. `"AB-"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this is a real group rather than the `unknown` sentinel.
    #[must_use]
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    /// Parse free-form text, mapping anything unrecognised to [`BloodGroup::Unknown`].
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        let Some(caps) = BLOOD_GROUP_PATTERN.captures(text) else {
            return Self::Unknown;
        };
        let positive = caps[2].starts_with('+') || caps[2].to_ascii_lowercase().starts_with('p');
        match (caps[1].to_ascii_uppercase().as_str(), positive) {
            ("A", true) => Self::APositive,
            ("A", false) => Self::ANegative,
            ("B", true) => Self::BPositive,
            ("B", false) => Self::BNegative,
            ("O", true) => Self::OPositive,
            ("O", false) => Self::ONegative,
            ("AB", true) => Self::AbPositive,
            ("AB", false) => Self::AbNegative,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = Error;

    /// Strict parse: `"unknown"` is accepted, any other unrecognised text is an error.
    fn from_str(s: &str) -> Result<Self> {
        match Self::parse_lenient(s) {
            Self::Unknown if !s.trim().eq_ignore_ascii_case("unknown") => {
                Err(Error::invalid_facet("blood group", s))
            }
            group => Ok(group),
        }
    }
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Build a coordinate pair, rejecting non-finite or out-of-range values.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Build a pair already known to be finite and in range.
    pub(crate) fn in_range(latitude: f64, longitude: f64) -> Self {
        debug_assert!(Self::new(latitude, longitude).is_some());
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Date of a donor's most recent donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DonationDate {
    /// A known calendar date.
    On(NaiveDate),
    /// Missing or unparseable in the source payload.
    Unknown,
}

impl DonationDate {
    /// Parse an ISO date (`2024-03-01`) or an RFC 3339 timestamp.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Self::On(date);
        }
        match DateTime::parse_from_rfc3339(text) {
            Ok(timestamp) => Self::On(timestamp.date_naive()),
            Err(_) => Self::Unknown,
        }
    }

}

impl fmt::Display for DonationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for DonationDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A donor payload as delivered by the donor source.
///
/// Every field is optional and loosely typed; the normalizer decides what
/// each value means. Payloads are built with [`RawDonor::from_value`], so a
/// field appearing under several names never rejects the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawDonor {
    /// Source identifier (`_id`, else `id`).
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Donor name.
    pub name: Option<Value>,
    /// Free-text address, conventionally `"street, city"`.
    pub address: Option<Value>,
    /// Blood group text.
    pub blood_group: Option<Value>,
    /// Contact number (`contact_number`, else `contact`).
    pub contact_number: Option<Value>,
    /// Last donation date or timestamp.
    pub last_donation_date: Option<Value>,
    /// Latitude (`latitude`, else `lat`), as a number or numeric string.
    pub latitude: Option<Value>,
    /// Longitude (`longitude`, else `lng`), as a number or numeric string.
    pub longitude: Option<Value>,
}

impl RawDonor {
    /// Read a payload from one JSON element.
    ///
    /// Returns `None` unless the element is an object. For each field the
    /// first non-null key in precedence order wins.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| object.get(*key).filter(|v| !v.is_null()))
                .cloned()
        };
        Some(Self {
            id: field(&["_id", "id"]),
            name: field(&["name"]),
            address: field(&["address"]),
            blood_group: field(&["blood_group"]),
            contact_number: field(&["contact_number", "contact"]),
            last_donation_date: field(&["last_donation_date"]),
            latitude: field(&["latitude", "lat"]),
            longitude: field(&["longitude", "lng"]),
        })
    }
}

impl<'de> Deserialize<'de> for RawDonor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).ok_or_else(|| de::Error::custom("expected a donor object"))
    }
}

/// A canonical donor record.
///
/// Records are immutable once normalized: fields are only readable, and the
/// city facet is derived from the address exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorRecord {
    pub(crate) id: String,
    name: String,
    blood_group: BloodGroup,
    address: String,
    city: String,
    pub(crate) contact: String,
    last_donation: DonationDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) coordinates: Option<Coordinates>,
}

/// Field values of a record before the city facet is derived.
#[derive(Debug, Clone)]
pub(crate) struct DonorFields {
    pub id: String,
    pub name: String,
    pub blood_group: BloodGroup,
    pub address: String,
    pub city: String,
    pub contact: String,
    pub last_donation: DonationDate,
    pub coordinates: Option<Coordinates>,
}

impl DonorRecord {
    pub(crate) fn from_fields(fields: DonorFields) -> Self {
        Self {
            id: fields.id,
            name: fields.name,
            blood_group: fields.blood_group,
            address: fields.address,
            city: fields.city,
            contact: fields.contact,
            last_donation: fields.last_donation,
            coordinates: fields.coordinates,
        }
    }

    /// Stable, session-unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Donor name, or `"N/A"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blood group, possibly [`BloodGroup::Unknown`].
    #[must_use]
    pub fn blood_group(&self) -> BloodGroup {
        self.blood_group
    }

    /// Address as supplied, or `"N/A"`.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// City facet derived from the address.
    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Contact number, or `"N/A"`.
    #[must_use]
    pub fn contact(&self) -> &str {
        &self.contact
    }

    /// Most recent donation.
    #[must_use]
    pub fn last_donation(&self) -> DonationDate {
        self.last_donation
    }

    /// Location, when the source supplied a valid pair.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }
}
