//! Filter engine.
//!
//! A [`FilterState`] pairs a city facet with a blood group facet. Applying it
//! to a donor collection is pure and order preserving.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::donor::{BloodGroup, DonorRecord};
use crate::error::Result;

/// Label of the universal-match facet value.
pub const ALL: &str = "All";

/// A facet selection: either everything, or one specific value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Facet<T> {
    /// Matches every value.
    #[default]
    All,
    /// Matches exactly this value.
    Only(T),
}

impl<T> Facet<T> {
    /// Whether this is the universal match.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// The selected value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::All => None,
            Self::Only(value) => Some(value),
        }
    }

    /// Whether `candidate` passes this facet.
    #[must_use]
    pub fn matches<U: ?Sized>(&self, candidate: &U) -> bool
    where
        T: PartialEq<U>,
    {
        match self {
            Self::All => true,
            Self::Only(value) => value == candidate,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Facet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(value) => value.fmt(f),
        }
    }
}

impl<T: fmt::Display> Serialize for Facet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The active filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterState {
    /// City facet.
    pub city: Facet<String>,
    /// Blood group facet.
    pub blood_group: Facet<BloodGroup>,
}

impl FilterState {
    /// The filter that matches every donor.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Replace the city facet.
    #[must_use]
    pub fn with_city(mut self, city: Facet<String>) -> Self {
        self.city = city;
        self
    }

    /// Replace the blood group facet.
    #[must_use]
    pub fn with_blood_group(mut self, blood_group: Facet<BloodGroup>) -> Self {
        self.blood_group = blood_group;
        self
    }

    /// Parse a city selection; `"All"` (any case) is the universal match.
    ///
    /// Any other text selects that exact city, even one absent from the
    /// current catalog; the filtered subset is then simply empty.
    #[must_use]
    pub fn parse_city(text: &str) -> Facet<String> {
        let text = text.trim();
        if text.eq_ignore_ascii_case(ALL) {
            Facet::All
        } else {
            Facet::Only(text.to_string())
        }
    }

    /// Parse a blood group selection; `"All"` (any case) is the universal match.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is neither `"All"` nor a blood group.
    pub fn parse_blood_group(text: &str) -> Result<Facet<BloodGroup>> {
        if text.trim().eq_ignore_ascii_case(ALL) {
            Ok(Facet::All)
        } else {
            text.parse().map(Facet::Only)
        }
    }

    /// Whether a donor passes both facets.
    #[must_use]
    pub fn matches(&self, donor: &DonorRecord) -> bool {
        self.city.matches(donor.city()) && self.blood_group.matches(&donor.blood_group())
    }

    /// The donors that pass this filter, in input order.
    pub fn apply<'a, I>(&self, donors: I) -> Vec<&'a DonorRecord>
    where
        I: IntoIterator<Item = &'a DonorRecord>,
    {
        donors.into_iter().filter(|d| self.matches(d)).collect()
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "city={}, blood group={}", self.city, self.blood_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donor::RawDonor;
    use crate::normalize::normalize;
    use serde_json::json;

    fn donors() -> Vec<DonorRecord> {
        let payloads: Vec<RawDonor> = serde_json::from_value(json!([
            {"_id": "1", "address": "1 Lake Rd, Colombo", "blood_group": "O+"},
            {"_id": "2", "address": "2 Hill St, Colombo", "blood_group": "A+"},
            {"_id": "3", "address": "3 Temple Rd, Kandy", "blood_group": "O+"},
            {"_id": "4", "address": "nowhere", "blood_group": "??"}
        ]))
        .unwrap();
        normalize(&payloads)
    }

    fn ids(subset: &[&DonorRecord]) -> Vec<String> {
        subset.iter().map(|d| d.id().to_string()).collect()
    }

    #[test]
    fn test_all_filter_is_identity() {
        let donors = donors();
        let subset = FilterState::all().apply(&donors);
        assert_eq!(subset.len(), donors.len());
        assert!(subset.iter().zip(&donors).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_city_filter() {
        let donors = donors();
        let filter = FilterState::all().with_city(Facet::Only("Colombo".to_string()));
        assert_eq!(ids(&filter.apply(&donors)), vec!["1", "2"]);
    }

    #[test]
    fn test_city_filter_is_case_sensitive() {
        let donors = donors();
        let filter = FilterState::all().with_city(Facet::Only("colombo".to_string()));
        assert!(filter.apply(&donors).is_empty());
    }

    #[test]
    fn test_combined_filter() {
        let donors = donors();
        let filter = FilterState::all()
            .with_city(Facet::Only("Colombo".to_string()))
            .with_blood_group(Facet::Only(BloodGroup::OPositive));
        assert_eq!(ids(&filter.apply(&donors)), vec!["1"]);
    }

    #[test]
    fn test_unknown_city_facet() {
        let donors = donors();
        let filter = FilterState::all().with_city(Facet::Only("Unknown".to_string()));
        assert_eq!(ids(&filter.apply(&donors)), vec!["4"]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let donors = donors();
        let filter = FilterState::all().with_blood_group(Facet::Only(BloodGroup::AbNegative));
        assert!(filter.apply(&donors).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let donors = donors();
        let filter = FilterState::all().with_blood_group(Facet::Only(BloodGroup::OPositive));
        let once = filter.apply(&donors);
        let twice = filter.apply(once.iter().copied());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_city() {
        assert_eq!(FilterState::parse_city("all"), Facet::All);
        assert_eq!(
            FilterState::parse_city(" Galle "),
            Facet::Only("Galle".to_string())
        );
    }

    #[test]
    fn test_parse_blood_group() {
        assert_eq!(FilterState::parse_blood_group("ALL").unwrap(), Facet::All);
        assert_eq!(
            FilterState::parse_blood_group("ab+").unwrap(),
            Facet::Only(BloodGroup::AbPositive)
        );
        assert!(FilterState::parse_blood_group("X").is_err());
    }

    #[test]
    fn test_filter_display_and_serialize() {
        let filter = FilterState::all().with_blood_group(Facet::Only(BloodGroup::BNegative));
        assert_eq!(filter.to_string(), "city=All, blood group=B-");
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json, json!({"city": "All", "blood_group": "B-"}));
    }
}
