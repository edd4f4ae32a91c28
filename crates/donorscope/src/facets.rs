//! Facet catalog: the options offered by the filter selectors.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::donor::{BloodGroup, DonorRecord};
use crate::filter::ALL;

/// Selector options derived from a donor collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCatalog {
    cities: Vec<String>,
    blood_groups: Vec<String>,
}

impl FacetCatalog {
    /// Build the catalog for a collection.
    ///
    /// Cities are `"All"` followed by the distinct cities in ordinal order.
    /// Blood groups are the fixed enumeration, whatever the data holds.
    #[must_use]
    pub fn from_donors(donors: &[DonorRecord]) -> Self {
        let distinct: BTreeSet<&str> = donors
            .iter()
            .map(DonorRecord::city)
            .filter(|city| *city != ALL)
            .collect();

        let cities = std::iter::once(ALL)
            .chain(distinct)
            .map(str::to_string)
            .collect();

        Self {
            cities,
            blood_groups: blood_group_options(),
        }
    }

    /// The catalog of an empty collection.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_donors(&[])
    }

    /// City options, `"All"` first.
    #[must_use]
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Blood group options, `"All"` first.
    #[must_use]
    pub fn blood_groups(&self) -> &[String] {
        &self.blood_groups
    }
}

impl Default for FacetCatalog {
    fn default() -> Self {
        Self::empty()
    }
}

fn blood_group_options() -> Vec<String> {
    std::iter::once(ALL)
        .chain(BloodGroup::KNOWN.iter().map(|g| g.as_str()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donor::RawDonor;
    use crate::normalize::normalize;
    use serde_json::json;

    fn donors_at(addresses: &[&str]) -> Vec<DonorRecord> {
        let payloads: Vec<RawDonor> = addresses
            .iter()
            .map(|a| serde_json::from_value(json!({ "address": a })).unwrap())
            .collect();
        normalize(&payloads)
    }

    #[test]
    fn test_empty_collection() {
        let catalog = FacetCatalog::from_donors(&[]);
        assert_eq!(catalog.cities(), ["All"]);
        assert_eq!(catalog.blood_groups().len(), 9);
    }

    #[test]
    fn test_cities_sorted_and_distinct() {
        let donors = donors_at(&["a, Kandy", "b, Colombo", "c, Kandy", "no comma", "d, Galle"]);
        let catalog = FacetCatalog::from_donors(&donors);
        assert_eq!(
            catalog.cities(),
            ["All", "Colombo", "Galle", "Kandy", "Unknown"]
        );
    }

    #[test]
    fn test_cities_ordinal_case_sensitive() {
        let donors = donors_at(&["x, galle", "y, Galle", "z, Matara"]);
        let catalog = FacetCatalog::from_donors(&donors);
        assert_eq!(catalog.cities(), ["All", "Galle", "Matara", "galle"]);
    }

    #[test]
    fn test_city_named_all_collapses_into_sentinel() {
        let donors = donors_at(&["1 Road, All", "2 Road, Jaffna"]);
        let catalog = FacetCatalog::from_donors(&donors);
        assert_eq!(catalog.cities(), ["All", "Jaffna"]);
    }

    #[test]
    fn test_blood_groups_fixed_order() {
        let catalog = FacetCatalog::from_donors(&donors_at(&["a, Kandy"]));
        assert_eq!(
            catalog.blood_groups(),
            ["All", "A+", "A-", "B+", "B-", "O+", "O-", "AB+", "AB-"]
        );
    }

    #[test]
    fn test_catalog_is_deterministic() {
        let donors = donors_at(&["a, Negombo", "b, Anuradhapura", "c, Kurunegala"]);
        assert_eq!(
            FacetCatalog::from_donors(&donors),
            FacetCatalog::from_donors(&donors)
        );
    }
}
