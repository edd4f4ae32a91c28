//! Aggregation engine: per-facet donor counts for the chart panel.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::donor::DonorRecord;

/// Facet to group donors by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Group by derived city (the `"Unknown"` city is a bucket like any other).
    City,
    /// Group by blood group (donors with an unknown group are skipped).
    BloodGroup,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::City => write!(f, "city"),
            Self::BloodGroup => write!(f, "blood group"),
        }
    }
}

/// One counted facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationBucket {
    /// Facet value.
    pub key: String,
    /// Number of donors with that value; never zero.
    pub count: usize,
}

impl AggregationBucket {
    /// Create a bucket.
    #[must_use]
    pub fn new(key: impl Into<String>, count: usize) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Count donors per facet value.
///
/// Buckets are ordered by count descending, then key ascending.
pub fn aggregate<'a, I>(donors: I, by: GroupBy) -> Vec<AggregationBucket>
where
    I: IntoIterator<Item = &'a DonorRecord>,
{
    let mut counts: BTreeMap<&'a str, usize> = BTreeMap::new();
    for donor in donors {
        let key = match by {
            GroupBy::City => donor.city(),
            GroupBy::BloodGroup if donor.blood_group().is_known() => donor.blood_group().as_str(),
            GroupBy::BloodGroup => continue,
        };
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut buckets: Vec<AggregationBucket> = counts
        .into_iter()
        .map(|(key, count)| AggregationBucket::new(key, count))
        .collect();
    // BTreeMap order is key ascending; a stable sort keeps it among equal counts.
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donor::RawDonor;
    use crate::normalize::normalize;
    use serde_json::json;

    fn donors(rows: &[(&str, &str)]) -> Vec<DonorRecord> {
        let payloads: Vec<RawDonor> = rows
            .iter()
            .map(|(address, group)| {
                serde_json::from_value(json!({"address": address, "blood_group": group})).unwrap()
            })
            .collect();
        normalize(&payloads)
    }

    #[test]
    fn test_empty_subset_has_no_buckets() {
        assert!(aggregate(std::iter::empty(), GroupBy::BloodGroup).is_empty());
        assert!(aggregate(std::iter::empty(), GroupBy::City).is_empty());
    }

    #[test]
    fn test_ties_broken_by_key() {
        let donors = donors(&[("1, Colombo", "O+"), ("2, Colombo", "A+")]);
        assert_eq!(
            aggregate(&donors, GroupBy::BloodGroup),
            vec![AggregationBucket::new("A+", 1), AggregationBucket::new("O+", 1)]
        );
    }

    #[test]
    fn test_count_descending() {
        let donors = donors(&[
            ("1, Kandy", "B-"),
            ("2, Galle", "O+"),
            ("3, Galle", "O+"),
            ("4, Galle", "AB+"),
        ]);
        assert_eq!(
            aggregate(&donors, GroupBy::City),
            vec![AggregationBucket::new("Galle", 3), AggregationBucket::new("Kandy", 1)]
        );
        assert_eq!(aggregate(&donors, GroupBy::BloodGroup)[0], AggregationBucket::new("O+", 2));
    }

    #[test]
    fn test_blood_group_skips_unknown() {
        let donors = donors(&[("1, Kandy", "N/A"), ("2, Kandy", "A-"), ("3, Kandy", "")]);
        let buckets = aggregate(&donors, GroupBy::BloodGroup);
        assert_eq!(buckets, vec![AggregationBucket::new("A-", 1)]);
    }

    #[test]
    fn test_city_keeps_unknown_bucket() {
        let donors = donors(&[("no comma", "A+"), ("1, Matara", "A+")]);
        let buckets = aggregate(&donors, GroupBy::City);
        assert!(buckets.contains(&AggregationBucket::new("Unknown", 1)));
    }

    #[test]
    fn test_counts_sum_to_subset_minus_unknown() {
        let donors = donors(&[
            ("1, Jaffna", "O-"),
            ("2, Jaffna", "??"),
            ("3, Negombo", "O-"),
            ("4, Negombo", "B+"),
            ("5", "AB-"),
        ]);
        let unknown = donors.iter().filter(|d| !d.blood_group().is_known()).count();
        let by_group: usize = aggregate(&donors, GroupBy::BloodGroup).iter().map(|b| b.count).sum();
        let by_city: usize = aggregate(&donors, GroupBy::City).iter().map(|b| b.count).sum();
        assert_eq!(by_group, donors.len() - unknown);
        assert_eq!(by_city, donors.len());
    }

    #[test]
    fn test_group_by_display() {
        assert_eq!(GroupBy::City.to_string(), "city");
        assert_eq!(GroupBy::BloodGroup.to_string(), "blood group");
    }
}
