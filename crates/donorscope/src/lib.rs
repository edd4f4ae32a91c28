//! `donorscope` - Donor discovery with synchronized table, chart and map views
//!
//! A donor list is fetched once per session, normalized into uniform records,
//! and narrowed by a two-facet filter (city, blood group). The table, the
//! blood group distribution and the map viewport are all derived from the
//! same `(donors, filter)` pair by [`derive_views`] and published together by
//! the [`ViewCoordinator`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod donor;
pub mod error;
pub mod facets;
pub mod filter;
pub mod geo;
pub mod logging;
pub mod normalize;
pub mod render;
pub mod source;

pub use aggregate::{aggregate, AggregationBucket, GroupBy};
pub use config::Config;
pub use coordinator::{derive_views, DerivedViews, LoadState, Snapshot, ViewCoordinator, Views};
pub use donor::{BloodGroup, Coordinates, DonationDate, DonorRecord, RawDonor};
pub use error::{Error, Result};
pub use facets::FacetCatalog;
pub use filter::{Facet, FilterState};
pub use geo::{MapView, Marker, RegionTable, Viewport};
pub use logging::init_logging;
pub use normalize::normalize;
pub use source::{DonorSource, FileSource, HttpSource, MemorySource, SourceError};
