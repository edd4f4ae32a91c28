//! View coordinator.
//!
//! The coordinator is the single owner of the session state: the donor
//! collection (or the fact that it is still loading, or failed to load) and
//! the active filter. Every change to either re-runs [`derive_views`] and
//! replaces the published [`Snapshot`] as a whole, so the table, chart and
//! map always describe the same `(donors, filter)` pair.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, AggregationBucket, GroupBy};
use crate::donor::{BloodGroup, DonorRecord, RawDonor};
use crate::facets::FacetCatalog;
use crate::filter::{Facet, FilterState};
use crate::geo::{MapView, RegionTable};
use crate::normalize::normalize;
use crate::source::{self, DonorSource};

/// Outcome of the session's single donor fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// The fetch has not completed yet.
    Pending,
    /// The collection was loaded (possibly empty).
    Loaded(Vec<DonorRecord>),
    /// The fetch failed; distinct from an empty collection.
    Unavailable {
        /// Human-readable failure description.
        reason: String,
    },
}

/// Rows of the donor table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    /// Matching donors, in collection order.
    pub rows: Vec<DonorRecord>,
}

impl TableView {
    /// Caption shown above the table.
    #[must_use]
    pub fn caption(&self) -> String {
        format!("Showing {} donors matching your criteria", self.rows.len())
    }
}

/// Series of the distribution chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    /// Facet the buckets are keyed by.
    pub group_by: GroupBy,
    /// Buckets, count descending then key ascending.
    pub buckets: Vec<AggregationBucket>,
}

/// The three panels derived from one `(donors, filter)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedViews {
    /// Donor table.
    pub table: TableView,
    /// Blood group distribution.
    pub chart: ChartView,
    /// Map viewport and markers.
    pub map: MapView,
}

/// Derive all three panels from a collection and a filter.
///
/// Pure: the same inputs always produce the same views.
#[must_use]
pub fn derive_views(
    donors: &[DonorRecord],
    filter: &FilterState,
    regions: &RegionTable,
) -> DerivedViews {
    let subset = filter.apply(donors);
    DerivedViews {
        table: TableView {
            rows: subset.iter().map(|d| (*d).clone()).collect(),
        },
        chart: ChartView {
            group_by: GroupBy::BloodGroup,
            buckets: aggregate(subset.iter().copied(), GroupBy::BloodGroup),
        },
        map: regions.map_view(&subset, &filter.city),
    }
}

/// Published state of all three panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Views {
    /// Every panel shows its loading placeholder.
    Loading,
    /// Every panel shows the same error placeholder.
    Unavailable {
        /// Why the donors could not be loaded.
        reason: String,
    },
    /// Every panel shows derived content.
    Ready(DerivedViews),
}

/// What one panel should render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Panel<'a, T> {
    /// Donor data is still loading.
    Loading,
    /// Donor data could not be loaded.
    Unavailable(&'a str),
    /// Loaded, but nothing matches the filter.
    Empty,
    /// Content to render.
    Content(&'a T),
}

/// One consistent publication of the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    revision: u64,
    filter: FilterState,
    catalog: FacetCatalog,
    views: Views,
}

impl Snapshot {
    /// Publication counter; increases with every recomputation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Filter the views were derived under.
    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Selector options for the loaded collection.
    #[must_use]
    pub fn catalog(&self) -> &FacetCatalog {
        &self.catalog
    }

    /// The three panels.
    #[must_use]
    pub fn views(&self) -> &Views {
        &self.views
    }

    /// Whether derived content is available.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.views, Views::Ready(_))
    }

    /// What the table panel renders.
    #[must_use]
    pub fn table(&self) -> Panel<'_, TableView> {
        self.panel(|views| &views.table, |table| table.rows.is_empty())
    }

    /// What the chart panel renders.
    #[must_use]
    pub fn chart(&self) -> Panel<'_, ChartView> {
        self.panel(|views| &views.chart, |chart| chart.buckets.is_empty())
    }

    /// What the map panel renders; a loaded map is never empty, it always
    /// has a viewport.
    #[must_use]
    pub fn map(&self) -> Panel<'_, MapView> {
        self.panel(|views| &views.map, |_| false)
    }

    fn panel<'a, T>(
        &'a self,
        select: impl FnOnce(&'a DerivedViews) -> &'a T,
        is_empty: impl FnOnce(&T) -> bool,
    ) -> Panel<'a, T> {
        match &self.views {
            Views::Loading => Panel::Loading,
            Views::Unavailable { reason } => Panel::Unavailable(reason),
            Views::Ready(views) => {
                let content = select(views);
                if is_empty(content) {
                    Panel::Empty
                } else {
                    Panel::Content(content)
                }
            }
        }
    }
}

/// Owner of the session state and publisher of its views.
#[derive(Debug)]
pub struct ViewCoordinator {
    state: LoadState,
    filter: FilterState,
    regions: RegionTable,
    snapshot: Snapshot,
}

impl ViewCoordinator {
    /// Start a session in the pending state.
    #[must_use]
    pub fn new(regions: RegionTable) -> Self {
        let mut coordinator = Self {
            state: LoadState::Pending,
            filter: FilterState::all(),
            regions,
            snapshot: Snapshot {
                revision: 0,
                filter: FilterState::all(),
                catalog: FacetCatalog::empty(),
                views: Views::Loading,
            },
        };
        coordinator.republish();
        coordinator
    }

    /// Run the session's donor fetch and publish its outcome.
    pub async fn load(&mut self, source: &dyn DonorSource) -> &Snapshot {
        info!(source = %source.describe(), "Loading donors");
        let result = source.fetch().await;
        self.finish_load(result)
    }

    /// Publish the outcome of a fetch performed elsewhere.
    pub fn finish_load(&mut self, result: source::Result<Vec<RawDonor>>) -> &Snapshot {
        self.state = match result {
            Ok(payloads) => {
                let donors = normalize(&payloads);
                info!(donors = donors.len(), "Donors loaded");
                LoadState::Loaded(donors)
            }
            Err(err) => {
                warn!(error = %err, "Donor source unavailable");
                LoadState::Unavailable {
                    reason: err.to_string(),
                }
            }
        };
        self.republish()
    }

    /// Replace the whole filter.
    pub fn set_filter(&mut self, filter: FilterState) -> &Snapshot {
        self.filter = filter;
        self.republish()
    }

    /// Change the city selection.
    pub fn select_city(&mut self, city: Facet<String>) -> &Snapshot {
        self.filter.city = city;
        self.republish()
    }

    /// Change the blood group selection.
    pub fn select_blood_group(&mut self, blood_group: Facet<BloodGroup>) -> &Snapshot {
        self.filter.blood_group = blood_group;
        self.republish()
    }

    /// Go back to matching every donor.
    pub fn reset_filter(&mut self) -> &Snapshot {
        self.set_filter(FilterState::all())
    }

    /// The current publication.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The active filter.
    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// The load state.
    #[must_use]
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// The loaded collection, if any.
    #[must_use]
    pub fn donors(&self) -> Option<&[DonorRecord]> {
        match &self.state {
            LoadState::Loaded(donors) => Some(donors),
            _ => None,
        }
    }

    fn republish(&mut self) -> &Snapshot {
        let (catalog, views) = match &self.state {
            LoadState::Pending => (FacetCatalog::empty(), Views::Loading),
            LoadState::Unavailable { reason } => (
                FacetCatalog::empty(),
                Views::Unavailable {
                    reason: reason.clone(),
                },
            ),
            LoadState::Loaded(donors) => (
                FacetCatalog::from_donors(donors),
                Views::Ready(derive_views(donors, &self.filter, &self.regions)),
            ),
        };

        self.snapshot = Snapshot {
            revision: self.snapshot.revision + 1,
            filter: self.filter.clone(),
            catalog,
            views,
        };
        debug!(
            revision = self.snapshot.revision,
            filter = %self.filter,
            "Published views"
        );
        &self.snapshot
    }
}
